//! Machine Readable Zone decoding
//!
//! Turns raw two-line OCR text into [`PassportInformation`] and verifies it
//! with the ICAO 9303 check digits. Only the TD3 (passport) layout is supported.

pub mod checksum;
pub mod field;
pub mod parser;
pub mod passport;
pub mod record;

pub use checksum::{char_value, validate_checksum, weighted_sum};
pub use field::{extract, FieldRange, MrzField};
pub use parser::{decode, is_valid, validate, MrzParser, ValidationCheck, ValidationReport};
pub use passport::PassportInformation;
pub use record::MrzRecord;
