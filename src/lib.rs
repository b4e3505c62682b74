//! mrz-scanner - Passport MRZ reading on top of any OCR engine
//!
//! Locates the machine readable zone of a TD3 passport in a photo, crops it,
//! decodes the identity fields and verifies the ICAO 9303 check digits.
//! Text recognition is delegated to a [`vision::TextRecognizer`]
//! implementation supplied by the host application.

pub mod config;
pub mod error;
pub mod geometry;
pub mod mrz;
pub mod scanner;
pub mod vision;

pub use config::ScannerConfig;
pub use error::{MrzError, Result};
pub use geometry::{Point, Rect, Size};
pub use mrz::{decode, MrzParser, PassportInformation, ValidationCheck, ValidationReport};
pub use scanner::{MrzRegion, Rotation, Scanner};
pub use vision::{ImageTransform, MrzTextBlockInfo, RasterTransform, TextBlock, TextRecognizer};
