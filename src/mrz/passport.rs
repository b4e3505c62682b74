//! Decoded passport data

use serde::{Deserialize, Serialize};

/// Identity data read from a TD3 machine readable zone.
///
/// Dates are left as the raw `YYMMDD` strings; century resolution is up to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassportInformation {
    pub document_number: String,
    pub document_code: String,
    pub first_name: String,
    pub last_name: String,
    pub country: String,
    pub nationality: String,
    pub sex: String,
    pub date_of_birth: String,
    pub expiration_date: String,
}
