//! MRZ decoding and checksum validation
//!
//! Check order and semantics follow ICAO Doc 9303 part 4 for TD3 documents:
//! <https://www.icao.int/publications/Documents/9303_p4_cons_en.pdf>

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use tracing::debug;

use crate::error::Result;
use crate::mrz::checksum::{self, FILLER};
use crate::mrz::field::{self, MrzField, TD3_COMPOSITE_FIELDS};
use crate::mrz::passport::PassportInformation;
use crate::mrz::record::MrzRecord;

lazy_static! {
    static ref BIRTH_DATE_RE: Regex = Regex::new(r"^[0-9]{6}$").unwrap();
    static ref CHARSET_RE: Regex = Regex::new(r"^[A-Z0-9<]{30,44}$").unwrap();
}

/// Separator between the family name and the given names
const NAME_SEPARATOR: &str = "<<";

/// Individual checks run by [`validate`], in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationCheck {
    BirthDateFormat,
    BirthDateChecksum,
    DocumentNumberChecksum,
    ExpiryDateChecksum,
    Charset,
    OptionalDataChecksum,
    FinalChecksum,
}

impl fmt::Display for ValidationCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValidationCheck::BirthDateFormat => "birth date format",
            ValidationCheck::BirthDateChecksum => "birth date check digit",
            ValidationCheck::DocumentNumberChecksum => "document number check digit",
            ValidationCheck::ExpiryDateChecksum => "expiry date check digit",
            ValidationCheck::Charset => "line character set",
            ValidationCheck::OptionalDataChecksum => "optional data check digit",
            ValidationCheck::FinalChecksum => "composite check digit",
        };
        f.write_str(name)
    }
}

/// Outcome of validating a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// First check that failed, if any
    pub failed: Option<ValidationCheck>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.failed.is_none()
    }
}

/// A parsed MRZ: the raw record and the passport data decoded from it
#[derive(Debug, Clone)]
pub struct MrzParser {
    record: MrzRecord,
    passport: PassportInformation,
}

impl MrzParser {
    /// Parse raw OCR text
    pub fn parse(text: &str) -> Result<Self> {
        let record = MrzRecord::parse(text)?;
        let passport = decode_record(&record)?;
        Ok(Self { record, passport })
    }

    pub fn record(&self) -> &MrzRecord {
        &self.record
    }

    pub fn passport(&self) -> &PassportInformation {
        &self.passport
    }

    pub fn into_passport(self) -> PassportInformation {
        self.passport
    }

    pub fn validate(&self) -> ValidationReport {
        validate(&self.record)
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_valid()
    }
}

/// Decode raw OCR text into passport data without validating check digits
pub fn decode(text: &str) -> Result<PassportInformation> {
    MrzParser::parse(text).map(MrzParser::into_passport)
}

/// Decode the fields of an already built record
pub fn decode_record(record: &MrzRecord) -> Result<PassportInformation> {
    let text = |f: MrzField| field::extract(record, f).map(str::to_string);

    let names = field::extract(record, MrzField::SurnameGivenName)?;
    let (last_name, first_name) = parse_names(names);

    Ok(PassportInformation {
        document_number: text(MrzField::DocumentNumber)?,
        document_code: sanitize(field::extract(record, MrzField::Doc)?),
        first_name,
        last_name,
        country: text(MrzField::Country)?,
        nationality: text(MrzField::Nationality)?,
        sex: text(MrzField::Sex)?,
        date_of_birth: text(MrzField::BirthDate)?,
        expiration_date: text(MrzField::ExpiryDate)?,
    })
}

/// Run every TD3 check, stopping at the first failure
pub fn validate(record: &MrzRecord) -> ValidationReport {
    let failed = first_failed_check(record);
    if let Some(check) = failed {
        debug!("MRZ validation failed: {}", check);
    }
    ValidationReport { failed }
}

/// Boolean view of [`validate`]
pub fn is_valid(record: &MrzRecord) -> bool {
    validate(record).is_valid()
}

fn first_failed_check(record: &MrzRecord) -> Option<ValidationCheck> {
    let raw = |f: MrzField| field::extract(record, f).unwrap_or("");

    if !BIRTH_DATE_RE.is_match(raw(MrzField::BirthDate)) {
        return Some(ValidationCheck::BirthDateFormat);
    }

    let field_checks = [
        (MrzField::BirthDate, MrzField::Hash2, ValidationCheck::BirthDateChecksum),
        (MrzField::DocumentNumber, MrzField::Hash1, ValidationCheck::DocumentNumberChecksum),
        (MrzField::ExpiryDate, MrzField::Hash3, ValidationCheck::ExpiryDateChecksum),
    ];
    for (data, hash, check) in field_checks {
        if !has_valid_checksum(record, raw(data), hash) {
            return Some(check);
        }
    }

    if !CHARSET_RE.is_match(record.top()) || !CHARSET_RE.is_match(record.bottom()) {
        return Some(ValidationCheck::Charset);
    }

    // Formats without optional data have no HASH4 and fail here
    if !has_valid_checksum(record, raw(MrzField::OptionalData), MrzField::Hash4) {
        return Some(ValidationCheck::OptionalDataChecksum);
    }

    let composite: String = TD3_COMPOSITE_FIELDS.iter().map(|f| raw(*f)).collect();
    if !has_valid_checksum(record, &composite, MrzField::FinalHash) {
        return Some(ValidationCheck::FinalChecksum);
    }

    None
}

fn has_valid_checksum(record: &MrzRecord, data: &str, hash: MrzField) -> bool {
    let Ok(hash) = field::extract(record, hash) else {
        return false;
    };
    let mut chars = hash.chars();
    let (Some(digit), None) = (chars.next(), chars.next()) else {
        return false;
    };
    let Some(expected) = digit.to_digit(10) else {
        return false;
    };
    checksum::validate_checksum(data, expected).unwrap_or(false)
}

/// Split `FAMILY<<GIVEN<NAMES<<<` into (last name, first names)
fn parse_names(raw: &str) -> (String, String) {
    match raw.split_once(NAME_SEPARATOR) {
        Some((family, given)) => (humanize(family), humanize(given)),
        None => (humanize(raw), String::new()),
    }
}

/// `ANNA<MARIA<<<` -> `Anna Maria`
fn humanize(raw: &str) -> String {
    raw.replace(FILLER, " ")
        .to_lowercase()
        .split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Drop fillers and surrounding whitespace
fn sanitize(raw: &str) -> String {
    raw.replace(FILLER, "").trim().to_string()
}
