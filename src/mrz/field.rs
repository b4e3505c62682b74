//! Field layout of the TD3 (passport) MRZ and substring extraction

use crate::error::{MrzError, Result};
use crate::mrz::record::MrzRecord;

/// Logical fields found in machine readable zones
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MrzField {
    Doc,
    Country,
    DocumentNumber,
    Hash1,
    Hash2,
    Hash3,
    Hash4,
    FinalHash,
    OptionalData,
    /// Used by TD1/TD2 layouts, absent from TD3
    OptionalData1,
    /// Used by TD1/TD2 layouts, absent from TD3
    OptionalData2,
    BirthDate,
    Sex,
    ExpiryDate,
    Nationality,
    SurnameGivenName,
}

/// Half-open character range `begin..end` on one MRZ line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRange {
    pub line: usize,
    pub begin: usize,
    pub end: usize,
}

impl FieldRange {
    const fn new(line: usize, begin: usize, end: usize) -> Self {
        Self { line, begin, end }
    }
}

/// TD3 layout: two lines of 44 characters
pub const TD3_LAYOUT: &[(MrzField, FieldRange)] = &[
    (MrzField::Doc, FieldRange::new(0, 0, 2)),
    (MrzField::Country, FieldRange::new(0, 2, 5)),
    (MrzField::SurnameGivenName, FieldRange::new(0, 5, 44)),
    (MrzField::DocumentNumber, FieldRange::new(1, 0, 9)),
    (MrzField::Hash1, FieldRange::new(1, 9, 10)),
    (MrzField::Nationality, FieldRange::new(1, 10, 13)),
    (MrzField::BirthDate, FieldRange::new(1, 13, 19)),
    (MrzField::Hash2, FieldRange::new(1, 19, 20)),
    (MrzField::Sex, FieldRange::new(1, 20, 21)),
    (MrzField::ExpiryDate, FieldRange::new(1, 21, 27)),
    (MrzField::Hash3, FieldRange::new(1, 27, 28)),
    (MrzField::OptionalData, FieldRange::new(1, 28, 42)),
    (MrzField::Hash4, FieldRange::new(1, 42, 43)),
    (MrzField::FinalHash, FieldRange::new(1, 43, 44)),
];

/// Fields concatenated, in order, for the composite check digit
pub const TD3_COMPOSITE_FIELDS: [MrzField; 8] = [
    MrzField::DocumentNumber,
    MrzField::Hash1,
    MrzField::BirthDate,
    MrzField::Hash2,
    MrzField::ExpiryDate,
    MrzField::Hash3,
    MrzField::OptionalData,
    MrzField::Hash4,
];

/// Look up where a field lives in the TD3 layout
pub fn td3_range(field: MrzField) -> Option<FieldRange> {
    TD3_LAYOUT
        .iter()
        .find(|(f, _)| *f == field)
        .map(|(_, range)| *range)
}

/// Extract a field's raw text from a record.
///
/// Fields missing from the layout yield an empty string; a line too short for
/// the range is an [`MrzError::OutOfRange`].
pub fn extract(record: &MrzRecord, field: MrzField) -> Result<&str> {
    let Some(range) = td3_range(field) else {
        return Ok("");
    };

    let line = record.line(range.line)?;
    // OCR output is not guaranteed to be ASCII; `get` also rejects split characters
    line.get(range.begin..range.end)
        .ok_or(MrzError::OutOfRange {
            line: range.line,
            begin: range.begin,
            end: range.end,
            len: line.len(),
        })
}
