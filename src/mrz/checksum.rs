//! ICAO 9303 check digit arithmetic (part 3, section 4.9)

use crate::error::{MrzError, Result};

/// Filler character used for padding inside MRZ lines
pub const FILLER: char = '<';

/// Cyclic weights applied by position
const WEIGHTS: [u32; 3] = [7, 3, 1];

/// Numeric value of a single MRZ character
pub fn char_value(c: char) -> Result<u32> {
    match c {
        FILLER => Ok(0),
        '0'..='9' => Ok(c as u32 - '0' as u32),
        'A'..='Z' => Ok(c as u32 - 'A' as u32 + 10),
        other => Err(MrzError::InvalidCharacter(other)),
    }
}

/// Weighted sum of `data` using the repeating 7-3-1 weights
///
/// Saturates at `u32::MAX`; exact for anything the length of an MRZ line.
pub fn weighted_sum(data: &str) -> Result<u32> {
    weighted_fold(data, |sum, term| sum.saturating_add(term))
}

/// Check `data` against an expected check digit
pub fn validate_checksum(data: &str, expected: u32) -> Result<bool> {
    Ok(weighted_fold(data, |sum, term| (sum + term) % 10)? == expected)
}

fn weighted_fold(data: &str, step: impl Fn(u32, u32) -> u32) -> Result<u32> {
    data.chars()
        .zip(WEIGHTS.iter().cycle())
        .try_fold(0u32, |sum, (c, weight)| Ok(step(sum, char_value(c)? * weight)))
}
