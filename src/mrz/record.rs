//! Two-line MRZ record built from raw OCR text

use crate::error::{MrzError, Result};
use crate::mrz::checksum::FILLER;

/// Characters per line in the TD3 format
pub const TD3_LINE_LENGTH: usize = 44;

/// The top and bottom lines of a machine readable zone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MrzRecord {
    top: String,
    bottom: String,
}

impl MrzRecord {
    /// Build a record from multi-line OCR text.
    ///
    /// Spaces are dropped (OCR engines like to split the filler runs), blank
    /// lines are skipped and the first two remaining lines are used. The top
    /// line is padded with `<` to the full TD3 width because OCR routinely
    /// loses the trailing filler of the name field.
    pub fn parse(text: &str) -> Result<Self> {
        let cleaned: String = text
            .chars()
            .filter(|c| !matches!(c, ' ' | '\t' | '\r'))
            .collect();

        let mut lines = cleaned.split('\n').filter(|line| !line.is_empty());
        let (Some(top), Some(bottom)) = (lines.next(), lines.next()) else {
            return Err(MrzError::MalformedMrz(format!(
                "expected two non-empty lines, got {:?}",
                cleaned
            )));
        };

        let mut top = top.to_string();
        let missing = TD3_LINE_LENGTH.saturating_sub(top.chars().count());
        top.extend(std::iter::repeat(FILLER).take(missing));

        Ok(Self {
            top,
            bottom: bottom.to_string(),
        })
    }

    pub fn top(&self) -> &str {
        &self.top
    }

    pub fn bottom(&self) -> &str {
        &self.bottom
    }

    /// Line by index (0 = top, 1 = bottom)
    pub fn line(&self, index: usize) -> Result<&str> {
        match index {
            0 => Ok(&self.top),
            1 => Ok(&self.bottom),
            _ => Err(MrzError::MalformedMrz(format!("no line {} in a two-line record", index))),
        }
    }
}
