//! Error types shared by the decoder, geometry and scan pipeline

use thiserror::Error;

use crate::mrz::ValidationCheck;

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, MrzError>;

#[derive(Error, Debug)]
pub enum MrzError {
    #[error("character {0:?} is not part of the MRZ character set")]
    InvalidCharacter(char),

    #[error("field range {begin}..{end} exceeds line {line} (length {len})")]
    OutOfRange {
        line: usize,
        begin: usize,
        end: usize,
        len: usize,
    },

    #[error("malformed MRZ: {0}")]
    MalformedMrz(String),

    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),

    #[error("no MRZ block detected after {attempts} rotation attempts")]
    NoMrzDetected { attempts: usize },

    #[error("text recognition failed: {0}")]
    OcrFailure(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("MRZ checksum validation failed at {0}")]
    InvalidChecksum(ValidationCheck),

    #[error("scan cancelled")]
    Cancelled,

    #[error("image worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl MrzError {
    /// Wrap a failure reported by the OCR collaborator
    pub fn ocr(err: anyhow::Error) -> Self {
        MrzError::OcrFailure(err.into())
    }

    /// Whether the block-finding stage may move on to the next rotation after this error
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            MrzError::NoMrzDetected { .. }
                | MrzError::OcrFailure(_)
                | MrzError::DegenerateGeometry(_)
        )
    }
}
