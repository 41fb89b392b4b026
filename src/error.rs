//! Error types for voxtriage

use thiserror::Error;

/// Errors surfaced by the loader, the extractor and configuration handling.
///
/// Numeric corner cases inside the extractor (silent frames, missing voicing,
/// non-finite intermediates) are never errors; they are substituted or
/// reported as undefined descriptors instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Resampling error: {0}")]
    Resample(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for voxtriage operations
pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Config(err.to_string())
    }
}
