//! Error types for warden-audit

use thiserror::Error;

/// Audit error type
#[derive(Debug, Error)]
pub enum Error {
    /// The log file could not be opened, written, rotated or read
    #[error("audit I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A record could not be serialized
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
