//! Error types for warden-policy

use thiserror::Error;

/// Policy error type
#[derive(Debug, Error)]
pub enum Error {
    /// Policy document could not be parsed
    #[error("invalid policy document: {0}")]
    InvalidPolicy(String),

    /// Workspace root rejected
    #[error("invalid workspace root: {0}")]
    InvalidWorkspace(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
