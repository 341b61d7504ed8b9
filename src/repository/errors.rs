//! Repository error types

use thiserror::Error;

/// Result type for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Repository errors
#[derive(Debug, Clone, Error)]
pub enum RepositoryError {
    /// Operation issued after `close`
    #[error("Repository is closed")]
    Closed,

    #[error("I/O error: {0}")]
    Io(String),

    /// A persisted blob could not be decoded
    #[error("Corrupt dataset blob {file}: {reason}")]
    Corrupt { file: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A lock holder panicked
    #[error("Repository lock poisoned")]
    Poisoned,
}

impl From<std::io::Error> for RepositoryError {
    fn from(err: std::io::Error) -> Self {
        RepositoryError::Io(err.to_string())
    }
}
