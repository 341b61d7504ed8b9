//! Ingestion error types

use thiserror::Error;

/// Result type for ingestion operations
pub type IngestResult<T> = Result<T, IngestError>;

/// Ingestion errors
///
/// Every variant aborts the whole ingestion; nothing is persisted.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Content is not valid base64
    #[error("Invalid base64 input")]
    InvalidBase64,

    /// Content is not a readable zip archive
    #[error("Invalid zip archive: {0}")]
    InvalidArchive(String),

    /// A folder or file the dataset kind requires is absent
    #[error("Archive is missing the required entry: {0}")]
    MissingEntry(String),

    /// An archive entry could not be decoded
    #[error("Error processing file {file}: {reason}")]
    FileParse { file: String, reason: String },

    /// Address lookup failed
    #[error("Geolocation failed for '{address}': {reason}")]
    Geocode { address: String, reason: String },

    /// Geocoder endpoint is not a usable base URL
    #[error("Invalid geocoder URL: {0}")]
    GeocoderUrl(String),

    /// Archive held no valid records
    #[error("Dataset contains no valid records")]
    NoValidRecords,

    /// A parsing task panicked
    #[error("Ingestion task failed: {0}")]
    Task(String),
}

impl IngestError {
    pub fn file_parse(file: impl Into<String>, reason: impl ToString) -> Self {
        IngestError::FileParse {
            file: file.into(),
            reason: reason.to_string(),
        }
    }

    pub fn geocode(address: impl Into<String>, reason: impl ToString) -> Self {
        IngestError::Geocode {
            address: address.into(),
            reason: reason.to_string(),
        }
    }
}
