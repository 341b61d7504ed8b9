//! # Facade Errors
//!
//! The three failure classes callers distinguish, plus storage failures.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::ingest::IngestError;
use crate::query::QueryError;
use crate::repository::RepositoryError;

/// Result type for facade operations
pub type InsightResult<T> = Result<T, InsightError>;

/// Facade errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InsightError {
    /// Malformed query or archive, bad or duplicate id
    #[error("{0}")]
    Validation(String),

    /// Query matched more rows than allowed
    #[error("{0}")]
    ResultTooLarge(String),

    /// Dataset id does not exist
    #[error("{0}")]
    NotFound(String),

    /// Repository failure
    #[error("Storage error: {0}")]
    Storage(String),
}

impl InsightError {
    pub fn validation(message: impl Into<String>) -> Self {
        InsightError::Validation(message.into())
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            InsightError::Validation(_) => "VALIDATION_ERROR",
            InsightError::ResultTooLarge(_) => "RESULT_TOO_LARGE",
            InsightError::NotFound(_) => "NOT_FOUND",
            InsightError::Storage(_) => "STORAGE_ERROR",
        }
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            InsightError::Validation(_) => StatusCode::BAD_REQUEST,
            InsightError::ResultTooLarge(_) => StatusCode::BAD_REQUEST,
            InsightError::NotFound(_) => StatusCode::NOT_FOUND,
            InsightError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<QueryError> for InsightError {
    fn from(err: QueryError) -> Self {
        if err.is_validation() {
            InsightError::Validation(err.to_string())
        } else {
            InsightError::ResultTooLarge(err.to_string())
        }
    }
}

impl From<IngestError> for InsightError {
    fn from(err: IngestError) -> Self {
        InsightError::Validation(err.to_string())
    }
}

impl From<RepositoryError> for InsightError {
    fn from(err: RepositoryError) -> Self {
        InsightError::Storage(err.to_string())
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
}

impl From<InsightError> for ErrorResponse {
    fn from(err: InsightError) -> Self {
        Self {
            code: err.code(),
            error: err.to_string(),
        }
    }
}

impl IntoResponse for InsightError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(ErrorResponse::from(self));
        (status, body).into_response()
    }
}
