//! Query error types

use thiserror::Error;

/// Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;

/// Query errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    /// Document does not match the query grammar
    #[error("Invalid query: {0}")]
    Invalid(String),

    /// Referenced dataset has not been added
    #[error("Dataset not found: {0}")]
    UnknownDataset(String),

    /// Keys from more than one dataset appear in the query
    #[error("Query references more than one dataset: {}", .0.join(", "))]
    MultipleDatasets(Vec<String>),

    /// Result exceeds the row cap
    #[error("Query produced {0} rows, more than the maximum of {1}")]
    ResultTooLarge(usize, usize),
}

impl QueryError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        QueryError::Invalid(reason.into())
    }

    /// Returns true for grammar and reference failures
    pub fn is_validation(&self) -> bool {
        !matches!(self, QueryError::ResultTooLarge(_, _))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_too_large_is_not_validation() {
        assert!(!QueryError::ResultTooLarge(5001, 5000).is_validation());
        assert!(QueryError::invalid("x").is_validation());
        assert!(QueryError::UnknownDataset("x".into()).is_validation());
    }

    #[test]
    fn test_display() {
        let err = QueryError::MultipleDatasets(vec!["rooms".into(), "sections".into()]);
        assert_eq!(
            err.to_string(),
            "Query references more than one dataset: rooms, sections"
        );
    }
}
