//! # Repository Trait

use std::sync::Arc;

use crate::model::{Dataset, DatasetSummary};

use super::errors::RepositoryResult;

/// Keyed store of whole datasets.
///
/// Readers see either the previous or the fully committed version of a
/// dataset, never a mix.
pub trait DatasetRepository: Send + Sync + std::fmt::Debug + 'static {
    /// Stores a dataset, replacing any previous version with the same id
    fn put(&self, dataset: Dataset) -> RepositoryResult<()>;

    /// Snapshot of one dataset
    fn get(&self, id: &str) -> RepositoryResult<Option<Arc<Dataset>>>;

    /// Summaries of every dataset, sorted by id
    fn list(&self) -> RepositoryResult<Vec<DatasetSummary>>;

    /// Removes a dataset; returns false if it did not exist
    fn delete(&self, id: &str) -> RepositoryResult<bool>;

    /// Check if a dataset exists
    fn exists(&self, id: &str) -> RepositoryResult<bool>;

    /// Releases the store; later operations fail with `Closed`
    fn close(&self) -> RepositoryResult<()>;
}
