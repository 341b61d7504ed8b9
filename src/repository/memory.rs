//! # In-Memory Repository

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::model::{Dataset, DatasetSummary};

use super::backend::DatasetRepository;
use super::errors::{RepositoryError, RepositoryResult};

/// Map of dataset id to shared, immutable dataset
#[derive(Debug, Default)]
pub struct MemoryRepository {
    datasets: RwLock<HashMap<String, Arc<Dataset>>>,
    closed: AtomicBool,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a repository already holding these datasets
    pub fn with_datasets(datasets: impl IntoIterator<Item = Dataset>) -> Self {
        let map = datasets
            .into_iter()
            .map(|d| (d.id.clone(), Arc::new(d)))
            .collect();
        Self {
            datasets: RwLock::new(map),
            closed: AtomicBool::new(false),
        }
    }

    fn ensure_open(&self) -> RepositoryResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(RepositoryError::Closed);
        }
        Ok(())
    }

    fn read(&self) -> RepositoryResult<RwLockReadGuard<'_, HashMap<String, Arc<Dataset>>>> {
        self.ensure_open()?;
        self.datasets.read().map_err(|_| RepositoryError::Poisoned)
    }

    fn write(&self) -> RepositoryResult<RwLockWriteGuard<'_, HashMap<String, Arc<Dataset>>>> {
        self.ensure_open()?;
        self.datasets.write().map_err(|_| RepositoryError::Poisoned)
    }
}

impl DatasetRepository for MemoryRepository {
    fn put(&self, dataset: Dataset) -> RepositoryResult<()> {
        self.write()?.insert(dataset.id.clone(), Arc::new(dataset));
        Ok(())
    }

    fn get(&self, id: &str) -> RepositoryResult<Option<Arc<Dataset>>> {
        Ok(self.read()?.get(id).cloned())
    }

    fn list(&self) -> RepositoryResult<Vec<DatasetSummary>> {
        let mut summaries: Vec<DatasetSummary> =
            self.read()?.values().map(|d| d.summary()).collect();
        summaries.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(summaries)
    }

    fn delete(&self, id: &str) -> RepositoryResult<bool> {
        Ok(self.write()?.remove(id).is_some())
    }

    fn exists(&self, id: &str) -> RepositoryResult<bool> {
        Ok(self.read()?.contains_key(id))
    }

    fn close(&self) -> RepositoryResult<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}
