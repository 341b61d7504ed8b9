//! Insight facade
//!
//! Orchestrates ingestion, removal, listing and queries over an injected
//! repository and geocoder.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::ingest::{self, Archive, Geocoder, IngestResult};
use crate::model::{is_valid_dataset_id, Dataset, DatasetKind, DatasetSummary, Record};
use crate::query::{QueryExecutor, QueryValidator};
use crate::repository::{DatasetRepository, RepositoryResult};

use super::errors::{InsightError, InsightResult};
use super::writers::WriterLocks;

/// Entry point for every dataset and query operation
#[derive(Debug)]
pub struct InsightFacade<R, G> {
    repository: Arc<R>,
    geocoder: G,
    executor: QueryExecutor,
    writers: WriterLocks,
}

impl<R, G> InsightFacade<R, G>
where
    R: DatasetRepository,
    G: Geocoder,
{
    pub fn new(repository: R, geocoder: G) -> Self {
        Self {
            repository: Arc::new(repository),
            geocoder,
            executor: QueryExecutor::new(),
            writers: WriterLocks::new(),
        }
    }

    /// Replaces the query executor (row cap)
    pub fn with_executor(mut self, executor: QueryExecutor) -> Self {
        self.executor = executor;
        self
    }

    pub fn repository(&self) -> &R {
        self.repository.as_ref()
    }

    /// Adds a dataset from base64-encoded zip content.
    ///
    /// Returns the ids of every dataset present after the commit.
    pub async fn add_dataset(
        &self,
        id: &str,
        content: &str,
        kind: DatasetKind,
    ) -> InsightResult<Vec<String>> {
        self.ingest(id, kind, || Archive::from_base64(content)).await
    }

    /// Adds a dataset from raw zip bytes
    pub async fn add_dataset_archive(
        &self,
        id: &str,
        bytes: &[u8],
        kind: DatasetKind,
    ) -> InsightResult<Vec<String>> {
        self.ingest(id, kind, || Archive::from_bytes(bytes)).await
    }

    async fn ingest<F>(&self, id: &str, kind: DatasetKind, decode: F) -> InsightResult<Vec<String>>
    where
        F: FnOnce() -> IngestResult<Archive>,
    {
        check_id(id)?;
        let _writer = self.writers.acquire(id).await;

        if self.repository.exists(id)? {
            return Err(InsightError::validation(format!(
                "Dataset ID already exists: {}",
                id
            )));
        }

        let archive = decode()?;
        let records = match ingest::normalize(id, kind, &archive, &self.geocoder).await {
            Ok(records) => records,
            Err(err) => {
                warn!(dataset = id, %kind, error = %err, "ingestion rejected");
                return Err(err.into());
            }
        };

        let dataset = Dataset::new(id, kind, records);
        let rows = dataset.num_rows;
        self.commit(move |repository| repository.put(dataset)).await?;
        info!(dataset = id, %kind, rows, entries = archive.len(), "dataset added");

        Ok(self
            .repository
            .list()?
            .into_iter()
            .map(|summary| summary.id)
            .collect())
    }

    /// Removes a dataset and returns its id
    pub async fn remove_dataset(&self, id: &str) -> InsightResult<String> {
        check_id(id)?;
        let _writer = self.writers.acquire(id).await;

        let owned = id.to_string();
        if !self.commit(move |repository| repository.delete(&owned)).await? {
            return Err(InsightError::NotFound(format!("Dataset not found: {}", id)));
        }
        info!(dataset = id, "dataset removed");
        Ok(id.to_string())
    }

    /// Every dataset, sorted by id
    pub async fn list_datasets(&self) -> InsightResult<Vec<DatasetSummary>> {
        Ok(self.repository.list()?)
    }

    /// Validates and runs one query document
    pub async fn perform_query(&self, query: &Value) -> InsightResult<Vec<Record>> {
        let catalog: BTreeSet<String> = self
            .repository
            .list()?
            .into_iter()
            .map(|summary| summary.id)
            .collect();
        let query = QueryValidator::new(&catalog).validate(query)?;

        let dataset = self.repository.get(&query.dataset_id)?.ok_or_else(|| {
            InsightError::validation(format!("Dataset not found: {}", query.dataset_id))
        })?;

        let rows = self.executor.execute(&query, &dataset.data)?;
        debug!(dataset = %dataset.id, rows = rows.len(), "query answered");
        Ok(rows)
    }

    /// Runs a repository write on the blocking pool
    async fn commit<T, F>(&self, write: F) -> InsightResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&R) -> RepositoryResult<T> + Send + 'static,
    {
        let repository = Arc::clone(&self.repository);
        let outcome = tokio::task::spawn_blocking(move || write(repository.as_ref()))
            .await
            .map_err(|e| InsightError::Storage(format!("repository write failed: {}", e)))?;
        Ok(outcome?)
    }

    /// Closes the repository
    pub fn close(&self) -> InsightResult<()> {
        Ok(self.repository.close()?)
    }
}

fn check_id(id: &str) -> InsightResult<()> {
    if !is_valid_dataset_id(id) {
        return Err(InsightError::validation(format!(
            "Invalid dataset id: '{}'",
            id
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde_json::json;

    use super::*;
    use crate::ingest::{GeoLocation, IngestError};
    use std::sync::Mutex;
    use std::thread::{self, ThreadId};

    use crate::model::Scalar;
    use crate::repository::MemoryRepository;

    /// Records the thread every write runs on
    #[derive(Debug, Default)]
    struct ThreadTrackingRepository {
        inner: MemoryRepository,
        write_threads: Mutex<Vec<ThreadId>>,
    }

    impl ThreadTrackingRepository {
        fn track(&self) {
            self.write_threads.lock().unwrap().push(thread::current().id());
        }
    }

    impl DatasetRepository for ThreadTrackingRepository {
        fn put(&self, dataset: Dataset) -> RepositoryResult<()> {
            self.track();
            self.inner.put(dataset)
        }

        fn get(&self, id: &str) -> RepositoryResult<Option<Arc<Dataset>>> {
            self.inner.get(id)
        }

        fn list(&self) -> RepositoryResult<Vec<DatasetSummary>> {
            self.inner.list()
        }

        fn delete(&self, id: &str) -> RepositoryResult<bool> {
            self.track();
            self.inner.delete(id)
        }

        fn exists(&self, id: &str) -> RepositoryResult<bool> {
            self.inner.exists(id)
        }

        fn close(&self) -> RepositoryResult<()> {
            self.inner.close()
        }
    }

    #[derive(Debug)]
    struct FixedGeocoder(HashMap<String, GeoLocation>);

    impl Geocoder for FixedGeocoder {
        async fn resolve(&self, address: &str) -> IngestResult<GeoLocation> {
            self.0
                .get(address)
                .copied()
                .ok_or_else(|| IngestError::geocode(address, "unknown address"))
        }
    }

    fn facade() -> InsightFacade<MemoryRepository, FixedGeocoder> {
        InsightFacade::new(MemoryRepository::new(), FixedGeocoder(HashMap::new()))
    }

    fn sections_zip() -> Vec<u8> {
        crate::ingest::fixtures::zip_of(&[
            ("courses/", ""),
            (
                "courses/CPSC310",
                r#"{"result":[
                    {"id":1,"Course":"310","Title":"sw eng","Professor":"a","Subject":"cpsc",
                     "Year":"2016","Avg":78.2,"Pass":90,"Fail":2,"Audit":0,"Section":"101"},
                    {"id":2,"Course":"310","Title":"sw eng","Professor":"b","Subject":"cpsc",
                     "Year":"2016","Avg":81.8,"Pass":88,"Fail":1,"Audit":0,"Section":"102"}
                ]}"#,
            ),
        ])
    }

    #[tokio::test]
    async fn test_add_list_remove() {
        let facade = facade();
        let ids = facade
            .add_dataset("cs", &STANDARD.encode(sections_zip()), DatasetKind::Sections)
            .await
            .unwrap();
        assert_eq!(ids, vec!["cs"]);

        let listed = facade.list_datasets().await.unwrap();
        assert_eq!(listed[0].num_rows, 2);
        assert_eq!(listed[0].kind, DatasetKind::Sections);

        assert_eq!(facade.remove_dataset("cs").await.unwrap(), "cs");
        assert!(facade.list_datasets().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_id_rules() {
        let facade = facade();
        let zip = sections_zip();
        for bad in ["", "  ", "a_b"] {
            assert!(matches!(
                facade.add_dataset_archive(bad, &zip, DatasetKind::Sections).await,
                Err(InsightError::Validation(_))
            ));
        }

        facade
            .add_dataset_archive("cs", &zip, DatasetKind::Sections)
            .await
            .unwrap();
        assert!(matches!(
            facade.add_dataset_archive("cs", &zip, DatasetKind::Sections).await,
            Err(InsightError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_remove_errors() {
        let facade = facade();
        assert!(matches!(
            facade.remove_dataset("missing").await,
            Err(InsightError::NotFound(_))
        ));
        assert!(matches!(
            facade.remove_dataset("a_b").await,
            Err(InsightError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_failed_ingestion_persists_nothing() {
        let facade = facade();
        assert!(facade
            .add_dataset("cs", "!!", DatasetKind::Sections)
            .await
            .is_err());
        assert!(facade
            .add_dataset_archive("cs", &sections_zip(), DatasetKind::Rooms)
            .await
            .is_err());
        assert!(facade.list_datasets().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_query_round_trip() {
        let facade = facade();
        facade
            .add_dataset_archive("cs", &sections_zip(), DatasetKind::Sections)
            .await
            .unwrap();

        let rows = facade
            .perform_query(&json!({
                "WHERE": {"GT": {"cs_avg": 80}},
                "OPTIONS": {"COLUMNS": ["cs_instructor", "cs_avg"]}
            }))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("cs_instructor"), Some(&Scalar::text("b")));

        let err = facade
            .perform_query(&json!({
                "WHERE": {},
                "OPTIONS": {"COLUMNS": ["other_avg"]}
            }))
            .await
            .unwrap_err();
        assert!(matches!(err, InsightError::Validation(_)));
    }

    #[tokio::test]
    async fn test_result_too_large_is_distinct() {
        let facade = facade().with_executor(QueryExecutor::new().with_max_rows(1));
        facade
            .add_dataset_archive("cs", &sections_zip(), DatasetKind::Sections)
            .await
            .unwrap();

        let err = facade
            .perform_query(&json!({"WHERE": {}, "OPTIONS": {"COLUMNS": ["cs_avg"]}}))
            .await
            .unwrap_err();
        assert!(matches!(err, InsightError::ResultTooLarge(_)));
    }

    #[tokio::test]
    async fn test_writes_run_off_the_runtime_thread() {
        let facade = InsightFacade::new(
            ThreadTrackingRepository::default(),
            FixedGeocoder(HashMap::new()),
        );
        facade
            .add_dataset_archive("cs", &sections_zip(), DatasetKind::Sections)
            .await
            .unwrap();
        facade.remove_dataset("cs").await.unwrap();

        let runtime_thread = thread::current().id();
        let writes = facade.repository().write_threads.lock().unwrap().clone();
        assert_eq!(writes.len(), 2);
        assert!(writes.iter().all(|id| *id != runtime_thread));
    }

    #[test]
    fn test_debug_shows_executor_cap() {
        let facade = facade().with_executor(QueryExecutor::new().with_max_rows(7));
        let rendered = format!("{:?}", facade);
        assert!(rendered.contains("max_rows: 7"));
    }
}
