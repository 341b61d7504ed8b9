//! # On-Disk Repository
//!
//! One JSON blob per dataset, `{id, kind, numRows, data}`, named by the
//! base64url form of the id. A blob is written to a temporary file and
//! renamed into place, so a reader of the directory sees either the old
//! blob or the new one. All datasets are loaded at open and served from
//! memory afterwards.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use tracing::{debug, info, warn};

use crate::model::{Dataset, DatasetSummary};

use super::backend::DatasetRepository;
use super::errors::{RepositoryError, RepositoryResult};
use super::memory::MemoryRepository;

const BLOB_EXTENSION: &str = "json";
const TEMP_EXTENSION: &str = "json.tmp";

/// Directory-backed dataset repository
#[derive(Debug)]
pub struct DiskRepository {
    root: PathBuf,
    cache: MemoryRepository,
}

impl DiskRepository {
    /// Opens (creating if needed) the directory and loads every blob in it.
    ///
    /// Leftover temporary files from an interrupted write are removed.
    pub fn open(root: impl Into<PathBuf>) -> RepositoryResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;

        let mut datasets = Vec::new();
        for entry in fs::read_dir(&root)? {
            let path = entry?.path();
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default()
                .to_string();

            if name.ends_with(TEMP_EXTENSION) {
                warn!(file = %name, "removing interrupted dataset write");
                fs::remove_file(&path)?;
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some(BLOB_EXTENSION) {
                continue;
            }

            let bytes = fs::read(&path)?;
            let dataset: Dataset =
                serde_json::from_slice(&bytes).map_err(|e| RepositoryError::Corrupt {
                    file: name.clone(),
                    reason: e.to_string(),
                })?;
            datasets.push(dataset);
        }

        info!(dir = %root.display(), datasets = datasets.len(), "dataset repository opened");
        Ok(Self {
            root,
            cache: MemoryRepository::with_datasets(datasets),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn blob_path(&self, id: &str) -> PathBuf {
        self.root
            .join(format!("{}.{}", URL_SAFE_NO_PAD.encode(id), BLOB_EXTENSION))
    }

    fn temp_path(&self, id: &str) -> PathBuf {
        self.root
            .join(format!("{}.{}", URL_SAFE_NO_PAD.encode(id), TEMP_EXTENSION))
    }
}

impl DatasetRepository for DiskRepository {
    fn put(&self, dataset: Dataset) -> RepositoryResult<()> {
        // Fails fast when closed, before touching the directory
        self.cache.exists(&dataset.id)?;

        let bytes = serde_json::to_vec(&dataset)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;
        let temp = self.temp_path(&dataset.id);
        let target = self.blob_path(&dataset.id);

        fs::write(&temp, &bytes)?;
        if let Err(err) = fs::rename(&temp, &target) {
            let _ = fs::remove_file(&temp);
            return Err(err.into());
        }

        debug!(dataset = %dataset.id, bytes = bytes.len(), "dataset blob written");
        self.cache.put(dataset)
    }

    fn get(&self, id: &str) -> RepositoryResult<Option<Arc<Dataset>>> {
        self.cache.get(id)
    }

    fn list(&self) -> RepositoryResult<Vec<DatasetSummary>> {
        self.cache.list()
    }

    fn delete(&self, id: &str) -> RepositoryResult<bool> {
        if !self.cache.exists(id)? {
            return Ok(false);
        }
        match fs::remove_file(self.blob_path(id)) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        self.cache.delete(id)
    }

    fn exists(&self, id: &str) -> RepositoryResult<bool> {
        self.cache.exists(id)
    }

    fn close(&self) -> RepositoryResult<()> {
        self.cache.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DatasetKind, Record, Scalar};
    use tempfile::TempDir;

    fn dataset(id: &str) -> Dataset {
        let mut r = Record::new();
        r.insert(format!("{}_seats", id), Scalar::Number(40.0));
        r.insert(format!("{}_name", id), Scalar::text("ACU_101"));
        Dataset::new(id, DatasetKind::Rooms, vec![r])
    }

    #[test]
    fn test_reopen_restores_datasets() {
        let temp = TempDir::new().unwrap();
        {
            let repo = DiskRepository::open(temp.path()).unwrap();
            repo.put(dataset("rooms")).unwrap();
            repo.put(dataset("other rooms")).unwrap();
        }

        let repo = DiskRepository::open(temp.path()).unwrap();
        let ids: Vec<String> = repo.list().unwrap().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["other rooms", "rooms"]);
        assert_eq!(*repo.get("rooms").unwrap().unwrap(), dataset("rooms"));
    }

    #[test]
    fn test_delete_removes_blob() {
        let temp = TempDir::new().unwrap();
        let repo = DiskRepository::open(temp.path()).unwrap();
        repo.put(dataset("rooms")).unwrap();
        assert!(repo.blob_path("rooms").exists());

        assert!(repo.delete("rooms").unwrap());
        assert!(!repo.blob_path("rooms").exists());
        assert!(!repo.delete("rooms").unwrap());

        let reopened = DiskRepository::open(temp.path()).unwrap();
        assert!(reopened.list().unwrap().is_empty());
    }

    #[test]
    fn test_file_names_are_safe_for_any_id() {
        let temp = TempDir::new().unwrap();
        let repo = DiskRepository::open(temp.path()).unwrap();
        repo.put(dataset("../escape/ id")).unwrap();

        let names: Vec<String> = fs::read_dir(temp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 1);
        assert!(!names[0].contains('/'));
    }

    #[test]
    fn test_interrupted_writes_are_discarded() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("cm9vbXM.json.tmp"), b"{\"id\":").unwrap();

        let repo = DiskRepository::open(temp.path()).unwrap();
        assert!(repo.list().unwrap().is_empty());
        assert!(!temp.path().join("cm9vbXM.json.tmp").exists());
    }

    #[test]
    fn test_corrupt_blob_fails_open() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("cm9vbXM.json"), b"not json").unwrap();
        assert!(matches!(
            DiskRepository::open(temp.path()),
            Err(RepositoryError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_closed_rejects_writes() {
        let temp = TempDir::new().unwrap();
        let repo = DiskRepository::open(temp.path()).unwrap();
        repo.close().unwrap();
        assert!(matches!(repo.put(dataset("rooms")), Err(RepositoryError::Closed)));
        assert!(!repo.blob_path("rooms").exists());
    }
}
