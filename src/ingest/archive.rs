//! In-memory view of a zip archive
//!
//! Entries are read once, up front. Folder entries are tracked by name,
//! including folders that only exist implicitly as a prefix of a file path.

use std::collections::{BTreeMap, BTreeSet};
use std::io::{Cursor, Read};
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use zip::ZipArchive;

use super::errors::{IngestError, IngestResult};

/// Upper bound on the up-front allocation for one entry
const MAX_SIZE_HINT: u64 = 1 << 20;

/// Decoded archive contents
#[derive(Debug, Clone, Default)]
pub struct Archive {
    files: BTreeMap<String, Arc<[u8]>>,
    names: BTreeSet<String>,
}

impl Archive {
    /// Decodes base64 content, then the zip inside it
    pub fn from_base64(content: &str) -> IngestResult<Self> {
        let bytes = STANDARD
            .decode(content.trim())
            .map_err(|_| IngestError::InvalidBase64)?;
        Self::from_bytes(&bytes)
    }

    /// Reads every entry of a zip archive into memory
    pub fn from_bytes(bytes: &[u8]) -> IngestResult<Self> {
        let mut zip = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| IngestError::InvalidArchive(e.to_string()))?;

        let mut archive = Archive::default();
        for i in 0..zip.len() {
            let mut entry = zip
                .by_index(i)
                .map_err(|e| IngestError::InvalidArchive(e.to_string()))?;
            let name = entry.name().to_string();
            archive.record_parents(&name);

            if entry.is_dir() {
                archive.names.insert(name);
                continue;
            }

            // declared sizes are untrusted
            let hint = entry.size().min(MAX_SIZE_HINT) as usize;
            let mut data = Vec::with_capacity(hint);
            entry
                .read_to_end(&mut data)
                .map_err(|e| IngestError::file_parse(name.as_str(), e))?;
            archive.names.insert(name.clone());
            archive.files.insert(name, Arc::from(data));
        }

        Ok(archive)
    }

    fn record_parents(&mut self, name: &str) {
        for (pos, _) in name.match_indices('/') {
            self.names.insert(name[..=pos].to_string());
        }
    }

    /// Returns true if a file or folder with this exact name exists
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Fails on the first required entry that is absent
    pub fn require(&self, required: &[&str]) -> IngestResult<()> {
        match required.iter().find(|name| !self.contains(name)) {
            Some(missing) => Err(IngestError::MissingEntry(missing.to_string())),
            None => Ok(()),
        }
    }

    /// File entries in name order
    pub fn files(&self) -> impl Iterator<Item = (&str, &Arc<[u8]>)> {
        self.files.iter().map(|(name, data)| (name.as_str(), data))
    }

    /// Contents of one file
    pub fn file(&self, name: &str) -> IngestResult<Arc<[u8]>> {
        self.files
            .get(name)
            .cloned()
            .ok_or_else(|| IngestError::MissingEntry(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Decodes an entry as UTF-8 text
pub fn entry_text<'a>(name: &str, data: &'a [u8]) -> IngestResult<&'a str> {
    std::str::from_utf8(data).map_err(|e| IngestError::file_parse(name, e))
}


#[cfg(test)]
mod tests {
    use super::fixtures::zip_of;
    use super::*;

    #[test]
    fn test_reads_files_and_folders() {
        let bytes = zip_of(&[("courses/", ""), ("courses/CPSC110", "{}")]);
        let archive = Archive::from_bytes(&bytes).unwrap();

        assert!(archive.contains("courses/"));
        assert!(archive.contains("courses/CPSC110"));
        assert_eq!(archive.len(), 1);
        assert_eq!(&*archive.file("courses/CPSC110").unwrap(), b"{}");
    }

    #[test]
    fn test_implied_parent_folders() {
        let bytes = zip_of(&[("campus/discover/buildings-and-classrooms/ALRD.htm", "<html/>")]);
        let archive = Archive::from_bytes(&bytes).unwrap();

        assert!(archive
            .require(&[
                "campus/",
                "campus/discover/",
                "campus/discover/buildings-and-classrooms/",
            ])
            .is_ok());
    }

    #[test]
    fn test_require_names_missing_entry() {
        let bytes = zip_of(&[("campus/", "")]);
        let archive = Archive::from_bytes(&bytes).unwrap();

        match archive.require(&["campus/", "index.htm"]) {
            Err(IngestError::MissingEntry(name)) => assert_eq!(name, "index.htm"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_base64_round() {
        let bytes = zip_of(&[("courses/", "")]);
        let encoded = STANDARD.encode(&bytes);
        assert!(Archive::from_base64(&encoded).unwrap().contains("courses/"));
    }

    #[test]
    fn test_bad_content() {
        assert!(matches!(
            Archive::from_base64("not base64!!"),
            Err(IngestError::InvalidBase64)
        ));
        assert!(matches!(
            Archive::from_bytes(b"plain text, not a zip"),
            Err(IngestError::InvalidArchive(_))
        ));
    }

    #[test]
    fn test_entries_larger_than_size_hint_read_fully() {
        let big = "x".repeat(MAX_SIZE_HINT as usize * 2 + 3);
        let archive = Archive::from_bytes(&zip_of(&[("courses/BIG", big.as_str())])).unwrap();
        assert_eq!(archive.file("courses/BIG").unwrap().len(), big.len());
    }
}
