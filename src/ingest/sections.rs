//! Course-section normalization
//!
//! Each file entry of a sections archive holds `{"result": [...]}`. Every
//! element carrying all required attributes becomes one record; the rest
//! are skipped. A file that is not JSON, or has no `result` array, fails
//! the ingestion.

use serde::Deserialize;
use serde_json::Value;

use crate::model::{dataset_key, Field, Record, Scalar};

use super::archive::Archive;
use super::errors::{IngestError, IngestResult};
use super::tasks::{FailFastJoinSet, TryWaitAllError};

/// Folder every sections archive must contain
pub const SECTIONS_FOLDER: &str = "courses/";

/// Year assigned to "overall" rollup rows
pub const OVERALL_YEAR: f64 = 1900.0;

#[derive(Debug, Deserialize)]
struct SectionFile {
    result: Vec<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawSection {
    #[serde(rename = "id")]
    uuid: Scalar,
    course: String,
    title: String,
    professor: String,
    subject: String,
    year: Scalar,
    avg: f64,
    pass: f64,
    fail: f64,
    audit: f64,
    #[serde(default)]
    section: Option<String>,
}

impl RawSection {
    fn year(&self) -> Option<f64> {
        if self.section.as_deref() == Some("overall") {
            return Some(OVERALL_YEAR);
        }
        match &self.year {
            Scalar::Number(n) => Some(*n),
            Scalar::Text(s) => s.trim().parse().ok(),
        }
    }

    fn into_record(self, dataset_id: &str) -> Option<Record> {
        let year = self.year()?;
        let key = |field| dataset_key(dataset_id, field);

        let mut record = Record::new();
        record.insert(key(Field::Uuid), Scalar::text(self.uuid.to_string()));
        record.insert(key(Field::Id), Scalar::text(self.course));
        record.insert(key(Field::Title), Scalar::text(self.title));
        record.insert(key(Field::Instructor), Scalar::text(self.professor));
        record.insert(key(Field::Dept), Scalar::text(self.subject));
        record.insert(key(Field::Year), Scalar::Number(year));
        record.insert(key(Field::Avg), Scalar::Number(self.avg));
        record.insert(key(Field::Pass), Scalar::Number(self.pass));
        record.insert(key(Field::Fail), Scalar::Number(self.fail));
        record.insert(key(Field::Audit), Scalar::Number(self.audit));
        Some(record)
    }
}

/// Parses one course file into records
pub fn parse_section_file(dataset_id: &str, name: &str, data: &[u8]) -> IngestResult<Vec<Record>> {
    let file: SectionFile =
        serde_json::from_slice(data).map_err(|e| IngestError::file_parse(name, e))?;

    Ok(file
        .result
        .iter()
        .filter_map(|element| RawSection::deserialize(element).ok())
        .filter_map(|raw| raw.into_record(dataset_id))
        .collect())
}

/// Normalizes a sections archive, parsing files concurrently.
///
/// Every file entry is a course file, wherever it sits in the archive.
/// Output keeps archive name order regardless of task completion order.
pub async fn normalize_sections(dataset_id: &str, archive: &Archive) -> IngestResult<Vec<Record>> {
    archive.require(&[SECTIONS_FOLDER])?;

    let mut tasks = FailFastJoinSet::new();
    for (index, (name, data)) in archive.files().enumerate() {
        let dataset_id = dataset_id.to_string();
        let name = name.to_string();
        let data = data.clone();
        tasks.spawn_blocking(move || {
            parse_section_file(&dataset_id, &name, &data).map(|records| (index, records))
        });
    }

    let mut parsed = tasks.try_collect().await.map_err(|err| match err {
        TryWaitAllError::Error(e) => e,
        TryWaitAllError::Panic(e) => IngestError::Task(e.to_string()),
    })?;
    parsed.sort_by_key(|(index, _)| *index);

    Ok(parsed.into_iter().flat_map(|(_, records)| records).collect())
}
