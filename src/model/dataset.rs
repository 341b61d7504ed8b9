//! Datasets and dataset kinds

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::record::Record;

/// Kind of an ingested dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetKind {
    Sections,
    Rooms,
}

impl DatasetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetKind::Sections => "sections",
            DatasetKind::Rooms => "rooms",
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatasetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sections" => Ok(DatasetKind::Sections),
            "rooms" => Ok(DatasetKind::Rooms),
            other => Err(format!("Unknown dataset kind: '{}'", other)),
        }
    }
}

/// Returns true if `id` may name a dataset: non-blank and without underscore
pub fn is_valid_dataset_id(id: &str) -> bool {
    !id.trim().is_empty() && !id.contains('_')
}

/// A persisted dataset. Serialized as `{id, kind, numRows, data}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub id: String,
    pub kind: DatasetKind,
    #[serde(rename = "numRows")]
    pub num_rows: usize,
    pub data: Vec<Record>,
}

impl Dataset {
    pub fn new(id: impl Into<String>, kind: DatasetKind, data: Vec<Record>) -> Self {
        Self {
            id: id.into(),
            kind,
            num_rows: data.len(),
            data,
        }
    }

    pub fn summary(&self) -> DatasetSummary {
        DatasetSummary {
            id: self.id.clone(),
            kind: self.kind,
            num_rows: self.num_rows,
        }
    }
}

/// Listing entry for a dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub id: String,
    pub kind: DatasetKind,
    #[serde(rename = "numRows")]
    pub num_rows: usize,
}
