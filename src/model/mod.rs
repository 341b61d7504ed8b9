//! Data model shared by ingestion, storage and querying
//!
//! A dataset is an ordered collection of flat records. Every record key has
//! the shape `<datasetId>_<field>` and all keys in one record share the
//! same dataset id.
//!
//! Fields fall into two disjoint classes:
//! - numeric (`year`, `avg`, `pass`, `fail`, `audit`, `lat`, `lon`, `seats`)
//! - string (`uuid`, `id`, `title`, `instructor`, `dept`, `fullname`,
//!   `shortname`, `number`, `name`, `address`, `type`, `furniture`, `href`)

mod dataset;
mod fields;
mod record;

pub use dataset::{is_valid_dataset_id, Dataset, DatasetKind, DatasetSummary};
pub use fields::{Field, FieldClass};
pub use record::{dataset_key, Record, Scalar, ScalarKey};
