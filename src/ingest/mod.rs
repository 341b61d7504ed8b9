//! Archive ingestion for insightdb
//!
//! Turns an uploaded zip archive into the flat records of one dataset.
//!
//! # Ingestion Flow (strict order)
//!
//! 1. Decode base64 (when given) and read every zip entry into memory
//! 2. Check the entries the dataset kind requires
//! 3. Parse entries concurrently; the first failure aborts the rest
//! 4. For rooms, geocode each distinct building address concurrently
//! 5. Reject an archive that yields no records
//!
//! Nothing is persisted here. The caller commits the records only after
//! every step has succeeded.

mod archive;
mod errors;
mod geo;
mod html;
mod rooms;
mod sections;
mod tasks;

pub use archive::Archive;
pub use errors::{IngestError, IngestResult};
pub use geo::{GeoLocation, GeoResponse, Geocoder, HttpGeocoder};
pub use html::{Element, HtmlNode};
pub use rooms::{normalize_rooms, parse_buildings, parse_rooms, Building, RoomRow};
pub use sections::{normalize_sections, parse_section_file, OVERALL_YEAR};
pub use tasks::{FailFastJoinSet, TryWaitAllError};

#[cfg(test)]
pub(crate) use archive::fixtures;

use crate::model::{DatasetKind, Record};

/// Normalizes an archive into records of the given kind
pub async fn normalize<G: Geocoder>(
    dataset_id: &str,
    kind: DatasetKind,
    archive: &Archive,
    geocoder: &G,
) -> IngestResult<Vec<Record>> {
    let records = match kind {
        DatasetKind::Sections => normalize_sections(dataset_id, archive).await?,
        DatasetKind::Rooms => normalize_rooms(dataset_id, archive, geocoder).await?,
    };

    if records.is_empty() {
        return Err(IngestError::NoValidRecords);
    }
    Ok(records)
}
