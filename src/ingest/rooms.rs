//! Campus room normalization
//!
//! `index.htm` lists buildings; each file under the buildings folder holds
//! the room table of one building, named by the building short name. Table
//! cells are identified by their `views-field-*` class token. A row with
//! any field that cannot be resolved is dropped.

use std::collections::{BTreeSet, HashMap};

use futures_util::future::try_join_all;

use crate::model::{dataset_key, Field, Record, Scalar};

use super::archive::{entry_text, Archive};
use super::errors::{IngestError, IngestResult};
use super::geo::{GeoLocation, Geocoder};
use super::html::Element;
use super::tasks::{FailFastJoinSet, TryWaitAllError};

pub const INDEX_FILE: &str = "index.htm";
pub const BUILDINGS_FOLDER: &str = "campus/discover/buildings-and-classrooms/";

/// Entries every rooms archive must contain, checked in this order
pub const ROOMS_REQUIRED: [&str; 4] = [
    "campus/",
    "campus/discover/",
    BUILDINGS_FOLDER,
    INDEX_FILE,
];

/// Table column, keyed by the cell's class token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Column {
    ShortName,
    Address,
    FullName,
    Href,
    Number,
    Seats,
    Furniture,
    Type,
}

const COLUMN_MARKERS: [(&str, Column); 8] = [
    ("views-field-field-building-code", Column::ShortName),
    ("views-field-field-building-address", Column::Address),
    ("views-field-title", Column::FullName),
    ("views-field-nothing", Column::Href),
    ("views-field-field-room-number", Column::Number),
    ("views-field-field-room-capacity", Column::Seats),
    ("views-field-field-room-furniture", Column::Furniture),
    ("views-field-field-room-type", Column::Type),
];

impl Column {
    fn of(cell: &Element) -> Option<Column> {
        COLUMN_MARKERS
            .iter()
            .find(|(marker, _)| cell.has_class(marker))
            .map(|(_, column)| *column)
    }

    fn extract(&self, cell: &Element) -> Option<String> {
        let link = || cell.find_first(|el| el.tag() == "a");
        match self {
            Column::FullName | Column::Number => link().map(|a| a.text().trim().to_string()),
            Column::Href => link()
                .and_then(|a| a.attr("href"))
                .map(|href| href.trim().to_string()),
            _ => Some(cell.text().trim().to_string()),
        }
    }
}

/// Resolved cell values of one table row
fn row_cells(row: &Element) -> HashMap<Column, String> {
    let mut cells = HashMap::new();
    for cell in row.child_elements("td") {
        if let Some(column) = Column::of(cell) {
            if let Some(value) = column.extract(cell) {
                cells.insert(column, value);
            }
        }
    }
    cells
}

/// A row of the building index
#[derive(Debug, Clone, PartialEq)]
pub struct Building {
    pub fullname: String,
    pub shortname: String,
    pub address: String,
}

/// A row of a building's room table
#[derive(Debug, Clone, PartialEq)]
pub struct RoomRow {
    pub number: String,
    pub seats: f64,
    pub furniture: String,
    pub room_type: String,
    pub href: String,
}

/// Parses the building index
pub fn parse_buildings(source: &str) -> Vec<Building> {
    let root = Element::parse_document(source);
    let rows = root.descendants_by_tag("tr");
    rows.into_iter()
        .filter_map(|row| {
            let mut cells = row_cells(row);
            Some(Building {
                fullname: cells.remove(&Column::FullName)?,
                shortname: cells.remove(&Column::ShortName)?,
                address: cells.remove(&Column::Address)?,
            })
        })
        .collect()
}

/// Parses one building's room table
pub fn parse_rooms(source: &str) -> Vec<RoomRow> {
    let root = Element::parse_document(source);
    let rows = root.descendants_by_tag("tr");
    rows.into_iter()
        .filter_map(|row| {
            let mut cells = row_cells(row);
            Some(RoomRow {
                number: cells.remove(&Column::Number)?,
                seats: cells.remove(&Column::Seats)?.parse().ok()?,
                furniture: cells.remove(&Column::Furniture)?,
                room_type: cells.remove(&Column::Type)?,
                href: cells.remove(&Column::Href)?,
            })
        })
        .collect()
}

/// Building short name encoded in a room file path
pub fn building_code(file_name: &str) -> Option<&str> {
    let stem = file_name.strip_prefix(BUILDINGS_FOLDER)?;
    let stem = stem.rsplit('/').next().unwrap_or(stem);
    let stem = match stem.rfind('.') {
        Some(dot) => &stem[..dot],
        None => stem,
    };
    (!stem.is_empty()).then_some(stem)
}

fn room_record(dataset_id: &str, building: &Building, room: RoomRow, geo: GeoLocation) -> Record {
    let key = |field| dataset_key(dataset_id, field);

    let mut record = Record::new();
    record.insert(key(Field::Fullname), Scalar::text(building.fullname.as_str()));
    record.insert(key(Field::Shortname), Scalar::text(building.shortname.as_str()));
    record.insert(
        key(Field::Name),
        Scalar::text(format!("{}_{}", building.shortname, room.number)),
    );
    record.insert(key(Field::Number), Scalar::text(room.number));
    record.insert(key(Field::Address), Scalar::text(building.address.as_str()));
    record.insert(key(Field::Lat), Scalar::Number(geo.lat));
    record.insert(key(Field::Lon), Scalar::Number(geo.lon));
    record.insert(key(Field::Seats), Scalar::Number(room.seats));
    record.insert(key(Field::Type), Scalar::text(room.room_type));
    record.insert(key(Field::Furniture), Scalar::text(room.furniture));
    record.insert(key(Field::Href), Scalar::text(room.href));
    record
}

/// Normalizes a rooms archive.
///
/// Room tables are parsed concurrently, then every distinct address of a
/// building that owns rooms is geocoded concurrently. Any failure aborts.
pub async fn normalize_rooms<G: Geocoder>(
    dataset_id: &str,
    archive: &Archive,
    geocoder: &G,
) -> IngestResult<Vec<Record>> {
    archive.require(&ROOMS_REQUIRED)?;

    let index_page = archive.file(INDEX_FILE)?;
    let buildings = parse_buildings(entry_text(INDEX_FILE, &index_page)?);
    let mut by_code: HashMap<String, Building> = HashMap::new();
    for building in buildings {
        by_code.entry(building.shortname.clone()).or_insert(building);
    }

    let mut tasks = FailFastJoinSet::new();
    for (index, (name, data)) in archive.files().enumerate() {
        let Some(code) = building_code(name) else {
            continue;
        };
        if !by_code.contains_key(code) {
            continue;
        }
        let code = code.to_string();
        let name = name.to_string();
        let data = data.clone();
        tasks.spawn_blocking(move || {
            entry_text(&name, &data).map(|text| (index, code, parse_rooms(text)))
        });
    }

    let mut tables = tasks.try_collect().await.map_err(|err| match err {
        TryWaitAllError::Error(e) => e,
        TryWaitAllError::Panic(e) => IngestError::Task(e.to_string()),
    })?;
    tables.sort_by_key(|(index, _, _)| *index);

    let addresses: BTreeSet<&str> = tables
        .iter()
        .filter(|(_, _, rooms)| !rooms.is_empty())
        .filter_map(|(_, code, _)| by_code.get(code))
        .map(|b| b.address.as_str())
        .collect();

    let locations = try_join_all(addresses.iter().map(|address| async move {
        geocoder.resolve(address).await.map(|geo| (*address, geo))
    }))
    .await?;
    let locations: HashMap<&str, GeoLocation> = locations.into_iter().collect();

    let mut records = Vec::new();
    for (_, code, rooms) in tables {
        let Some(building) = by_code.get(&code) else {
            continue;
        };
        let Some(geo) = locations.get(building.address.as_str()) else {
            continue;
        };
        for room in rooms {
            records.push(room_record(dataset_id, building, room, *geo));
        }
    }

    tracing::debug!(
        dataset = dataset_id,
        buildings = by_code.len(),
        addresses = locations.len(),
        rooms = records.len(),
        "rooms normalized"
    );
    Ok(records)
}

#[cfg(test)]
pub(crate) mod fixtures {
    pub const INDEX: &str = r##"<html><body><table><tbody>
<tr>
  <td class="views-field views-field-field-building-code">ACU</td>
  <td class="views-field views-field-title"><a href="./campus/discover/buildings-and-classrooms/ACU.htm">Acute Care Unit</a></td>
  <td class="views-field views-field-field-building-address">2211 Wesbrook Mall</td>
  <td class="views-field views-field-nothing"><a href="./campus/discover/buildings-and-classrooms/ACU.htm">More info</a></td>
</tr>
<tr>
  <td class="views-field views-field-field-building-code">ALRD</td>
  <td class="views-field views-field-title"><a href="#">Allard Hall (LAW)</a></td>
  <td class="views-field views-field-field-building-address">1822 East Mall</td>
</tr>
<tr>
  <td class="views-field views-field-field-building-code">NOADDR</td>
  <td class="views-field views-field-title"><a href="#">Nowhere</a></td>
</tr>
</tbody></table></body></html>"##;

    pub const ACU: &str = r##"<html><body><table><thead><tr><th>Room</th></tr></thead><tbody>
<tr>
  <td class="views-field views-field-field-room-number"><a href="http://students.ubc.ca/ACU-101">101</a></td>
  <td class="views-field views-field-field-room-capacity"> 40 </td>
  <td class="views-field views-field-field-room-furniture">Classroom-Movable Tables &amp; Chairs</td>
  <td class="views-field views-field-field-room-type">Small Group</td>
  <td class="views-field views-field-nothing"><a href="http://students.ubc.ca/ACU-101">More info</a></td>
</tr>
<tr>
  <td class="views-field views-field-field-room-number"><a href="#">102</a></td>
  <td class="views-field views-field-field-room-capacity"></td>
  <td class="views-field views-field-field-room-furniture">Fixed Tables</td>
  <td class="views-field views-field-field-room-type">Case Style</td>
  <td class="views-field views-field-nothing"><a href="#">More info</a></td>
</tr>
</tbody></table></body></html>"##;
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::fixtures::{ACU, INDEX};
    use super::*;
    use crate::ingest::archive::fixtures::zip_of;

    #[derive(Default)]
    struct RecordingGeocoder {
        calls: Mutex<Vec<String>>,
        fail: bool,
    }

    impl Geocoder for RecordingGeocoder {
        async fn resolve(&self, address: &str) -> IngestResult<GeoLocation> {
            if let Ok(mut calls) = self.calls.lock() {
                calls.push(address.to_string());
            }
            if self.fail {
                return Err(IngestError::geocode(address, "unknown address"));
            }
            Ok(GeoLocation {
                lat: 49.26,
                lon: -123.24,
            })
        }
    }

    fn rooms_archive(extra: &[(&str, &str)]) -> Archive {
        let mut entries = vec![
            ("campus/", ""),
            ("campus/discover/", ""),
            ("campus/discover/buildings-and-classrooms/", ""),
            ("index.htm", INDEX),
            ("campus/discover/buildings-and-classrooms/ACU.htm", ACU),
        ];
        entries.extend_from_slice(extra);
        Archive::from_bytes(&zip_of(&entries)).unwrap()
    }

    #[test]
    fn test_parse_buildings_drops_incomplete_rows() {
        let buildings = parse_buildings(INDEX);
        assert_eq!(buildings.len(), 2);
        assert_eq!(
            buildings[0],
            Building {
                fullname: "Acute Care Unit".into(),
                shortname: "ACU".into(),
                address: "2211 Wesbrook Mall".into(),
            }
        );
    }

    #[test]
    fn test_parse_rooms_drops_unresolved_rows() {
        let rooms = parse_rooms(ACU);
        assert_eq!(rooms.len(), 1);
        assert_eq!(rooms[0].number, "101");
        assert_eq!(rooms[0].seats, 40.0);
        assert_eq!(rooms[0].furniture, "Classroom-Movable Tables & Chairs");
        assert_eq!(rooms[0].href, "http://students.ubc.ca/ACU-101");
    }

    #[test]
    fn test_building_code_from_file_name() {
        assert_eq!(
            building_code("campus/discover/buildings-and-classrooms/ACU.htm"),
            Some("ACU")
        );
        assert_eq!(building_code("campus/discover/buildings-and-classrooms/"), None);
        assert_eq!(building_code("index.htm"), None);
    }

    #[tokio::test]
    async fn test_normalize_builds_room_records() {
        let geocoder = RecordingGeocoder::default();
        let records = normalize_rooms("r", &rooms_archive(&[]), &geocoder)
            .await
            .unwrap();

        assert_eq!(records.len(), 1);
        let room = &records[0];
        assert_eq!(room.len(), 11);
        assert_eq!(room.get("r_name"), Some(&Scalar::text("ACU_101")));
        assert_eq!(room.get("r_fullname"), Some(&Scalar::text("Acute Care Unit")));
        assert_eq!(room.get("r_lat"), Some(&Scalar::Number(49.26)));
        assert_eq!(room.get("r_seats"), Some(&Scalar::Number(40.0)));
        assert_eq!(room.get("r_type"), Some(&Scalar::text("Small Group")));
    }

    #[tokio::test]
    async fn test_geocodes_only_buildings_with_rooms() {
        let geocoder = RecordingGeocoder::default();
        normalize_rooms("r", &rooms_archive(&[]), &geocoder)
            .await
            .unwrap();
        let calls = geocoder.calls.lock().unwrap().clone();
        assert_eq!(calls, vec!["2211 Wesbrook Mall".to_string()]);
    }

    #[tokio::test]
    async fn test_room_files_without_building_are_ignored() {
        let geocoder = RecordingGeocoder::default();
        let archive = rooms_archive(&[("campus/discover/buildings-and-classrooms/ZZZ.htm", ACU)]);
        let records = normalize_rooms("r", &archive, &geocoder).await.unwrap();
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn test_geocode_failure_aborts() {
        let geocoder = RecordingGeocoder {
            fail: true,
            ..Default::default()
        };
        assert!(matches!(
            normalize_rooms("r", &rooms_archive(&[]), &geocoder).await,
            Err(IngestError::Geocode { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_index_is_named() {
        let archive = Archive::from_bytes(&zip_of(&[(
            "campus/discover/buildings-and-classrooms/ACU.htm",
            ACU,
        )]))
        .unwrap();
        match normalize_rooms("r", &archive, &RecordingGeocoder::default()).await {
            Err(IngestError::MissingEntry(name)) => assert_eq!(name, "index.htm"),
            other => panic!("unexpected: {:?}", other.map(|r| r.len())),
        }
    }
}
