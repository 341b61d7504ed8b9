//! Projection and ordering of result rows

use std::cmp::Ordering;

use crate::model::{Record, Scalar};

use super::ast::{Direction, OrderSpec};

/// Projects and sorts result rows
pub struct ResultSorter;

impl ResultSorter {
    /// Keeps only the listed columns of each record
    pub fn project(records: Vec<Record>, columns: &[String]) -> Vec<Record> {
        records
            .into_iter()
            .map(|mut record| {
                record.retain(|key, _| columns.iter().any(|c| c == key));
                record
            })
            .collect()
    }

    /// Sorts records according to the ORDER clause.
    ///
    /// Sort is stable. Keys are compared in listed priority and the
    /// direction applies to every key.
    pub fn sort(records: &mut [Record], order: &OrderSpec) {
        let keys = order.keys();
        let direction = order.direction();

        records.sort_by(|a, b| {
            let ordering = keys
                .iter()
                .map(|k| Self::compare_values(a.get(k), b.get(k)))
                .find(|o| *o != Ordering::Equal)
                .unwrap_or(Ordering::Equal);

            match direction {
                Direction::Up => ordering,
                Direction::Down => ordering.reverse(),
            }
        });
    }

    /// A missing value sorts first
    fn compare_values(a: Option<&Scalar>, b: Option<&Scalar>) -> Ordering {
        match (a, b) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(x), Some(y)) => x.compare(y),
        }
    }
}
