//! Query executor
//!
//! Runs a validated query against one dataset's records.
//!
//! Execution flow (strict order):
//! 1. Filter records by the WHERE tree
//! 2. Group and aggregate when TRANSFORMATIONS is present
//! 3. Enforce the result-size cap
//! 4. Project COLUMNS
//! 5. Apply ORDER (if specified)

use tracing::debug;

use crate::model::Record;

use super::aggregate::Aggregator;
use super::ast::Query;
use super::errors::{QueryError, QueryResult};
use super::filters::FilterEvaluator;
use super::sorter::ResultSorter;

/// Maximum number of rows a query may return
pub const MAX_RESULT_ROWS: usize = 5000;

/// Executes validated queries over in-memory records
#[derive(Debug)]
pub struct QueryExecutor {
    max_rows: usize,
}

impl Default for QueryExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryExecutor {
    pub fn new() -> Self {
        Self {
            max_rows: MAX_RESULT_ROWS,
        }
    }

    /// Overrides the row cap
    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = max_rows;
        self
    }

    /// Executes the query. Performs no I/O.
    pub fn execute(&self, query: &Query, records: &[Record]) -> QueryResult<Vec<Record>> {
        let matched: Vec<&Record> = records
            .iter()
            .filter(|r| FilterEvaluator::matches(&query.filter, r))
            .collect();

        let rows: Vec<Record> = match &query.transformations {
            Some(transformations) => Aggregator::transform(&matched, transformations),
            None => matched.into_iter().cloned().collect(),
        };

        if rows.len() > self.max_rows {
            return Err(QueryError::ResultTooLarge(rows.len(), self.max_rows));
        }

        let mut rows = ResultSorter::project(rows, &query.columns);
        if let Some(order) = &query.order {
            ResultSorter::sort(&mut rows, order);
        }

        debug!(
            dataset = %query.dataset_id,
            scanned = records.len(),
            returned = rows.len(),
            "query executed"
        );
        Ok(rows)
    }
}
