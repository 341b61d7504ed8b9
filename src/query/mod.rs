//! Query engine for insightdb
//!
//! A query document is validated once into a typed [`Query`] and then
//! executed against one dataset snapshot.
//!
//! # Execution Flow (strict order)
//!
//! 1. Validate the document against the grammar and collect dataset ids
//! 2. Filter records by the WHERE tree
//! 3. Group and apply aggregates (if TRANSFORMATIONS is present)
//! 4. Enforce the result-size guard
//! 5. Project COLUMNS
//! 6. Order (if ORDER is present)
//!
//! Execution is pure: no I/O happens after the dataset snapshot is loaded.

mod aggregate;
mod ast;
mod errors;
mod executor;
mod filters;
mod sorter;
mod validator;

pub use aggregate::Aggregator;
pub use ast::{
    ApplyRule, ApplyToken, Comparator, Direction, FieldKey, Filter, OrderSpec, Query,
    Transformations, WildcardPattern,
};
pub use errors::{QueryError, QueryResult};
pub use executor::{QueryExecutor, MAX_RESULT_ROWS};
pub use filters::FilterEvaluator;
pub use sorter::ResultSorter;
pub use validator::{DatasetCatalog, QueryValidator};
