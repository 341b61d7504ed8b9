//! Insight facade for insightdb
//!
//! The one surface the HTTP routes and the CLI call into.
//!
//! # Add Flow (strict order)
//!
//! 1. Validate the id (non-blank, no underscore)
//! 2. Take the writer lock for the id
//! 3. Reject an id that already exists
//! 4. Decode and normalize the archive
//! 5. Commit the whole dataset to the repository
//!
//! Query failures never touch the repository. A failed add leaves it as
//! it was.

mod errors;
mod handler;
mod writers;

pub use errors::{ErrorResponse, InsightError, InsightResult};
pub use handler::InsightFacade;
pub use writers::{WriterGuard, WriterLocks};
