//! CLI module for insightdb
//!
//! Provides command-line interface for:
//! - serve: Start the HTTP server over the persisted datasets
//! - add: Ingest a zip archive
//! - remove: Delete a dataset
//! - list: Print dataset summaries
//! - query: One-shot query execution

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{add, list, query, remove, run, run_command, serve};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_query, write_error, write_result};
