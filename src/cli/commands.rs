//! CLI command implementations
//!
//! Every command loads the configuration, opens the on-disk repository and
//! runs one facade operation on a fresh tokio runtime. Facade failures are
//! reported as a `{"error", "code"}` line on stdout and as a non-zero exit.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::config::Config;
use crate::facade::{InsightFacade, InsightResult};
use crate::http_server::HttpServer;
use crate::ingest::HttpGeocoder;
use crate::model::DatasetKind;
use crate::repository::DiskRepository;

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{read_query, write_error, write_result};

/// Facade over persisted datasets and the configured geocoder
type CliFacade = InsightFacade<DiskRepository, HttpGeocoder>;

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Serve { config, port } => serve(&config, port),
        Command::Add {
            config,
            id,
            kind,
            archive,
        } => add(&config, &id, kind, &archive),
        Command::Remove { config, id } => remove(&config, &id),
        Command::List { config } => list(&config),
        Command::Query { config, file } => query(&config, file.as_deref()),
    }
}

/// Serve the HTTP surface until ctrl-c
pub fn serve(config_path: &Path, port: Option<u16>) -> CliResult<()> {
    let config = Config::load_or_default(config_path)?;
    let mut http_config = config.http.clone();
    if let Some(port) = port {
        http_config.port = port;
    }

    let rt = runtime()?;
    rt.block_on(async {
        let facade = Arc::new(open_facade(&config)?);
        info!(
            data_dir = %facade.repository().root().display(),
            geocoder = %config.geocoder.base_url,
            "serving datasets"
        );
        let server = HttpServer::with_config(http_config, Arc::clone(&facade));
        server
            .start()
            .await
            .map_err(|e| CliError::boot_failed(format!("HTTP server failed: {}", e)))?;
        facade.close()?;
        Ok::<(), CliError>(())
    })
}

/// Ingest one archive file
pub fn add(config_path: &Path, id: &str, kind: DatasetKind, archive: &Path) -> CliResult<()> {
    let config = Config::load_or_default(config_path)?;
    let bytes = fs::read(archive).map_err(|e| {
        CliError::io_error(format!("Failed to read archive {}: {}", archive.display(), e))
    })?;
    info!(dataset = id, %kind, bytes = bytes.len(), "adding dataset from archive");

    let rt = runtime()?;
    let facade = open_facade(&config)?;
    let outcome = rt.block_on(facade.add_dataset_archive(id, &bytes, kind));
    finish(&facade, outcome)
}

/// Remove one dataset
pub fn remove(config_path: &Path, id: &str) -> CliResult<()> {
    let config = Config::load_or_default(config_path)?;
    let rt = runtime()?;
    let facade = open_facade(&config)?;
    let outcome = rt.block_on(facade.remove_dataset(id));
    finish(&facade, outcome)
}

/// List every dataset
pub fn list(config_path: &Path) -> CliResult<()> {
    let config = Config::load_or_default(config_path)?;
    let rt = runtime()?;
    let facade = open_facade(&config)?;
    let outcome = rt.block_on(facade.list_datasets());
    finish(&facade, outcome)
}

/// Execute a single query and exit
pub fn query(config_path: &Path, file: Option<&Path>) -> CliResult<()> {
    let config = Config::load_or_default(config_path)?;
    let document = read_query(file)?;
    let rt = runtime()?;
    let facade = open_facade(&config)?;
    let outcome = rt.block_on(facade.perform_query(&document));
    finish(&facade, outcome)
}

/// Closes the repository and prints the outcome as one JSON line
fn finish<T: Serialize>(facade: &CliFacade, outcome: InsightResult<T>) -> CliResult<()> {
    facade.close()?;

    match outcome {
        Ok(result) => write_result(&result),
        Err(err) => {
            write_error(err.code(), &err.to_string())?;
            Err(err.into())
        }
    }
}

fn open_facade(config: &Config) -> CliResult<CliFacade> {
    let repository = DiskRepository::open(&config.data_dir)?;
    let geocoder = HttpGeocoder::new(&config.geocoder.base_url)
        .map_err(|e| CliError::config_error(e.to_string()))?;
    Ok(InsightFacade::new(repository, geocoder))
}

fn runtime() -> CliResult<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))
}
