//! CLI argument definitions using clap
//!
//! Commands:
//! - insightdb serve --config <path>
//! - insightdb add --id <id> --kind <sections|rooms> --archive <zip> --config <path>
//! - insightdb remove --id <id> --config <path>
//! - insightdb list --config <path>
//! - insightdb query [--file <path>] --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::model::DatasetKind;

/// insightdb - queryable campus course and room datasets
#[derive(Parser, Debug)]
#[command(name = "insightdb")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP server
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = "./insightdb.json")]
        config: PathBuf,

        /// Overrides the configured port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Ingest a zip archive as a new dataset
    Add {
        /// Path to configuration file
        #[arg(long, default_value = "./insightdb.json")]
        config: PathBuf,

        /// Dataset id (no underscores)
        #[arg(long)]
        id: String,

        /// Dataset kind
        #[arg(long)]
        kind: DatasetKind,

        /// Zip archive to ingest
        #[arg(long)]
        archive: PathBuf,
    },

    /// Remove a dataset
    Remove {
        /// Path to configuration file
        #[arg(long, default_value = "./insightdb.json")]
        config: PathBuf,

        /// Dataset id
        #[arg(long)]
        id: String,
    },

    /// List datasets
    List {
        /// Path to configuration file
        #[arg(long, default_value = "./insightdb.json")]
        config: PathBuf,
    },

    /// Execute a single query and exit
    Query {
        /// Path to configuration file
        #[arg(long, default_value = "./insightdb.json")]
        config: PathBuf,

        /// Query document; stdin when absent
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
