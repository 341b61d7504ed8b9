//! insightdb CLI entry point
//!
//! Installs logging, then delegates everything to the CLI module.

use insightdb::{cli, logging};

fn main() {
    logging::init();

    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
