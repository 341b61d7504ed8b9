//! Logging setup using tracing_subscriber.

use std::io::IsTerminal;
use std::sync::Once;

use tracing_subscriber::{filter::LevelFilter, EnvFilter};

/// Environment variable holding the log directives
pub const LOG_ENV_VAR: &str = "INSIGHTDB_LOG";

/// Initializes a tracing subscriber writing to stderr.
///
/// Safe to call more than once; only the first call installs the
/// subscriber.
pub fn init() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter = env_filter();

        // try_init: a test harness may have installed a subscriber already
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_ansi(std::io::stderr().is_terminal())
            .try_init();

        tracing::debug!(env = LOG_ENV_VAR, "logging initialized");
    });
}

/// `INFO` unless overridden through [`LOG_ENV_VAR`]
fn env_filter() -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .with_env_var(LOG_ENV_VAR)
        .from_env_lossy()
}
