//! Logging setup for the binary
//!
//! Logs go to stderr so stdout stays reserved for JSON output. `RUST_LOG`
//! overrides the default filter.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use super::errors::{CliError, CliResult};

const DEFAULT_LOG_FILTER: &str = "sheetschema=info";
const VERBOSE_LOG_FILTER: &str = "sheetschema=debug";

/// Picks the filter directive when `RUST_LOG` is not set.
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        VERBOSE_LOG_FILTER
    } else {
        DEFAULT_LOG_FILTER
    }
}

/// Installs the global subscriber.
pub fn init_logging(verbose: bool) -> CliResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(filter)
        .try_init()
        .map_err(|e| CliError::io_error(format!("Failed to initialize logging: {}", e)))
}
