//! Log output for the ledger binaries.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// The log filter used when `RUST_LOG` is not set.
const DEFAULT_LOG_FILTER: &str = "info";

/// Install a global subscriber that writes logs to stderr.
///
/// The level is read from the `RUST_LOG` environment variable, e.g.
/// `RUST_LOG=ledger_rs=debug`, and defaults to `info`. Logs go to stderr so
/// they do not mix with reports printed to stdout.
///
/// Only the first call installs a subscriber. Later calls leave it in place
/// and log the refusal at debug level.
pub fn setup_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let stderr_log = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    if let Err(error) = tracing_subscriber::registry()
        .with(filter)
        .with(stderr_log)
        .try_init()
    {
        tracing::debug!("Logging is already set up: {error}");
    }
}
