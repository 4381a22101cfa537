//! Diagnostic output of the crate itself.
//!
//! The registry carries the experiment's log records; the crate's own
//! `tracing` diagnostics (configuration application, teardown, worker
//! derivation) go to a standard subscriber installed here.

use runlog_types::{LogLevel, Result, RunlogError};
use tracing_subscriber::EnvFilter;

/// Install a global subscriber showing this crate's diagnostics at `level`.
///
/// `RUST_LOG` takes precedence when set. Fails if a global subscriber is
/// already installed.
pub fn init_diagnostics(level: LogLevel) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("runlog_core={}", level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|err| RunlogError::Config(err.to_string()))
}

/// Install a global subscriber with the default diagnostic level.
pub fn init_default() -> Result<()> {
    init_diagnostics(LogLevel::Info)
}
