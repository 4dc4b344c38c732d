//! Structured logging using **tracing**.
//!
//! The JSON subscriber writes to stderr so stdout stays reserved for the
//! report, which CI jobs often capture or diff.

use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

use crate::error::ScanError;

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Initializes the global tracing collector (subscriber).
///
/// This should be called *once* at the beginning of the application's runtime.
///
/// # Environment Variables
/// - `RUST_LOG`: Controls log filtering (e.g., `RUST_LOG=unused_members_core=debug`)
pub fn init_structured_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .json()
        .with_ansi(false)
        .with_level(true)
        .with_target(true)
        .with_current_span(true)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Logs a failure that did not stop the run.
///
/// Recoverable errors (one file that could not be read or fixed) are
/// warnings; anything else is logged as an error.
pub fn log_scan_error(err: &ScanError) {
    let path = err.path().map(|p| p.display().to_string()).unwrap_or_default();
    if err.is_recoverable() {
        warn!(path = %path, detail = %err, "continuing after error");
    } else {
        error!(path = %path, detail = %err);
    }
}
