//! Diagnostic logging setup.
//!
//! The exporter emits `tracing` events; embedding applications usually own
//! the subscriber. `init_logging` is for binaries that do not.

use crate::config::LogLevel;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter directive enabling this crate's events at `level`.
pub fn filter_directive(level: LogLevel) -> String {
    format!("instana_exporter={}", level.as_str())
}

/// Installs a global fmt subscriber. `RUST_LOG`, if set, takes precedence
/// over `level`.
pub fn init_logging(level: LogLevel) -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(filter_directive(level))),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
}
