//! Logging setup.
//!
//! Library code only emits `tracing` events; binaries call
//! [`init_logging`] once at startup to print them.

use tracing_subscriber::EnvFilter;

/// Levels accepted by [`init_logging`] and the `logging.level` setting.
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Level used when nothing is configured.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Whether `level` names a known log level (case-insensitive).
pub fn is_valid_level(level: &str) -> bool {
    LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str())
}

/// Install a formatted stderr subscriber filtered at `level`.
///
/// `RUST_LOG` takes precedence when set. Only the first call installs a
/// subscriber; later calls do nothing.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_ascii_lowercase()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
