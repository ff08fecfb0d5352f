//! Logging setup for flotilla processes.
//!
//! [`LoggerConfig`] describes the output (format, filter, targets, color) and [`init_logger`]
//! installs the matching global `tracing` subscriber once per process.
mod config;
pub use config::{ENV_LOG, ENV_LOG_FORMAT, LoggerConfig};

mod error;
pub use error::{LoggerError, LoggerResult};

mod format;
pub use format::LoggerFormat;

mod level;
pub use level::LoggerLevel;

mod timer;
pub use timer::UtcRfc3339;

mod install;

/// Install the global subscriber described by `cfg`.
///
/// Fails with [`LoggerError::AlreadyInitialized`] when a global subscriber is already set.
///
/// ```rust,no_run
/// use flotilla_observe::{LoggerConfig, init_logger};
///
/// let cfg = LoggerConfig::from_env().unwrap_or_default();
/// init_logger(&cfg).expect("logger");
/// tracing::info!("ready");
/// ```
pub fn init_logger(cfg: &LoggerConfig) -> LoggerResult<()> {
    match cfg.format {
        LoggerFormat::Text => install::text(cfg),
        LoggerFormat::Json => install::json(cfg),
        LoggerFormat::Journald => install::journald(cfg),
    }
}
