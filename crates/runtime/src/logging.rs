//! Tracing setup for binaries: stderr plus an optional log file.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use crate::config::RuntimeConfig;
use crate::error::{Result, RuntimeError};

/// Keeps the file writer alive. Dropping it flushes and stops file logging.
#[must_use = "dropping the guard stops file logging"]
pub struct LogGuard {
    _file: Option<WorkerGuard>,
}

/// Installs the global subscriber.
///
/// The filter comes from `RUST_LOG`, defaulting to `info`. When file logging
/// is enabled, a daily-rolling `tactics.log` is written to the configured
/// log directory.
pub fn init(config: &RuntimeConfig) -> Result<LogGuard> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let (file_layer, guard) = if config.file_logging {
        let dir = config.resolved_log_dir();
        std::fs::create_dir_all(&dir).map_err(|source| RuntimeError::LogDirectory {
            path: dir.display().to_string(),
            source,
        })?;

        let appender = tracing_appender::rolling::daily(&dir, "tactics.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(false);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| RuntimeError::Subscriber(e.to_string()))?;

    if config.file_logging {
        tracing::info!(
            target: "runtime::logging",
            "Log file: {}/tactics.log",
            config.resolved_log_dir().display()
        );
    }

    Ok(LogGuard { _file: guard })
}
