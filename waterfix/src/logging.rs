//! Tracing subscriber setup.
//!
//! Logs go to stderr in a compact format. When a log directory is configured,
//! a second plain-text layer writes to a daily-rolling file through a
//! non-blocking writer. `RUST_LOG` overrides the configured level.

use std::path::{Path, PathBuf};

use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingSettings;

/// File name prefix for rolling log files.
pub const LOG_FILE_PREFIX: &str = "waterfix.log";

/// Errors installing the global subscriber.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The log directory could not be created.
    #[error("failed to create log directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A global subscriber is already installed.
    #[error("failed to install logger: {0}")]
    Init(String),
}

/// Keeps the file writer alive. Drop it last so buffered lines are flushed.
#[must_use = "dropping the guard stops file logging"]
pub struct LogGuard {
    _file: Option<WorkerGuard>,
    log_directory: Option<PathBuf>,
}

impl LogGuard {
    /// Directory receiving log files, if file logging is enabled.
    pub fn log_directory(&self) -> Option<&Path> {
        self.log_directory.as_deref()
    }
}

/// Level string to use given settings and a verbosity override.
pub fn effective_level(settings: &LoggingSettings, verbose: bool) -> &str {
    if verbose {
        "debug"
    } else {
        settings.level.as_str()
    }
}

/// Install the global subscriber.
pub fn init_logging(settings: &LoggingSettings, verbose: bool) -> Result<LogGuard, LoggingError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(effective_level(settings, verbose)));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_timer(LocalTime::new(Rfc3339))
        .with_target(false)
        .compact();

    let (file_layer, file_guard) = match &settings.directory {
        Some(directory) => {
            std::fs::create_dir_all(directory).map_err(|source| {
                LoggingError::CreateDirectory {
                    path: directory.clone(),
                    source,
                }
            })?;
            let appender = tracing_appender::rolling::daily(directory, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_timer(LocalTime::new(Rfc3339))
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| LoggingError::Init(e.to_string()))?;

    Ok(LogGuard {
        _file: file_guard,
        log_directory: settings.directory.clone(),
    })
}
