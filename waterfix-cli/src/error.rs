//! CLI error type.

use std::path::PathBuf;

use thiserror::Error;
use waterfix::config::ConfigError;
use waterfix::index::PluginError;
use waterfix::load_order::LoadOrderError;
use waterfix::logging::LoggingError;
use waterfix::reconcile::ReconcileError;

/// Fatal errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Config(String),

    #[error(transparent)]
    ConfigFile(#[from] ConfigError),

    #[error(transparent)]
    Logging(#[from] LoggingError),

    #[error("data directory not found: {}", .0.display())]
    DataDirectory(PathBuf),

    #[error(transparent)]
    LoadOrder(#[from] LoadOrderError),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    #[error(transparent)]
    Plugin(#[from] PluginError),

    #[error("output plugin {0} exists and was not written by WaterFix; choose another --output name")]
    OutputConflict(String),

    #[error("failed to render report: {0}")]
    Report(String),
}
