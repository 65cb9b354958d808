//! Load order errors.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while building a load order.
#[derive(Debug, Error)]
pub enum LoadOrderError {
    /// The same plugin appears twice.
    #[error("plugin listed twice in load order: {0}")]
    Duplicate(String),

    /// The load order file could not be read.
    #[error("failed to read load order {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
