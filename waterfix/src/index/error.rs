//! Record index errors.

use std::path::PathBuf;

use thiserror::Error;

use crate::record::{ModKey, RecordId, RecordIdError};

/// Errors raised while querying a [`RecordIndex`](super::RecordIndex).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IndexError {
    /// No plugin in the load order defines the record.
    #[error("no plugin defines record {0}")]
    NotFound(RecordId),

    /// A definition of the record could not be decoded.
    #[error("corrupt definition of {id} in {plugin}: {reason}")]
    Corrupt {
        id: RecordId,
        plugin: ModKey,
        reason: String,
    },

    /// The records of a plugin could not be enumerated.
    #[error("cannot enumerate records of {plugin}: {reason}")]
    Enumeration { plugin: ModKey, reason: String },

    /// The plugin is not part of the index's load order.
    #[error("plugin not in load order: {0}")]
    UnknownPlugin(ModKey),
}

/// Errors reading or writing plugin dump files.
#[derive(Debug, Error)]
pub enum PluginError {
    /// The file could not be read.
    #[error("failed to read plugin {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file could not be written.
    #[error("failed to write plugin {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not a valid plugin document.
    #[error("malformed plugin {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A record id in the plugin is malformed.
    #[error("malformed record id in {plugin}: {source}")]
    RecordId {
        plugin: ModKey,
        #[source]
        source: RecordIdError,
    },

    /// The document's name does not match the file it was read from.
    #[error("plugin file {path} declares name {declared}")]
    NameMismatch { path: PathBuf, declared: String },

    /// Serializing a plugin failed.
    #[error("failed to serialize plugin {plugin}: {source}")]
    Serialize {
        plugin: ModKey,
        #[source]
        source: serde_json::Error,
    },

    /// The data directory pattern could not be listed.
    #[error("invalid data directory {0}")]
    Directory(PathBuf),
}
