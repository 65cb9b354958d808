//! Fatal reconciliation errors.
//!
//! Everything else that can go wrong during a run is local to a plugin or a
//! record and is reported through [`ReconcileReport`](super::ReconcileReport).

use thiserror::Error;

/// Errors that abort a reconciliation run before scanning.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    /// Neither authority plugin is in the load order, so no truth exists.
    #[error("neither {community_patch} nor {official_update} is in the load order")]
    MissingAuthority {
        community_patch: String,
        official_update: String,
    },

    /// The output plugin is a trusted source and would shadow it.
    #[error("output plugin {0} is a trusted source")]
    TrustedOutput(String),
}
