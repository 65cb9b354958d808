//! The record index capability.

use crate::load_order::LoadOrder;
use crate::record::{FileDefinition, ModKey, RecordId};

use super::error::IndexError;

/// Read access to every plugin's decoded records.
///
/// Reconciliation is written against this trait only, so any backing store
/// (the in-memory [`MemoryRecordIndex`](super::MemoryRecordIndex), a real
/// binary plugin reader) can drive it.
pub trait RecordIndex {
    /// The load order the index was built from.
    fn load_order(&self) -> &LoadOrder;

    /// Every record id the plugin defines, including overrides of records
    /// introduced by its masters.
    fn local_records(&self, plugin: &ModKey) -> Result<Vec<RecordId>, IndexError>;

    /// Every plugin's definition of `id`, each tagged with its origin.
    ///
    /// Order is unspecified. Fails if any definition cannot be decoded.
    fn all_definitions(&self, id: &RecordId) -> Result<Vec<FileDefinition>, IndexError>;

    /// The definition from the highest-priority plugin that defines `id`.
    ///
    /// The default picks the maximum priority from [`all_definitions`];
    /// implementations with a precomputed winner table should override it.
    ///
    /// [`all_definitions`]: RecordIndex::all_definitions
    fn winning_definition(&self, id: &RecordId) -> Result<FileDefinition, IndexError> {
        self.all_definitions(id)?
            .into_iter()
            .max_by_key(|def| def.priority)
            .ok_or_else(|| IndexError::NotFound(id.clone()))
    }
}
