//! Override resolution under last-writer-wins priority.

use crate::index::{IndexError, RecordIndex};
use crate::load_order::LoadOrder;
use crate::record::{FileDefinition, ModKey, RecordId};

/// Resolves which plugin's definition of a record is in effect.
///
/// Priority is strictly the load order position; no two plugins share a
/// position, so the winner is always unique.
#[derive(Debug)]
pub struct OverrideResolver<'a, I: RecordIndex + ?Sized> {
    index: &'a I,
}

impl<'a, I: RecordIndex + ?Sized> OverrideResolver<'a, I> {
    /// Create a resolver over `index`.
    pub fn new(index: &'a I) -> Self {
        Self { index }
    }

    /// The load order being resolved against.
    pub fn load_order(&self) -> &LoadOrder {
        self.index.load_order()
    }

    /// The definition from the highest-priority plugin defining `id`.
    ///
    /// Fails with [`IndexError::NotFound`] if nothing defines it.
    pub fn winning_definition(&self, id: &RecordId) -> Result<FileDefinition, IndexError> {
        self.index.winning_definition(id)
    }

    /// Every plugin's definition of `id`, unordered.
    pub fn all_definitions(&self, id: &RecordId) -> Result<Vec<FileDefinition>, IndexError> {
        self.index.all_definitions(id)
    }

    /// Record ids defined by `plugin`.
    pub fn local_records(&self, plugin: &ModKey) -> Result<Vec<RecordId>, IndexError> {
        self.index.local_records(plugin)
    }

    /// The winning definition, if it comes from `plugin`.
    ///
    /// Returns `Ok(None)` when a different plugin wins.
    pub fn winner_from(
        &self,
        plugin: &ModKey,
        id: &RecordId,
    ) -> Result<Option<FileDefinition>, IndexError> {
        let winner = self.winning_definition(id)?;
        Ok(winner.is_from(plugin).then_some(winner))
    }
}
