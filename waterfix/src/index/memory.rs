//! In-memory record index built from plugin dumps.
//!
//! Every plugin in the load order contributes its definitions. For each record
//! id the index keeps all definitions sorted by load order priority, so the
//! winner is always the last entry.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::load_order::LoadOrder;
use crate::record::{FileDefinition, ModKey, RecordId};

use super::error::{IndexError, PluginError};
use super::plugin::{PluginDirectory, PluginFile, RawRecord};
use super::traits::RecordIndex;

/// Load state of one plugin in the index.
#[derive(Debug, Clone)]
enum PluginSlot {
    /// Records defined by the plugin, in file order.
    Loaded(Vec<RecordId>),

    /// The plugin could not be read; enumeration reports this reason.
    Failed(String),
}

/// A definition as stored in the index, decoded on demand.
#[derive(Debug, Clone)]
struct StoredDefinition {
    priority: usize,
    origin: ModKey,
    raw: RawRecord,
}

impl StoredDefinition {
    fn decode(&self, id: &RecordId) -> Result<FileDefinition, IndexError> {
        let record = self.raw.decode().map_err(|e| IndexError::Corrupt {
            id: id.clone(),
            plugin: self.origin.clone(),
            reason: e.to_string(),
        })?;
        Ok(FileDefinition::new(self.origin.clone(), self.priority, record))
    }
}

/// Record index held entirely in memory.
///
/// # Example
///
/// ```
/// use waterfix::index::{MemoryRecordIndex, PluginFile, RecordIndex};
/// use waterfix::load_order::LoadOrder;
/// use waterfix::record::{CellRecord, RecordId};
///
/// let cell: RecordId = "000D74:Skyrim.esm".parse().unwrap();
/// let order = LoadOrder::new(["Skyrim.esm", "ModA.esp"]).unwrap();
///
/// let mut index = MemoryRecordIndex::new(order);
/// index.add_plugin(PluginFile::new("Skyrim.esm").with_record(&CellRecord::new(cell.clone()))).unwrap();
/// index.add_plugin(PluginFile::new("ModA.esp").with_record(&CellRecord::new(cell.clone()))).unwrap();
///
/// let winner = index.winning_definition(&cell).unwrap();
/// assert!(winner.origin.matches("ModA.esp"));
/// ```
#[derive(Debug, Clone)]
pub struct MemoryRecordIndex {
    load_order: LoadOrder,

    /// Plugins added so far, keyed by name.
    plugins: HashMap<ModKey, PluginSlot>,

    /// All definitions per record id, ascending priority.
    definitions: HashMap<RecordId, Vec<StoredDefinition>>,
}

impl MemoryRecordIndex {
    /// Create an empty index for `load_order`.
    pub fn new(load_order: LoadOrder) -> Self {
        Self {
            load_order,
            plugins: HashMap::new(),
            definitions: HashMap::new(),
        }
    }

    /// Build an index from already-read plugin documents.
    ///
    /// Plugins not in the load order are rejected. Plugins in the load order
    /// without a document are recorded as failed.
    pub fn from_plugins(
        load_order: LoadOrder,
        plugins: impl IntoIterator<Item = PluginFile>,
    ) -> Result<Self, IndexError> {
        let mut index = Self::new(load_order);
        for plugin in plugins {
            index.add_plugin(plugin)?;
        }
        index.mark_missing();
        Ok(index)
    }

    /// Read every plugin of `load_order` from `directory`.
    ///
    /// A plugin that cannot be read or decoded does not abort the build: it
    /// is recorded as failed and reported when its records are enumerated.
    pub fn load(directory: &PluginDirectory, load_order: LoadOrder) -> Self {
        let mut index = Self::new(load_order.clone());

        for plugin in load_order.iter() {
            let added = directory
                .read(plugin)
                .map_err(|e| e.to_string())
                .and_then(|file| index.add_plugin(file).map_err(|e| e.to_string()));

            if let Err(reason) = added {
                warn!(plugin = %plugin, error = %reason, "Failed to load plugin");
                index.add_failed_plugin(plugin.clone(), reason);
            }
        }

        debug!(
            plugins = index.plugin_count(),
            records = index.record_count(),
            "Record index built"
        );
        index
    }

    /// Add a plugin's records to the index.
    ///
    /// If any record id in the plugin is malformed, the plugin is recorded as
    /// failed instead (its record set is unknown) and `Ok` is returned.
    pub fn add_plugin(&mut self, plugin: PluginFile) -> Result<(), IndexError> {
        let priority = self
            .load_order
            .position(&plugin.name)
            .ok_or_else(|| IndexError::UnknownPlugin(plugin.name.clone()))?;

        let ids: Result<Vec<RecordId>, _> =
            plugin.records.iter().map(RawRecord::record_id).collect();
        let ids = match ids {
            Ok(ids) => ids,
            Err(source) => {
                let reason = PluginError::RecordId {
                    plugin: plugin.name.clone(),
                    source,
                };
                self.add_failed_plugin(plugin.name, reason.to_string());
                return Ok(());
            }
        };

        self.remove_plugin(&plugin.name);

        let mut local = Vec::with_capacity(ids.len());
        for (id, raw) in ids.into_iter().zip(plugin.records) {
            let entries = self.definitions.entry(id.clone()).or_default();
            // A repeated id within one plugin replaces the earlier record.
            match entries.iter_mut().find(|e| e.origin == plugin.name) {
                Some(existing) => existing.raw = raw,
                None => {
                    entries.push(StoredDefinition {
                        priority,
                        origin: plugin.name.clone(),
                        raw,
                    });
                    entries.sort_by_key(|e| e.priority);
                    local.push(id);
                }
            }
        }

        self.plugins.insert(plugin.name, PluginSlot::Loaded(local));
        Ok(())
    }

    /// Record a plugin whose records cannot be enumerated.
    pub fn add_failed_plugin(&mut self, plugin: impl Into<ModKey>, reason: impl Into<String>) {
        let plugin = plugin.into();
        self.remove_plugin(&plugin);
        self.plugins.insert(plugin, PluginSlot::Failed(reason.into()));
    }

    /// Number of plugins added (loaded or failed).
    pub fn plugin_count(&self) -> usize {
        self.plugins.len()
    }

    /// Number of distinct record ids.
    pub fn record_count(&self) -> usize {
        self.definitions.len()
    }

    /// Whether any plugin defines `id`.
    pub fn contains(&self, id: &RecordId) -> bool {
        self.definitions.contains_key(id)
    }

    /// Mark load order entries that were never added as failed.
    fn mark_missing(&mut self) {
        let missing: Vec<ModKey> = self
            .load_order
            .iter()
            .filter(|p| !self.plugins.contains_key(*p))
            .cloned()
            .collect();
        for plugin in missing {
            self.add_failed_plugin(plugin, "plugin not found");
        }
    }

    /// Drop every definition contributed by `plugin`.
    fn remove_plugin(&mut self, plugin: &ModKey) {
        if let Some(PluginSlot::Loaded(ids)) = self.plugins.remove(plugin) {
            for id in ids {
                if let Some(entries) = self.definitions.get_mut(&id) {
                    entries.retain(|e| &e.origin != plugin);
                    if entries.is_empty() {
                        self.definitions.remove(&id);
                    }
                }
            }
        }
    }
}

impl RecordIndex for MemoryRecordIndex {
    fn load_order(&self) -> &LoadOrder {
        &self.load_order
    }

    fn local_records(&self, plugin: &ModKey) -> Result<Vec<RecordId>, IndexError> {
        match self.plugins.get(plugin) {
            Some(PluginSlot::Loaded(ids)) => Ok(ids.clone()),
            Some(PluginSlot::Failed(reason)) => Err(IndexError::Enumeration {
                plugin: plugin.clone(),
                reason: reason.clone(),
            }),
            None if self.load_order.contains(plugin) => Err(IndexError::Enumeration {
                plugin: plugin.clone(),
                reason: "plugin not loaded".to_string(),
            }),
            None => Err(IndexError::UnknownPlugin(plugin.clone())),
        }
    }

    fn all_definitions(&self, id: &RecordId) -> Result<Vec<FileDefinition>, IndexError> {
        let entries = self
            .definitions
            .get(id)
            .ok_or_else(|| IndexError::NotFound(id.clone()))?;
        entries.iter().map(|e| e.decode(id)).collect()
    }

    fn winning_definition(&self, id: &RecordId) -> Result<FileDefinition, IndexError> {
        self.definitions
            .get(id)
            .and_then(|entries| entries.last())
            .ok_or_else(|| IndexError::NotFound(id.clone()))?
            .decode(id)
    }
}
