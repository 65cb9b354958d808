//! The output override layer.

use std::collections::{BTreeMap, BTreeSet};

use crate::index::{PluginFile, RawRecord};
use crate::load_order::LoadOrder;
use crate::record::{CellRecord, ModKey, RecordFlags, RecordId};

/// Author recorded in every plugin rendered from a [`PatchLayer`].
pub const OUTPUT_AUTHOR: &str = "WaterFix";

/// New and modified definitions produced by one reconciliation run.
///
/// Each record id has at most one override. The first write copies the
/// winning record; later writes to the same id reuse that copy.
#[derive(Debug, Clone)]
pub struct PatchLayer {
    name: ModKey,
    overrides: BTreeMap<RecordId, CellRecord>,
}

impl PatchLayer {
    /// Create an empty layer for the output plugin `name`.
    pub fn new(name: impl Into<ModKey>) -> Self {
        Self {
            name: name.into(),
            overrides: BTreeMap::new(),
        }
    }

    /// Name of the output plugin.
    pub fn name(&self) -> &ModKey {
        &self.name
    }

    /// The override for `winner.id`, copied from `winner` on first access.
    pub fn get_or_add(&mut self, winner: &CellRecord) -> &mut CellRecord {
        self.overrides
            .entry(winner.id.clone())
            .or_insert_with(|| winner.clone())
    }

    /// The override for `id`, if one exists.
    pub fn get(&self, id: &RecordId) -> Option<&CellRecord> {
        self.overrides.get(id)
    }

    /// Whether `id` has been overridden.
    pub fn contains(&self, id: &RecordId) -> bool {
        self.overrides.contains_key(id)
    }

    /// Number of overridden records.
    pub fn len(&self) -> usize {
        self.overrides.len()
    }

    /// Whether the layer has no overrides.
    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }

    /// Iterate overrides ordered by record id.
    pub fn iter(&self) -> impl Iterator<Item = &CellRecord> {
        self.overrides.values()
    }

    /// Clear the compressed-storage flag on every record in the layer.
    ///
    /// Returns the number of records that had the flag set.
    pub fn decompress(&mut self) -> usize {
        self.overrides
            .values_mut()
            .map(|record| record.flags.remove(RecordFlags::COMPRESSED))
            .filter(|&cleared| cleared)
            .count()
    }

    /// Plugins this layer depends on, in load order.
    ///
    /// A plugin is a master if it introduced an overridden record or a water
    /// type the layer references. Plugins missing from `load_order` are
    /// appended after the ones it contains, sorted by name.
    pub fn masters(&self, load_order: &LoadOrder) -> Vec<ModKey> {
        let mut required: BTreeSet<&ModKey> = BTreeSet::new();
        for record in self.overrides.values() {
            required.insert(record.id.origin());
            if let Some(water) = &record.water {
                required.insert(water.origin());
            }
        }
        required.remove(&self.name);

        let mut masters: Vec<ModKey> = load_order
            .iter()
            .filter(|p| required.contains(p))
            .cloned()
            .collect();
        masters.extend(
            required
                .into_iter()
                .filter(|p| !load_order.contains(p))
                .cloned(),
        );
        masters
    }

    /// Render the layer as a plugin document.
    pub fn to_plugin_file(&self, load_order: &LoadOrder) -> PluginFile {
        PluginFile {
            name: self.name.clone(),
            author: Some(OUTPUT_AUTHOR.to_string()),
            masters: self.masters(load_order),
            records: self.overrides.values().map(RawRecord::encode).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(text: &str) -> RecordId {
        text.parse().unwrap()
    }

    #[test]
    fn test_get_or_add_copies_once() {
        let mut layer = PatchLayer::new("WaterFix.esp");
        let winner = CellRecord::new(id("000D74:Skyrim.esm"))
            .with_editor_id("Riverwood")
            .with_water(Some(id("000019:Skyrim.esm")));

        layer.get_or_add(&winner).water = Some(id("000018:Skyrim.esm"));
        // Second access reuses the existing override.
        let again = layer.get_or_add(&winner);
        assert_eq!(again.water, Some(id("000018:Skyrim.esm")));
        assert_eq!(again.editor_id.as_deref(), Some("Riverwood"));
        assert_eq!(layer.len(), 1);
    }

    #[test]
    fn test_decompress_counts_only_compressed() {
        let mut layer = PatchLayer::new("WaterFix.esp");
        let compressed = CellRecord::new(id("000D74:Skyrim.esm"))
            .with_flags(RecordFlags::from_bits(RecordFlags::COMPRESSED | 0x400));
        let plain = CellRecord::new(id("000D75:Skyrim.esm"));
        layer.get_or_add(&compressed);
        layer.get_or_add(&plain);

        assert_eq!(layer.decompress(), 1);
        assert!(layer.iter().all(|r| !r.flags.is_compressed()));
        assert_eq!(
            layer.get(&id("000D74:Skyrim.esm")).unwrap().flags.bits(),
            0x400
        );
        assert_eq!(layer.decompress(), 0);
    }

    #[test]
    fn test_masters_in_load_order() {
        let order = LoadOrder::new([
            "Skyrim.esm",
            "Update.esm",
            "Dawnguard.esm",
            "ModA.esp",
        ])
        .unwrap();
        let mut layer = PatchLayer::new("WaterFix.esp");
        layer.get_or_add(
            &CellRecord::new(id("000800:ModA.esp")).with_water(Some(id("000018:Skyrim.esm"))),
        );
        layer.get_or_add(
            &CellRecord::new(id("000D74:Dawnguard.esm")).with_water(Some(id("000900:Extra.esp"))),
        );

        let masters = layer.masters(&order);
        let names: Vec<&str> = masters.iter().map(|m| m.as_str()).collect();
        assert_eq!(names, vec!["Skyrim.esm", "Dawnguard.esm", "ModA.esp", "Extra.esp"]);
    }

    #[test]
    fn test_to_plugin_file() {
        let order = LoadOrder::new(["Skyrim.esm"]).unwrap();
        let mut layer = PatchLayer::new("WaterFix.esp");
        layer.get_or_add(&CellRecord::new(id("000D74:Skyrim.esm")));

        let plugin = layer.to_plugin_file(&order);
        assert!(plugin.name.matches("WaterFix.esp"));
        assert_eq!(plugin.author.as_deref(), Some(OUTPUT_AUTHOR));
        assert_eq!(plugin.masters, vec![ModKey::from("Skyrim.esm")]);
        assert_eq!(plugin.records.len(), 1);
        assert_eq!(plugin.records[0].id, "000D74:Skyrim.esm");
    }
}
