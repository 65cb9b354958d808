//! Truth selection from the authority plugins.

use tracing::warn;

use crate::index::RecordIndex;
use crate::record::{FileDefinition, RecordId};
use crate::resolver::OverrideResolver;
use crate::sources::AuthoritySources;

/// Picks the authoritative definition of a record.
///
/// The community patch is preferred whenever it defines the record; the
/// official update is the fallback. Load order position and the number of
/// other plugins defining the record play no part.
#[derive(Debug)]
pub struct TruthSelector<'r, 'a, I: RecordIndex + ?Sized> {
    resolver: &'r OverrideResolver<'a, I>,
    authorities: &'r AuthoritySources,
}

impl<'r, 'a, I: RecordIndex + ?Sized> TruthSelector<'r, 'a, I> {
    /// Create a selector.
    pub fn new(resolver: &'r OverrideResolver<'a, I>, authorities: &'r AuthoritySources) -> Self {
        Self {
            resolver,
            authorities,
        }
    }

    /// The authoritative definition of `id`, if any authority defines it.
    ///
    /// A record whose definitions cannot be enumerated has no truth.
    pub fn select_truth(&self, id: &RecordId) -> Option<FileDefinition> {
        let definitions = match self.resolver.all_definitions(id) {
            Ok(definitions) => definitions,
            Err(e) => {
                warn!(record = %id, error = %e, "Cannot enumerate definitions, no truth");
                return None;
            }
        };

        pick_authority(definitions, self.authorities)
    }
}

/// Choose the highest-ranked authority's definition from `definitions`.
pub fn pick_authority(
    definitions: Vec<FileDefinition>,
    authorities: &AuthoritySources,
) -> Option<FileDefinition> {
    let mut fallback = None;
    for definition in definitions {
        if definition.is_from(authorities.community_patch()) {
            return Some(definition);
        }
        if fallback.is_none() && definition.is_from(authorities.official_update()) {
            fallback = Some(definition);
        }
    }
    fallback
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{MemoryRecordIndex, PluginFile, RawRecord};
    use crate::load_order::LoadOrder;
    use crate::record::CellRecord;
    use crate::sources::{UPDATE_ESM, USSEP_ESP};

    fn id(text: &str) -> RecordId {
        text.parse().unwrap()
    }

    fn cell_with(water: &str) -> CellRecord {
        CellRecord::new(id("000D74:Skyrim.esm")).with_water(Some(id(water)))
    }

    #[test]
    fn test_community_patch_preferred_even_when_loaded_first() {
        let authorities = AuthoritySources::default();
        let defs = vec![
            FileDefinition::new(UPDATE_ESM, 5, cell_with("000018:Skyrim.esm")),
            FileDefinition::new(USSEP_ESP, 1, cell_with("000019:Skyrim.esm")),
        ];

        let truth = pick_authority(defs, &authorities).unwrap();
        assert!(truth.origin.matches(USSEP_ESP));
        assert_eq!(truth.record.water, Some(id("000019:Skyrim.esm")));
    }

    #[test]
    fn test_official_update_fallback() {
        let authorities = AuthoritySources::default();
        let defs = vec![
            FileDefinition::new("Skyrim.esm", 0, cell_with("000017:Skyrim.esm")),
            FileDefinition::new("update.ESM", 1, cell_with("000018:Skyrim.esm")),
            FileDefinition::new("ModA.esp", 2, cell_with("000019:Skyrim.esm")),
        ];

        let truth = pick_authority(defs, &authorities).unwrap();
        assert!(truth.origin.matches(UPDATE_ESM));
    }

    #[test]
    fn test_no_authority_means_no_truth() {
        let authorities = AuthoritySources::default();
        let defs = vec![
            FileDefinition::new("Skyrim.esm", 0, cell_with("000017:Skyrim.esm")),
            FileDefinition::new("ModA.esp", 2, cell_with("000019:Skyrim.esm")),
        ];
        assert!(pick_authority(defs, &authorities).is_none());
    }

    #[test]
    fn test_corrupt_definitions_yield_no_truth() {
        let order = LoadOrder::new(["Skyrim.esm", UPDATE_ESM, "ModA.esp"]).unwrap();
        let corrupt = RawRecord {
            id: "000D74:Skyrim.esm".to_string(),
            editor_id: None,
            water: Some("bad".to_string()),
            flags: 0,
            data: Default::default(),
        };
        let index = MemoryRecordIndex::from_plugins(
            order,
            vec![
                PluginFile::new("Skyrim.esm").with_record(&cell_with("000017:Skyrim.esm")),
                PluginFile::new(UPDATE_ESM).with_record(&cell_with("000018:Skyrim.esm")),
                PluginFile::new("ModA.esp").with_raw_record(corrupt),
            ],
        )
        .unwrap();

        let resolver = OverrideResolver::new(&index);
        let authorities = AuthoritySources::default();
        let selector = TruthSelector::new(&resolver, &authorities);
        assert!(selector.select_truth(&id("000D74:Skyrim.esm")).is_none());
    }

    #[test]
    fn test_select_truth_through_index() {
        let order = LoadOrder::new(["Skyrim.esm", UPDATE_ESM, USSEP_ESP, "ModA.esp"]).unwrap();
        let index = MemoryRecordIndex::from_plugins(
            order,
            vec![
                PluginFile::new("Skyrim.esm").with_record(&cell_with("000017:Skyrim.esm")),
                PluginFile::new(UPDATE_ESM).with_record(&cell_with("000018:Skyrim.esm")),
                PluginFile::new(USSEP_ESP).with_record(&cell_with("000019:Skyrim.esm")),
                PluginFile::new("ModA.esp").with_record(&cell_with("000020:Skyrim.esm")),
            ],
        )
        .unwrap();

        let resolver = OverrideResolver::new(&index);
        let authorities = AuthoritySources::default();
        let truth = TruthSelector::new(&resolver, &authorities)
            .select_truth(&id("000D74:Skyrim.esm"))
            .unwrap();
        assert_eq!(truth.record.water, Some(id("000019:Skyrim.esm")));
    }
}
