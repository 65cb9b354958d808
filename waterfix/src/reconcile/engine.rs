//! The reconciliation pass.

use tracing::{debug, info, warn};

use crate::index::{IndexError, RecordIndex};
use crate::patch::PatchLayer;
use crate::record::{FileDefinition, ModKey, RecordId};
use crate::resolver::OverrideResolver;
use crate::sources::SourcePolicy;
use crate::truth::TruthSelector;

use super::error::ReconcileError;
use super::report::{PatchEntry, ReconcileReport};

/// What happened to one record id during the scan.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordStatus {
    /// A higher-priority plugin wins; that plugin owns the check.
    NotWinner,

    /// The winner is a trusted source.
    TrustedWinner,

    /// No authority defines the record.
    NoTruth,

    /// The winner already carries the truth value.
    Agrees,

    /// The winner disagreed and an override was written.
    Patched(PatchEntry),
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct ReconcileOutcome {
    /// The output layer, already decompressed.
    pub layer: PatchLayer,

    /// What the run did.
    pub report: ReconcileReport,
}

/// Drives reconciliation of the water field across a load order.
///
/// Plugins are visited lowest priority first. Each plugin's records are
/// checked only where that plugin is the winner, so every record id is
/// reconciled exactly once, by the plugin whose definition is in effect.
///
/// Faults are isolated: a plugin whose records cannot be enumerated is
/// skipped as a whole; a record that cannot be resolved is skipped alone.
#[derive(Debug)]
pub struct Reconciler<'a, I: RecordIndex + ?Sized> {
    resolver: OverrideResolver<'a, I>,
    policy: &'a SourcePolicy,
}

impl<'a, I: RecordIndex + ?Sized> Reconciler<'a, I> {
    /// Create a reconciler over `index` with the given trust tables.
    pub fn new(index: &'a I, policy: &'a SourcePolicy) -> Self {
        Self {
            resolver: OverrideResolver::new(index),
            policy,
        }
    }

    /// Run the full pass, producing the output layer `output`.
    ///
    /// Fails only if no authority plugin is loaded or the output would be a
    /// trusted plugin.
    pub fn run(&self, output: impl Into<ModKey>) -> Result<ReconcileOutcome, ReconcileError> {
        let output = output.into();
        self.check_preconditions(&output)?;

        let load_order = self.resolver.load_order();
        info!(
            plugins = load_order.len(),
            output = %output,
            "Starting water reconciliation"
        );

        let mut layer = PatchLayer::new(output.clone());
        let mut report = ReconcileReport::new(output);

        for plugin in load_order.iter() {
            if self.policy.is_trusted(plugin) {
                continue;
            }
            self.reconcile_plugin(plugin, &mut layer, &mut report);
        }

        report.decompressed = layer.decompress();
        report.finish();

        info!(
            patched = report.total_patched(),
            decompressed = report.decompressed,
            skipped_files = report.skipped_files.len(),
            skipped_records = report.skipped_records,
            "{}",
            report.outcome()
        );

        Ok(ReconcileOutcome { layer, report })
    }

    fn check_preconditions(&self, output: &ModKey) -> Result<(), ReconcileError> {
        let load_order = self.resolver.load_order();
        let authorities = &self.policy.authorities;

        if !authorities
            .in_precedence()
            .iter()
            .any(|a| load_order.contains(a))
        {
            let err = ReconcileError::MissingAuthority {
                community_patch: authorities.community_patch().to_string(),
                official_update: authorities.official_update().to_string(),
            };
            tracing::error!(error = %err, "Cannot reconcile");
            return Err(err);
        }

        if self.policy.is_trusted(output) {
            return Err(ReconcileError::TrustedOutput(output.to_string()));
        }

        Ok(())
    }

    /// Scan every record `plugin` defines.
    fn reconcile_plugin(
        &self,
        plugin: &ModKey,
        layer: &mut PatchLayer,
        report: &mut ReconcileReport,
    ) {
        let ids = match self.resolver.local_records(plugin) {
            Ok(ids) => ids,
            Err(e) => {
                warn!(plugin = %plugin, error = %e, "Skipping plugin");
                report.skip_file(plugin.clone(), e.to_string());
                return;
            }
        };

        report.plugins_scanned += 1;
        let mut patched = 0usize;

        for id in &ids {
            match self.reconcile_record(plugin, id, layer) {
                Ok(RecordStatus::Patched(entry)) => {
                    report.records_examined += 1;
                    patched += 1;
                    report.record_patch(entry);
                }
                Ok(RecordStatus::NotWinner) => {}
                Ok(_) => report.records_examined += 1,
                Err(e) => {
                    warn!(plugin = %plugin, record = %id, error = %e, "Skipping record");
                    report.skipped_records += 1;
                }
            }
        }

        debug!(
            plugin = %plugin,
            records = ids.len(),
            patched,
            "Plugin scanned"
        );
    }

    /// Reconcile one record id on behalf of `plugin`.
    pub fn reconcile_record(
        &self,
        plugin: &ModKey,
        id: &RecordId,
        layer: &mut PatchLayer,
    ) -> Result<RecordStatus, IndexError> {
        let Some(winner) = self.resolver.winner_from(plugin, id)? else {
            return Ok(RecordStatus::NotWinner);
        };

        if self.policy.is_trusted(&winner.origin) {
            return Ok(RecordStatus::TrustedWinner);
        }

        let selector = TruthSelector::new(&self.resolver, &self.policy.authorities);
        let Some(truth) = selector.select_truth(id) else {
            return Ok(RecordStatus::NoTruth);
        };

        if truth.record.water_agrees_with(&winner.record) {
            return Ok(RecordStatus::Agrees);
        }

        Ok(RecordStatus::Patched(apply_patch(layer, &winner, &truth)))
    }
}

/// Write truth's water value into the output override for the winner.
fn apply_patch(layer: &mut PatchLayer, winner: &FileDefinition, truth: &FileDefinition) -> PatchEntry {
    let target = layer.get_or_add(&winner.record);
    target.water = truth.record.water.clone();

    let entry = PatchEntry {
        record: winner.record.id.clone(),
        plugin: winner.origin.clone(),
        from: winner.record.water.clone(),
        to: truth.record.water.clone(),
    };

    debug!(
        record = %entry.record,
        plugin = %entry.plugin,
        truth = %truth.origin,
        from = ?entry.from.as_ref().map(ToString::to_string),
        to = ?entry.to.as_ref().map(ToString::to_string),
        "Patched water"
    );

    entry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{MemoryRecordIndex, PluginFile};
    use crate::load_order::LoadOrder;
    use crate::record::{CellRecord, RecordFlags};
    use crate::sources::{UPDATE_ESM, USSEP_ESP};

    const CELL: &str = "000D74:Skyrim.esm";
    const W1: &str = "000018:Skyrim.esm";
    const W2: &str = "000019:Skyrim.esm";

    fn id(text: &str) -> RecordId {
        text.parse().unwrap()
    }

    fn cell(water: Option<&str>) -> CellRecord {
        CellRecord::new(id(CELL)).with_water(water.map(id))
    }

    fn plugin(name: &str, water: Option<&str>) -> PluginFile {
        PluginFile::new(name).with_record(&cell(water))
    }

    fn index(plugins: Vec<PluginFile>) -> MemoryRecordIndex {
        let order = LoadOrder::new(plugins.iter().map(|p| p.name.clone())).unwrap();
        MemoryRecordIndex::from_plugins(order, plugins).unwrap()
    }

    fn run(index: &MemoryRecordIndex) -> ReconcileOutcome {
        let policy = SourcePolicy::default();
        Reconciler::new(index, &policy).run("WaterFix.esp").unwrap()
    }

    #[test]
    fn test_ussep_truth_patches_mod_winner() {
        let index = index(vec![
            plugin("Skyrim.esm", None),
            plugin(UPDATE_ESM, Some(W1)),
            plugin(USSEP_ESP, Some(W1)),
            plugin("ModA.esp", Some(W2)),
        ]);

        let outcome = run(&index);
        assert_eq!(outcome.report.total_patched(), 1);
        assert_eq!(outcome.report.patched_for(&ModKey::from("ModA.esp")), 1);
        assert_eq!(outcome.layer.get(&id(CELL)).unwrap().water, Some(id(W1)));
    }

    #[test]
    fn test_clears_water_when_truth_is_empty() {
        let index = index(vec![
            plugin("Skyrim.esm", Some(W2)),
            plugin(UPDATE_ESM, None),
            plugin("ModA.esp", Some(W2)),
        ]);

        let outcome = run(&index);
        assert_eq!(outcome.report.total_patched(), 1);
        assert_eq!(outcome.layer.get(&id(CELL)).unwrap().water, None);
        assert_eq!(outcome.report.patches[0].from, Some(id(W2)));
        assert_eq!(outcome.report.patches[0].to, None);
    }

    #[test]
    fn test_only_winner_is_checked() {
        // ModA disagrees but ModB wins and agrees.
        let index = index(vec![
            plugin("Skyrim.esm", None),
            plugin(UPDATE_ESM, Some(W1)),
            plugin("ModA.esp", Some(W2)),
            plugin("ModB.esp", Some(W1)),
        ]);

        let outcome = run(&index);
        assert_eq!(outcome.report.total_patched(), 0);
        assert_eq!(outcome.report.records_examined, 1);
        assert!(outcome.layer.is_empty());
    }

    #[test]
    fn test_record_status_transitions() {
        let index = index(vec![
            plugin("Skyrim.esm", None),
            plugin(UPDATE_ESM, Some(W1)),
            plugin("ModA.esp", Some(W2)),
            plugin("ModB.esp", Some(W2)),
        ]);
        let policy = SourcePolicy::default();
        let reconciler = Reconciler::new(&index, &policy);
        let mut layer = PatchLayer::new("WaterFix.esp");

        let status = reconciler
            .reconcile_record(&ModKey::from("ModA.esp"), &id(CELL), &mut layer)
            .unwrap();
        assert_eq!(status, RecordStatus::NotWinner);

        let status = reconciler
            .reconcile_record(&ModKey::from("ModB.esp"), &id(CELL), &mut layer)
            .unwrap();
        assert!(matches!(status, RecordStatus::Patched(ref e) if e.plugin.matches("ModB.esp")));
    }

    #[test]
    fn test_no_truth_leaves_record_alone() {
        let index = index(vec![
            plugin("Skyrim.esm", None),
            PluginFile::new(UPDATE_ESM),
            PluginFile::new("ModA.esp").with_record(
                &CellRecord::new(id("000800:ModA.esp")).with_water(Some(id(W2))),
            ),
        ]);

        let outcome = run(&index);
        assert_eq!(outcome.report.total_patched(), 0);
        assert_eq!(outcome.report.records_examined, 1);
    }

    #[test]
    fn test_missing_authority_is_fatal() {
        let index = index(vec![plugin("Skyrim.esm", None), plugin("ModA.esp", Some(W2))]);
        let policy = SourcePolicy::default();
        let result = Reconciler::new(&index, &policy).run("WaterFix.esp");
        assert!(matches!(result, Err(ReconcileError::MissingAuthority { .. })));
    }

    #[test]
    fn test_trusted_output_rejected() {
        let index = index(vec![plugin("Skyrim.esm", None), plugin(UPDATE_ESM, None)]);
        let policy = SourcePolicy::default();
        let result = Reconciler::new(&index, &policy).run(USSEP_ESP);
        assert!(matches!(result, Err(ReconcileError::TrustedOutput(_))));
    }

    #[test]
    fn test_report_stamped_after_scan() {
        let index = index(vec![
            plugin("Skyrim.esm", None),
            plugin(UPDATE_ESM, Some(W1)),
            plugin("ModA.esp", Some(W2)),
        ]);
        let policy = SourcePolicy::default();
        let reconciler = Reconciler::new(&index, &policy);

        let started = chrono::Utc::now();
        let outcome = reconciler.run("WaterFix.esp").unwrap();
        let finished = chrono::Utc::now();

        assert!(outcome.report.generated_at >= started);
        assert!(outcome.report.generated_at <= finished);
    }

    #[test]
    fn test_patched_record_is_decompressed() {
        let compressed = cell(Some(W2)).with_flags(RecordFlags::from_bits(RecordFlags::COMPRESSED));
        let index = index(vec![
            plugin("Skyrim.esm", None),
            plugin(UPDATE_ESM, Some(W1)),
            PluginFile::new("ModA.esp").with_record(&compressed),
        ]);

        let outcome = run(&index);
        assert_eq!(outcome.report.decompressed, 1);
        assert!(!outcome.layer.get(&id(CELL)).unwrap().flags.is_compressed());
    }

    #[test]
    fn test_corrupt_record_skipped_alone() {
        use crate::index::RawRecord;

        let corrupt = RawRecord {
            id: "000D75:Skyrim.esm".to_string(),
            editor_id: None,
            water: Some("broken".to_string()),
            flags: 0,
            data: Default::default(),
        };
        let index = index(vec![
            plugin("Skyrim.esm", None),
            plugin(UPDATE_ESM, Some(W1)),
            plugin("ModA.esp", Some(W2)).with_raw_record(corrupt),
        ]);

        let outcome = run(&index);
        assert_eq!(outcome.report.skipped_records, 1);
        assert!(outcome.report.skipped_files.is_empty());
        assert_eq!(outcome.report.total_patched(), 1);
    }
}
