//! Reconciliation report.
//!
//! Plain data describing what a run did. Rendering for humans lives in
//! [`ReconcileReport::to_text`]; machines get [`ReconcileReport::to_json`].

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::record::{ModKey, RecordId};

/// Terminal state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Every winning record already matched its truth value.
    NoPatchesNeeded,

    /// At least one record was patched.
    PatchesApplied,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::NoPatchesNeeded => write!(f, "No patches needed"),
            Outcome::PatchesApplied => write!(f, "Patches applied"),
        }
    }
}

/// One corrected record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchEntry {
    /// The patched record.
    pub record: RecordId,

    /// Plugin whose winning definition was corrected.
    pub plugin: ModKey,

    /// Water value in the winning definition.
    pub from: Option<RecordId>,

    /// Water value written to the output layer.
    pub to: Option<RecordId>,
}

/// Patch count for one plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginPatchCount {
    /// The plugin.
    pub plugin: ModKey,

    /// Number of its winning records that were patched.
    pub patched: usize,
}

/// A plugin skipped because its records could not be enumerated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    /// The plugin.
    pub plugin: ModKey,

    /// Why it was skipped.
    pub reason: String,
}

/// Everything a reconciliation run produced, apart from the layer itself.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileReport {
    /// When the run finished.
    pub generated_at: DateTime<Utc>,

    /// Name of the output plugin.
    pub output_plugin: ModKey,

    /// Plugins whose records were scanned (trusted plugins excluded).
    pub plugins_scanned: usize,

    /// Records for which the scanning plugin was the winner.
    pub records_examined: usize,

    /// Patch counts per plugin, in load order. Plugins with no patches are
    /// omitted.
    pub patched_by_plugin: Vec<PluginPatchCount>,

    /// Every patch emitted, in scan order.
    pub patches: Vec<PatchEntry>,

    /// Records in the output layer whose compression flag was cleared.
    pub decompressed: usize,

    /// Plugins skipped due to errors.
    pub skipped_files: Vec<SkippedFile>,

    /// Records skipped because they could not be resolved.
    pub skipped_records: usize,
}

/// JSON view adding the derived fields.
#[derive(Serialize)]
struct ReportJson<'a> {
    outcome: Outcome,
    total_patched: usize,
    #[serde(flatten)]
    report: &'a ReconcileReport,
}

impl ReconcileReport {
    /// Create an empty report for `output_plugin`.
    pub fn new(output_plugin: impl Into<ModKey>) -> Self {
        Self {
            generated_at: Utc::now(),
            output_plugin: output_plugin.into(),
            plugins_scanned: 0,
            records_examined: 0,
            patched_by_plugin: Vec::new(),
            patches: Vec::new(),
            decompressed: 0,
            skipped_files: Vec::new(),
            skipped_records: 0,
        }
    }

    /// Record a patch against its plugin.
    pub fn record_patch(&mut self, entry: PatchEntry) {
        match self
            .patched_by_plugin
            .iter_mut()
            .find(|count| count.plugin == entry.plugin)
        {
            Some(count) => count.patched += 1,
            None => self.patched_by_plugin.push(PluginPatchCount {
                plugin: entry.plugin.clone(),
                patched: 1,
            }),
        }
        self.patches.push(entry);
    }

    /// Stamp the report as complete at the current time.
    pub fn finish(&mut self) {
        self.generated_at = Utc::now();
    }

    /// Record a plugin skipped due to an error.
    pub fn skip_file(&mut self, plugin: ModKey, reason: impl Into<String>) {
        self.skipped_files.push(SkippedFile {
            plugin,
            reason: reason.into(),
        });
    }

    /// Total records patched.
    pub fn total_patched(&self) -> usize {
        self.patches.len()
    }

    /// Patches attributed to `plugin`.
    pub fn patched_for(&self, plugin: &ModKey) -> usize {
        self.patched_by_plugin
            .iter()
            .find(|count| &count.plugin == plugin)
            .map_or(0, |count| count.patched)
    }

    /// Whether any plugin or record was skipped due to an error.
    pub fn has_errors(&self) -> bool {
        !self.skipped_files.is_empty() || self.skipped_records > 0
    }

    /// Terminal state of the run.
    pub fn outcome(&self) -> Outcome {
        if self.patches.is_empty() {
            Outcome::NoPatchesNeeded
        } else {
            Outcome::PatchesApplied
        }
    }

    /// Names of skipped plugins.
    pub fn skipped_file_names(&self) -> Vec<&str> {
        self.skipped_files.iter().map(|s| s.plugin.as_str()).collect()
    }

    /// Render as pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&ReportJson {
            outcome: self.outcome(),
            total_patched: self.total_patched(),
            report: self,
        })
    }

    /// Render as a plain text summary.
    pub fn to_text(&self) -> String {
        let mut lines = Vec::new();

        lines.push("Water Reconciliation Report".to_string());
        lines.push("===========================".to_string());
        lines.push(String::new());
        lines.push(format!("Output plugin:    {}", self.output_plugin));
        lines.push(format!("Plugins scanned:  {}", self.plugins_scanned));
        lines.push(format!("Records examined: {}", self.records_examined));
        lines.push(String::new());

        lines.push("Patched".to_string());
        lines.push("-------".to_string());
        if self.patched_by_plugin.is_empty() {
            lines.push("  None".to_string());
        } else {
            for count in &self.patched_by_plugin {
                lines.push(format!("  {}: {}", count.plugin, count.patched));
            }
        }
        lines.push(format!("Total patched:    {}", self.total_patched()));
        lines.push(format!("Decompressed:     {}", self.decompressed));

        if self.has_errors() {
            lines.push(String::new());
            lines.push("Errors".to_string());
            lines.push("------".to_string());
            lines.push(format!(
                "Plugins skipped due to error: {}",
                self.skipped_files.len()
            ));
            for skipped in &self.skipped_files {
                lines.push(format!("  {} ({})", skipped.plugin, skipped.reason));
            }
            if self.skipped_records > 0 {
                lines.push(format!(
                    "Records skipped due to error: {}",
                    self.skipped_records
                ));
            }
        }

        lines.push(String::new());
        lines.push(format!("{}.", self.outcome()));

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(text: &str) -> RecordId {
        text.parse().unwrap()
    }

    fn entry(plugin: &str, local: u32) -> PatchEntry {
        PatchEntry {
            record: RecordId::new(local, "Skyrim.esm").unwrap(),
            plugin: ModKey::from(plugin),
            from: Some(id("000019:Skyrim.esm")),
            to: Some(id("000018:Skyrim.esm")),
        }
    }

    #[test]
    fn test_empty_report_needs_no_patches() {
        let report = ReconcileReport::new("WaterFix.esp");
        assert_eq!(report.outcome(), Outcome::NoPatchesNeeded);
        assert_eq!(report.total_patched(), 0);
        assert!(!report.has_errors());
        assert!(report.to_text().contains("No patches needed."));
    }

    #[test]
    fn test_finish_restamps_generated_at() {
        use chrono::TimeZone;

        let epoch = Utc.timestamp_opt(0, 0).unwrap();
        let mut report = ReconcileReport::new("WaterFix.esp");
        report.generated_at = epoch;

        report.finish();
        assert!(report.generated_at > epoch);
    }

    #[test]
    fn test_per_plugin_counts_in_first_seen_order() {
        let mut report = ReconcileReport::new("WaterFix.esp");
        report.record_patch(entry("ModA.esp", 1));
        report.record_patch(entry("ModB.esp", 2));
        report.record_patch(entry("ModA.esp", 3));

        assert_eq!(report.outcome(), Outcome::PatchesApplied);
        assert_eq!(report.total_patched(), 3);
        assert_eq!(report.patched_for(&ModKey::from("moda.esp")), 2);
        assert_eq!(report.patched_for(&ModKey::from("ModC.esp")), 0);
        assert_eq!(report.patched_by_plugin[0].plugin.as_str(), "ModA.esp");
        assert_eq!(report.patched_by_plugin[1].plugin.as_str(), "ModB.esp");
    }

    #[test]
    fn test_text_lists_skipped_files() {
        let mut report = ReconcileReport::new("WaterFix.esp");
        report.skip_file(ModKey::from("Broken.esp"), "truncated record");
        report.skipped_records = 2;

        let text = report.to_text();
        assert!(report.has_errors());
        assert!(text.contains("Plugins skipped due to error: 1"));
        assert!(text.contains("Broken.esp (truncated record)"));
        assert!(text.contains("Records skipped due to error: 2"));
        assert_eq!(report.skipped_file_names(), vec!["Broken.esp"]);
    }

    #[test]
    fn test_json_includes_derived_fields() {
        let mut report = ReconcileReport::new("WaterFix.esp");
        report.record_patch(entry("ModA.esp", 1));

        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["outcome"], "patches_applied");
        assert_eq!(json["total_patched"], 1);
        assert_eq!(json["output_plugin"], "WaterFix.esp");
        assert_eq!(json["patched_by_plugin"][0]["plugin"], "ModA.esp");
        assert_eq!(json["patches"][0]["to"], "000018:Skyrim.esm");
    }
}
