//! Water reconciliation engine.
//!
//! # Overview
//!
//! For every record in the load order, the engine compares the winning
//! definition's water reference against the truth chosen from the authority
//! plugins, and writes an override into a [`PatchLayer`](crate::patch::PatchLayer)
//! wherever they differ.
//!
//! ```text
//! DISCOVERED ──► winner trusted? ──────► SKIPPED
//!            ──► no truth? ────────────► SKIPPED
//!            ──► truth == winner? ─────► SKIPPED
//!            ──► truth != winner ──────► PATCHED
//! ```
//!
//! After all patches are written, the compressed flag is cleared on every
//! record in the layer.
//!
//! # Example
//!
//! ```ignore
//! use waterfix::index::{MemoryRecordIndex, PluginDirectory};
//! use waterfix::reconcile::Reconciler;
//! use waterfix::sources::SourcePolicy;
//!
//! let index = MemoryRecordIndex::load(&PluginDirectory::new(data_dir), load_order);
//! let policy = SourcePolicy::default();
//! let outcome = Reconciler::new(&index, &policy).run("WaterFix.esp")?;
//! println!("{}", outcome.report.to_text());
//! ```

mod engine;
mod error;
mod report;

pub use engine::{ReconcileOutcome, Reconciler, RecordStatus};
pub use error::ReconcileError;
pub use report::{Outcome, PatchEntry, PluginPatchCount, ReconcileReport, SkippedFile};
