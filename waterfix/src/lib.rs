//! WaterFix - cell water reconciliation for Skyrim load orders.
//!
//! Many mods carry copies of cell records made before the official update and
//! the community patch corrected their water type. Whichever mod loads last
//! silently reverts the fix, leaving visible water seams. This library finds
//! every winning cell definition whose water disagrees with the authority
//! plugins and writes a small override plugin that restores it.
//!
//! # Architecture
//!
//! ```text
//! LoadOrder + PluginDirectory
//!          │
//!          ▼
//!   MemoryRecordIndex ──(RecordIndex)──► OverrideResolver
//!                                            │
//!                                            ▼
//!                                       TruthSelector
//!                                            │
//!                                            ▼
//!                                        Reconciler ──► PatchLayer + ReconcileReport
//! ```
//!
//! - [`index`]: the record store the core reads from
//! - [`resolver`]: last-writer-wins winner resolution
//! - [`truth`]: authority-ranked truth selection
//! - [`reconcile`]: the scan, patching and decompression pass
//! - [`patch`]: the output override layer

pub mod config;
pub mod index;
pub mod load_order;
pub mod logging;
pub mod patch;
pub mod reconcile;
pub mod record;
pub mod resolver;
pub mod sources;
pub mod truth;
