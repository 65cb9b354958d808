//! Record index: the read side of the plugin data.
//!
//! The reconciliation core never parses plugin bytes. It queries a
//! [`RecordIndex`], which answers three questions:
//!
//! - which records does a plugin define ([`RecordIndex::local_records`]),
//! - which plugin's definition of a record wins ([`RecordIndex::winning_definition`]),
//! - what does every plugin say about a record ([`RecordIndex::all_definitions`]).
//!
//! [`MemoryRecordIndex`] is the bundled implementation, fed by JSON plugin
//! dumps in a [`PluginDirectory`].

mod error;
mod memory;
mod plugin;
mod traits;

pub use error::{IndexError, PluginError};
pub use memory::MemoryRecordIndex;
pub use plugin::{PluginDirectory, PluginFile, RawRecord, DUMP_EXTENSION};
pub use traits::RecordIndex;
