//! Record identities and decoded cell records.
//!
//! Binary decoding is not done here: records arrive already decoded from a
//! [`RecordIndex`](crate::index::RecordIndex) implementation.

mod cell;
mod id;

pub use cell::{CellRecord, FileDefinition, RecordFlags};
pub use id::{ModKey, RecordId, RecordIdError, MAX_LOCAL_ID};
