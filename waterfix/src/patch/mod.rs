//! Output layer holding the corrected records.

mod layer;

pub use layer::{PatchLayer, OUTPUT_AUTHOR};
