//! Decoded cell records and their per-file definitions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::id::{ModKey, RecordId};

/// Record header flags.
///
/// Only the bits this crate acts on are named; every other bit is carried
/// through untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordFlags(u32);

impl RecordFlags {
    /// Record data is stored zlib-compressed.
    pub const COMPRESSED: u32 = 0x0004_0000;

    /// Build flags from raw header bits.
    pub fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Raw header bits.
    pub fn bits(&self) -> u32 {
        self.0
    }

    /// Whether all bits in `mask` are set.
    pub fn contains(&self, mask: u32) -> bool {
        self.0 & mask == mask
    }

    /// Clear the bits in `mask`. Returns `true` if any were set.
    pub fn remove(&mut self, mask: u32) -> bool {
        let was_set = self.0 & mask != 0;
        self.0 &= !mask;
        was_set
    }

    /// Whether the compressed-storage bit is set.
    pub fn is_compressed(&self) -> bool {
        self.contains(Self::COMPRESSED)
    }
}

/// A decoded cell record.
///
/// `water` is the only field this crate reconciles. Everything else is
/// preserved verbatim when the record is copied into the output layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellRecord {
    /// Identity of the record.
    pub id: RecordId,

    /// Editor id, if the record has one.
    pub editor_id: Option<String>,

    /// Water type reference. `None` means the cell has no water set.
    pub water: Option<RecordId>,

    /// Record header flags.
    pub flags: RecordFlags,

    /// All other attributes, opaque to reconciliation.
    pub data: BTreeMap<String, serde_json::Value>,
}

impl CellRecord {
    /// Create a record with no water and no extra attributes.
    pub fn new(id: RecordId) -> Self {
        Self {
            id,
            editor_id: None,
            water: None,
            flags: RecordFlags::default(),
            data: BTreeMap::new(),
        }
    }

    /// Set the water reference.
    pub fn with_water(mut self, water: Option<RecordId>) -> Self {
        self.water = water;
        self
    }

    /// Set the editor id.
    pub fn with_editor_id(mut self, editor_id: impl Into<String>) -> Self {
        self.editor_id = Some(editor_id.into());
        self
    }

    /// Set the header flags.
    pub fn with_flags(mut self, flags: RecordFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Whether both records carry the same water assignment.
    ///
    /// Two empty values agree; one empty and one set disagree; two set values
    /// agree only when they reference the same record.
    pub fn water_agrees_with(&self, other: &CellRecord) -> bool {
        match (&self.water, &other.water) {
            (None, None) => true,
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

/// One plugin's version of a record.
#[derive(Debug, Clone, PartialEq)]
pub struct FileDefinition {
    /// Plugin this definition was read from.
    pub origin: ModKey,

    /// Position of `origin` in the load order (higher wins).
    pub priority: usize,

    /// The decoded record.
    pub record: CellRecord,
}

impl FileDefinition {
    /// Create a definition.
    pub fn new(origin: impl Into<ModKey>, priority: usize, record: CellRecord) -> Self {
        Self {
            origin: origin.into(),
            priority,
            record,
        }
    }

    /// Identity of the defined record.
    pub fn id(&self) -> &RecordId {
        &self.record.id
    }

    /// Whether this definition came from `plugin`.
    pub fn is_from(&self, plugin: &ModKey) -> bool {
        &self.origin == plugin
    }
}
