//! Plugin and record identity types.
//!
//! Plugin names are compared case-insensitively everywhere (the game's file
//! system is case-insensitive), but the original spelling is kept so output
//! and reports show names the way the user wrote them.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Largest local index a record id can carry (24 bits).
pub const MAX_LOCAL_ID: u32 = 0x00FF_FFFF;

/// Errors produced when parsing a [`RecordId`] from text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecordIdError {
    /// The text has no `:` separating the local id from the plugin name.
    #[error("missing ':' separator in record id '{0}'")]
    MissingSeparator(String),

    /// The local id is not valid hexadecimal.
    #[error("invalid local id '{0}'")]
    InvalidLocalId(String),

    /// The local id does not fit in 24 bits.
    #[error("local id {0:#X} exceeds 24 bits")]
    LocalIdOutOfRange(u32),

    /// The plugin name is empty.
    #[error("empty plugin name in record id '{0}'")]
    EmptyPlugin(String),
}

/// A plugin file name (e.g. `Skyrim.esm`).
///
/// Equality, ordering and hashing ignore ASCII case.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModKey(String);

impl ModKey {
    /// Create a plugin key from a file name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The file name as originally written.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is a master file (`.esm`).
    pub fn is_master(&self) -> bool {
        self.0.to_ascii_lowercase().ends_with(".esm")
    }

    /// Case-insensitive comparison against a plain name.
    pub fn matches(&self, name: &str) -> bool {
        self.0.eq_ignore_ascii_case(name)
    }
}

impl PartialEq for ModKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for ModKey {}

impl Hash for ModKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for byte in self.0.bytes() {
            state.write_u8(byte.to_ascii_lowercase());
        }
        state.write_u8(0xff);
    }
}

impl PartialOrd for ModKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ModKey {
    fn cmp(&self, other: &Self) -> Ordering {
        let lhs = self.0.bytes().map(|b| b.to_ascii_lowercase());
        let rhs = other.0.bytes().map(|b| b.to_ascii_lowercase());
        lhs.cmp(rhs)
    }
}

impl fmt::Display for ModKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModKey {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ModKey {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Globally unique identity of one logical record.
///
/// A record is identified by the plugin that first introduced it plus a
/// 24-bit index local to that plugin. The text form is `0123AB:Skyrim.esm`.
///
/// # Example
///
/// ```
/// use waterfix::record::RecordId;
///
/// let id: RecordId = "000D74:Skyrim.esm".parse().unwrap();
/// assert_eq!(id.local(), 0xD74);
/// assert!(id.origin().matches("skyrim.esm"));
/// assert_eq!(id.to_string(), "000D74:Skyrim.esm");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId {
    origin: ModKey,
    local: u32,
}

impl RecordId {
    /// Create a record id. Fails if `local` does not fit in 24 bits.
    pub fn new(local: u32, origin: impl Into<ModKey>) -> Result<Self, RecordIdError> {
        if local > MAX_LOCAL_ID {
            return Err(RecordIdError::LocalIdOutOfRange(local));
        }
        Ok(Self {
            origin: origin.into(),
            local,
        })
    }

    /// The plugin that introduced this record.
    pub fn origin(&self) -> &ModKey {
        &self.origin
    }

    /// The index local to the origin plugin.
    pub fn local(&self) -> u32 {
        self.local
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:06X}:{}", self.local, self.origin)
    }
}

impl FromStr for RecordId {
    type Err = RecordIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (local, origin) = s
            .split_once(':')
            .ok_or_else(|| RecordIdError::MissingSeparator(s.to_string()))?;

        let local = local.trim();
        let digits = local
            .strip_prefix("0x")
            .or_else(|| local.strip_prefix("0X"))
            .unwrap_or(local);
        let local = u32::from_str_radix(digits, 16)
            .map_err(|_| RecordIdError::InvalidLocalId(local.to_string()))?;

        let origin = origin.trim();
        if origin.is_empty() {
            return Err(RecordIdError::EmptyPlugin(s.to_string()));
        }

        RecordId::new(local, origin)
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_mod_key_case_insensitive_equality() {
        assert_eq!(ModKey::from("Skyrim.esm"), ModKey::from("SKYRIM.ESM"));
        assert_ne!(ModKey::from("Skyrim.esm"), ModKey::from("Update.esm"));
    }

    #[test]
    fn test_mod_key_hash_matches_equality() {
        let mut set = HashSet::new();
        set.insert(ModKey::from("Dawnguard.esm"));
        assert!(set.contains(&ModKey::from("dawnguard.ESM")));
    }

    #[test]
    fn test_mod_key_keeps_original_spelling() {
        let key = ModKey::from("HearthFires.esm");
        assert_eq!(key.to_string(), "HearthFires.esm");
        assert!(key.is_master());
        assert!(!ModKey::from("ModA.esp").is_master());
    }

    #[test]
    fn test_parse_record_id() {
        let id: RecordId = "0x01A2B3:Update.esm".parse().unwrap();
        assert_eq!(id.local(), 0x01A2B3);
        assert_eq!(id.origin(), &ModKey::from("update.esm"));
    }

    #[test]
    fn test_record_id_equality_ignores_plugin_case() {
        let a: RecordId = "000D74:Skyrim.esm".parse().unwrap();
        let b: RecordId = "000d74:skyrim.esm".parse().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            "000D74".parse::<RecordId>(),
            Err(RecordIdError::MissingSeparator(_))
        ));
        assert!(matches!(
            "zz:Skyrim.esm".parse::<RecordId>(),
            Err(RecordIdError::InvalidLocalId(_))
        ));
        assert!(matches!(
            "1000000:Skyrim.esm".parse::<RecordId>(),
            Err(RecordIdError::LocalIdOutOfRange(0x1000000))
        ));
        assert!(matches!(
            "000D74: ".parse::<RecordId>(),
            Err(RecordIdError::EmptyPlugin(_))
        ));
    }

    #[test]
    fn test_serde_uses_text_form() {
        let id: RecordId = "000D74:Skyrim.esm".parse().unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"000D74:Skyrim.esm\"");
        let back: RecordId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
