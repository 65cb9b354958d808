//! Plugin dump documents and the data directory that holds them.
//!
//! A plugin dump is a JSON rendering of one plugin's cell records, produced
//! by an external extractor. Record references stay as text until queried,
//! so a malformed reference only affects the record that carries it.
//!
//! ```text
//! Data/
//! ├── Skyrim.esm.json
//! ├── Update.esm.json
//! ├── Unofficial Skyrim Special Edition Patch.esp.json
//! └── ModA.esp.json
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::record::{CellRecord, ModKey, RecordFlags, RecordId, RecordIdError};

use super::error::PluginError;

/// File extension appended to a plugin name to locate its dump.
pub const DUMP_EXTENSION: &str = "json";

/// One record as stored in a plugin dump.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    /// Record id in text form (`0123AB:Skyrim.esm`).
    pub id: String,

    /// Editor id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editor_id: Option<String>,

    /// Water reference in text form; absent means no water.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub water: Option<String>,

    /// Raw header flags.
    #[serde(default)]
    pub flags: u32,

    /// Remaining attributes.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, serde_json::Value>,
}

impl RawRecord {
    /// Parse only the record id.
    pub fn record_id(&self) -> Result<RecordId, RecordIdError> {
        self.id.parse()
    }

    /// Decode into a [`CellRecord`].
    pub fn decode(&self) -> Result<CellRecord, RecordIdError> {
        let water = self
            .water
            .as_deref()
            .map(str::parse::<RecordId>)
            .transpose()?;

        Ok(CellRecord {
            id: self.record_id()?,
            editor_id: self.editor_id.clone(),
            water,
            flags: RecordFlags::from_bits(self.flags),
            data: self.data.clone(),
        })
    }

    /// Encode a decoded record.
    pub fn encode(record: &CellRecord) -> Self {
        Self {
            id: record.id.to_string(),
            editor_id: record.editor_id.clone(),
            water: record.water.as_ref().map(ToString::to_string),
            flags: record.flags.bits(),
            data: record.data.clone(),
        }
    }
}

/// A whole plugin dump.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginFile {
    /// Plugin file name.
    pub name: ModKey,

    /// Tool or person that produced the plugin, if recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    /// Masters this plugin depends on, in load order.
    #[serde(default)]
    pub masters: Vec<ModKey>,

    /// Cell records defined or overridden by this plugin.
    #[serde(default)]
    pub records: Vec<RawRecord>,
}

impl PluginFile {
    /// Create an empty plugin.
    pub fn new(name: impl Into<ModKey>) -> Self {
        Self {
            name: name.into(),
            author: None,
            masters: Vec::new(),
            records: Vec::new(),
        }
    }

    /// Set the author.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Add a decoded record.
    pub fn with_record(mut self, record: &CellRecord) -> Self {
        self.records.push(RawRecord::encode(record));
        self
    }

    /// Add a raw record as-is.
    pub fn with_raw_record(mut self, record: RawRecord) -> Self {
        self.records.push(record);
        self
    }
}

/// A directory of plugin dumps.
#[derive(Debug, Clone)]
pub struct PluginDirectory {
    root: PathBuf,
}

impl PluginDirectory {
    /// Create a handle for `root`. Nothing is read until queried.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the dump for `plugin`.
    pub fn plugin_path(&self, plugin: &ModKey) -> PathBuf {
        self.root
            .join(format!("{}.{}", plugin.as_str(), DUMP_EXTENSION))
    }

    /// Whether a dump for `plugin` exists.
    pub fn contains(&self, plugin: &ModKey) -> bool {
        self.plugin_path(plugin).is_file()
    }

    /// All plugins with a dump in the directory, sorted by name.
    pub fn available(&self) -> Result<Vec<ModKey>, PluginError> {
        let root = self
            .root
            .to_str()
            .ok_or_else(|| PluginError::Directory(self.root.clone()))?;
        let pattern = format!("{}/*.{}", glob::Pattern::escape(root), DUMP_EXTENSION);
        let paths = glob::glob(&pattern).map_err(|_| PluginError::Directory(self.root.clone()))?;

        let suffix = format!(".{}", DUMP_EXTENSION);
        let mut plugins: Vec<ModKey> = paths
            .filter_map(Result::ok)
            .filter(|path| path.is_file())
            .filter_map(|path| {
                let file_name = path.file_name()?.to_str()?;
                file_name.strip_suffix(&suffix).map(ModKey::from)
            })
            .collect();

        plugins.sort();
        Ok(plugins)
    }

    /// Read the dump for `plugin`.
    pub fn read(&self, plugin: &ModKey) -> Result<PluginFile, PluginError> {
        let path = self.plugin_path(plugin);
        let text = std::fs::read_to_string(&path).map_err(|source| PluginError::Read {
            path: path.clone(),
            source,
        })?;
        let file: PluginFile = serde_json::from_str(&text).map_err(|source| PluginError::Parse {
            path: path.clone(),
            source,
        })?;

        if &file.name != plugin {
            return Err(PluginError::NameMismatch {
                path,
                declared: file.name.to_string(),
            });
        }

        Ok(file)
    }

    /// Write `plugin` into the directory, replacing any existing dump.
    pub fn write(&self, plugin: &PluginFile) -> Result<PathBuf, PluginError> {
        let path = self.plugin_path(&plugin.name);
        let json =
            serde_json::to_string_pretty(plugin).map_err(|source| PluginError::Serialize {
                plugin: plugin.name.clone(),
                source,
            })?;
        std::fs::write(&path, json).map_err(|source| PluginError::Write {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}
