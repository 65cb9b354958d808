//! Configuration file support.
//!
//! Settings live in `~/.waterfix/config.ini`. A missing file means defaults;
//! unknown sections and keys are ignored.
//!
//! ```ini
//! [general]
//! output_plugin = WaterFix.esp
//!
//! [sources]
//! trusted = Skyrim.esm, Update.esm, Dawnguard.esm, HearthFires.esm, Dragonborn.esm, Unofficial Skyrim Special Edition Patch.esp
//! community_patch = Unofficial Skyrim Special Edition Patch.esp
//! official_update = Update.esm
//!
//! [logging]
//! level = info
//! directory =
//! ```

use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;

use crate::sources::{
    AuthoritySources, SourcePolicy, TrustedSources, BASE_MASTERS, UPDATE_ESM, USSEP_ESP,
};

/// Default name of the output plugin.
pub const DEFAULT_OUTPUT_PLUGIN: &str = "WaterFix.esp";

/// Log levels accepted in `[logging] level`.
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Errors loading or saving the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read or parsed.
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: ini::Error,
    },

    /// The file could not be written.
    #[error("failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A setting has an unusable value.
    #[error("invalid value for {section}.{key}: {reason}")]
    InvalidValue {
        section: &'static str,
        key: &'static str,
        reason: String,
    },
}

/// `[general]` settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneralSettings {
    /// File name of the generated plugin.
    pub output_plugin: String,
}

/// `[sources]` settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSettings {
    /// Plugins never patched when they win.
    pub trusted: Vec<String>,

    /// Preferred authority.
    pub community_patch: String,

    /// Fallback authority.
    pub official_update: String,
}

/// `[logging]` settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Default log level; `RUST_LOG` takes precedence.
    pub level: String,

    /// Directory for log files; `None` disables file logging.
    pub directory: Option<PathBuf>,
}

/// Parsed configuration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    pub general: GeneralSettings,
    pub sources: SourceSettings,
    pub logging: LoggingSettings,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            general: GeneralSettings {
                output_plugin: DEFAULT_OUTPUT_PLUGIN.to_string(),
            },
            sources: SourceSettings {
                trusted: BASE_MASTERS
                    .iter()
                    .copied()
                    .chain([USSEP_ESP])
                    .map(String::from)
                    .collect(),
                community_patch: USSEP_ESP.to_string(),
                official_update: UPDATE_ESM.to_string(),
            },
            logging: LoggingSettings {
                level: "info".to_string(),
                directory: None,
            },
        }
    }
}

/// Directory holding the config file and default logs.
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".waterfix")
}

/// Path of the config file.
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}

impl ConfigFile {
    /// Load from the default location, or defaults if the file is absent.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    /// Load from `path`, or defaults if the file is absent.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let ini = Ini::load_from_file(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ini(&ini)
    }

    /// Build from parsed INI contents, falling back to defaults per key.
    pub fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(general) = ini.section(Some("general")) {
            if let Some(name) = general.get("output_plugin") {
                config.general.output_plugin = parse_plugin_name("general", "output_plugin", name)?;
            }
        }

        if let Some(sources) = ini.section(Some("sources")) {
            if let Some(list) = sources.get("trusted") {
                config.sources.trusted = parse_plugin_list("sources", "trusted", list)?;
            }
            if let Some(name) = sources.get("community_patch") {
                config.sources.community_patch =
                    parse_plugin_name("sources", "community_patch", name)?;
            }
            if let Some(name) = sources.get("official_update") {
                config.sources.official_update =
                    parse_plugin_name("sources", "official_update", name)?;
            }
        }

        if let Some(logging) = ini.section(Some("logging")) {
            if let Some(level) = logging.get("level") {
                let level = level.trim().to_lowercase();
                if !LOG_LEVELS.contains(&level.as_str()) {
                    return Err(ConfigError::InvalidValue {
                        section: "logging",
                        key: "level",
                        reason: format!("expected one of {}", LOG_LEVELS.join(", ")),
                    });
                }
                config.logging.level = level;
            }
            if let Some(directory) = logging.get("directory") {
                let directory = directory.trim();
                config.logging.directory =
                    (!directory.is_empty()).then(|| PathBuf::from(directory));
            }
        }

        Ok(config)
    }

    /// Render as INI.
    pub fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();
        ini.with_section(Some("general"))
            .set("output_plugin", self.general.output_plugin.as_str());
        ini.with_section(Some("sources"))
            .set("trusted", self.sources.trusted.join(", "))
            .set("community_patch", self.sources.community_patch.as_str())
            .set("official_update", self.sources.official_update.as_str());
        ini.with_section(Some("logging"))
            .set("level", self.logging.level.as_str())
            .set(
                "directory",
                self.logging
                    .directory
                    .as_ref()
                    .map(|d| d.display().to_string())
                    .unwrap_or_default(),
            );
        ini
    }

    /// Write to the default location, creating the directory if needed.
    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = config_file_path();
        self.save_to(&path)?;
        Ok(path)
    }

    /// Write to `path`, creating parent directories if needed.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        self.to_ini().write_to_file(path).map_err(write_err)
    }

    /// Trust tables described by `[sources]`.
    pub fn source_policy(&self) -> SourcePolicy {
        SourcePolicy::new(
            TrustedSources::new(self.sources.trusted.iter().map(String::as_str)),
            AuthoritySources::new(
                self.sources.community_patch.as_str(),
                self.sources.official_update.as_str(),
            ),
        )
    }
}

fn parse_plugin_name(
    section: &'static str,
    key: &'static str,
    value: &str,
) -> Result<String, ConfigError> {
    let name = value.trim();
    let lower = name.to_ascii_lowercase();
    if [".esm", ".esp", ".esl"].iter().any(|ext| lower.ends_with(ext)) && name.len() > 4 {
        Ok(name.to_string())
    } else {
        Err(ConfigError::InvalidValue {
            section,
            key,
            reason: format!("'{}' is not a plugin file name", name),
        })
    }
}

fn parse_plugin_list(
    section: &'static str,
    key: &'static str,
    value: &str,
) -> Result<Vec<String>, ConfigError> {
    if value.trim().is_empty() {
        return Ok(Vec::new());
    }
    value
        .split(',')
        .map(|item| parse_plugin_name(section, key, item))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ModKey;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_match_builtin_policy() {
        let config = ConfigFile::default();
        assert_eq!(config.general.output_plugin, DEFAULT_OUTPUT_PLUGIN);
        assert_eq!(config.source_policy(), SourcePolicy::default());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let config = ConfigFile::load_from(&temp.path().join("config.ini")).unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_save_and_reload() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.ini");

        let mut config = ConfigFile::default();
        config.general.output_plugin = "MyWaterFix.esp".to_string();
        config.sources.trusted = vec!["Skyrim.esm".to_string()];
        config.logging.level = "debug".to_string();
        config.logging.directory = Some(temp.path().join("logs"));
        config.save_to(&path).unwrap();

        let loaded = ConfigFile::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let ini = Ini::load_from_str("[sources]\nofficial_update = Update.esm\n[other]\nx = 1\n")
            .unwrap();
        let config = ConfigFile::from_ini(&ini).unwrap();
        assert_eq!(config.sources.trusted.len(), 6);
        assert_eq!(config.logging.directory, None);
    }

    #[test]
    fn test_custom_sources_policy() {
        let ini = Ini::load_from_str(
            "[sources]\ntrusted = Fallout4.esm, DLCRobot.esm\ncommunity_patch = UFO4P.esp\nofficial_update = Fallout4.esm\n",
        )
        .unwrap();
        let policy = ConfigFile::from_ini(&ini).unwrap().source_policy();
        assert!(policy.is_trusted(&ModKey::from("dlcrobot.esm")));
        assert!(!policy.is_trusted(&ModKey::from("Skyrim.esm")));
        assert!(policy.authorities.community_patch().matches("UFO4P.esp"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let ini = Ini::load_from_str("[sources]\ntrusted = Skyrim.esm,,Update.esm\n").unwrap();
        assert!(matches!(
            ConfigFile::from_ini(&ini),
            Err(ConfigError::InvalidValue { key: "trusted", .. })
        ));

        let ini = Ini::load_from_str("[logging]\nlevel = loud\n").unwrap();
        assert!(matches!(
            ConfigFile::from_ini(&ini),
            Err(ConfigError::InvalidValue { key: "level", .. })
        ));

        let ini = Ini::load_from_str("[general]\noutput_plugin = WaterFix\n").unwrap();
        assert!(ConfigFile::from_ini(&ini).is_err());
    }
}
