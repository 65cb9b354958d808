//! Plugin load order.
//!
//! Priority increases with position: the last plugin to define a record
//! wins. A load order never contains the same plugin twice.

mod error;
mod plugins_txt;

pub use error::LoadOrderError;
pub use plugins_txt::{parse_plugins_txt, PluginsTxtEntry};

use std::path::Path;

use crate::record::ModKey;

/// An ordered, duplicate-free list of plugins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadOrder {
    plugins: Vec<ModKey>,
}

impl LoadOrder {
    /// Create a load order, lowest priority first.
    ///
    /// Fails if the same plugin (case-insensitive) appears twice.
    pub fn new<I, S>(plugins: I) -> Result<Self, LoadOrderError>
    where
        I: IntoIterator<Item = S>,
        S: Into<ModKey>,
    {
        let mut order = Self::default();
        for plugin in plugins {
            order.push(plugin)?;
        }
        Ok(order)
    }

    /// Build a load order from `plugins.txt` contents.
    ///
    /// Only active entries are kept. Any of `implicit` that are not listed
    /// but satisfy `available` are prepended in the given order, mirroring
    /// how the game always loads its base masters first.
    pub fn from_plugins_txt<F>(
        text: &str,
        implicit: &[&str],
        available: F,
    ) -> Result<Self, LoadOrderError>
    where
        F: Fn(&ModKey) -> bool,
    {
        let entries = parse_plugins_txt(text);
        let listed: Vec<ModKey> = entries
            .into_iter()
            .filter(|e| e.active)
            .map(|e| e.plugin)
            .collect();

        let mut order = Self::default();
        for name in implicit {
            let key = ModKey::from(*name);
            if !listed.contains(&key) && available(&key) {
                order.push(key)?;
            }
        }
        for plugin in listed {
            order.push(plugin)?;
        }
        Ok(order)
    }

    /// Read and parse a `plugins.txt` file. See [`LoadOrder::from_plugins_txt`].
    pub fn read_plugins_txt<F>(
        path: &Path,
        implicit: &[&str],
        available: F,
    ) -> Result<Self, LoadOrderError>
    where
        F: Fn(&ModKey) -> bool,
    {
        let text = std::fs::read_to_string(path).map_err(|source| LoadOrderError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_plugins_txt(&text, implicit, available)
    }

    /// Append a plugin as the new highest priority.
    pub fn push(&mut self, plugin: impl Into<ModKey>) -> Result<(), LoadOrderError> {
        let plugin = plugin.into();
        if self.contains(&plugin) {
            return Err(LoadOrderError::Duplicate(plugin.to_string()));
        }
        self.plugins.push(plugin);
        Ok(())
    }

    /// Return a copy with `plugin` appended as the highest priority.
    pub fn with_plugin(&self, plugin: impl Into<ModKey>) -> Result<Self, LoadOrderError> {
        let mut order = self.clone();
        order.push(plugin)?;
        Ok(order)
    }

    /// Return a copy with `plugin` removed. Priorities of the remaining
    /// plugins keep their relative order.
    pub fn without(&self, plugin: &ModKey) -> Self {
        Self {
            plugins: self.plugins.iter().filter(|p| *p != plugin).cloned().collect(),
        }
    }

    /// Position of `plugin`, if present.
    pub fn position(&self, plugin: &ModKey) -> Option<usize> {
        self.plugins.iter().position(|p| p == plugin)
    }

    /// Whether `plugin` is in the load order.
    pub fn contains(&self, plugin: &ModKey) -> bool {
        self.position(plugin).is_some()
    }

    /// Plugins, lowest priority first.
    pub fn iter(&self) -> impl Iterator<Item = &ModKey> {
        self.plugins.iter()
    }

    /// Plugins as a slice, lowest priority first.
    pub fn plugins(&self) -> &[ModKey] {
        &self.plugins
    }

    /// Number of plugins.
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Whether the load order is empty.
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}
