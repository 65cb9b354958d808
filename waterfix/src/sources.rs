//! Trusted and authoritative plugin tables.
//!
//! Both tables are immutable once built and passed into the engine as a
//! [`SourcePolicy`], so tests and the config file can substitute their own.

use std::collections::HashSet;

use crate::record::ModKey;

/// Base game master.
pub const SKYRIM_ESM: &str = "Skyrim.esm";

/// Official update master.
pub const UPDATE_ESM: &str = "Update.esm";

/// Dawnguard DLC master.
pub const DAWNGUARD_ESM: &str = "Dawnguard.esm";

/// Hearthfire DLC master.
pub const HEARTHFIRES_ESM: &str = "HearthFires.esm";

/// Dragonborn DLC master.
pub const DRAGONBORN_ESM: &str = "Dragonborn.esm";

/// Community patch plugin.
pub const USSEP_ESP: &str = "Unofficial Skyrim Special Edition Patch.esp";

/// Base game masters in their canonical load order.
pub const BASE_MASTERS: [&str; 5] = [
    SKYRIM_ESM,
    UPDATE_ESM,
    DAWNGUARD_ESM,
    HEARTHFIRES_ESM,
    DRAGONBORN_ESM,
];

/// Plugins whose winning definitions are never patched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustedSources {
    plugins: HashSet<ModKey>,
}

impl TrustedSources {
    /// Build a trusted set from plugin names.
    pub fn new<I, S>(plugins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ModKey>,
    {
        Self {
            plugins: plugins.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether `plugin` is trusted.
    pub fn contains(&self, plugin: &ModKey) -> bool {
        self.plugins.contains(plugin)
    }

    /// Number of trusted plugins.
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Iterate trusted plugins in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &ModKey> {
        self.plugins.iter()
    }
}

impl Default for TrustedSources {
    fn default() -> Self {
        Self::new(BASE_MASTERS.iter().copied().chain([USSEP_ESP]))
    }
}

/// Ordered pair of plugins that define the truth value.
///
/// The community patch always wins over the official update when both
/// define a record, wherever they sit in the load order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthoritySources {
    community_patch: ModKey,
    official_update: ModKey,
}

impl AuthoritySources {
    /// Create an authority pair, highest authority first.
    pub fn new(community_patch: impl Into<ModKey>, official_update: impl Into<ModKey>) -> Self {
        Self {
            community_patch: community_patch.into(),
            official_update: official_update.into(),
        }
    }

    /// The preferred authority.
    pub fn community_patch(&self) -> &ModKey {
        &self.community_patch
    }

    /// The fallback authority.
    pub fn official_update(&self) -> &ModKey {
        &self.official_update
    }

    /// Authorities in precedence order.
    pub fn in_precedence(&self) -> [&ModKey; 2] {
        [&self.community_patch, &self.official_update]
    }
}

impl Default for AuthoritySources {
    fn default() -> Self {
        Self::new(USSEP_ESP, UPDATE_ESM)
    }
}

/// Combined trust configuration for one reconciliation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourcePolicy {
    /// Plugins never patched when they win.
    pub trusted: TrustedSources,

    /// Plugins consulted for the truth value.
    pub authorities: AuthoritySources,
}

impl SourcePolicy {
    /// Create a policy from explicit tables.
    pub fn new(trusted: TrustedSources, authorities: AuthoritySources) -> Self {
        Self {
            trusted,
            authorities,
        }
    }

    /// Whether `plugin` is trusted.
    pub fn is_trusted(&self, plugin: &ModKey) -> bool {
        self.trusted.contains(plugin)
    }
}
