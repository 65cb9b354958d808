//! `plugins.txt` parsing.
//!
//! One plugin per line. A leading `*` marks the plugin active; lines
//! without it are installed but disabled. `#` starts a comment line.

use crate::record::ModKey;

/// One entry from `plugins.txt`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginsTxtEntry {
    /// Plugin file name.
    pub plugin: ModKey,

    /// Whether the plugin is enabled.
    pub active: bool,
}

/// Parse `plugins.txt` contents into entries, in file order.
pub fn parse_plugins_txt(text: &str) -> Vec<PluginsTxtEntry> {
    text.lines()
        .map(|line| line.trim_start_matches('\u{feff}').trim())
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let (active, name) = match line.strip_prefix('*') {
                Some(rest) => (true, rest.trim()),
                None => (false, line),
            };
            (!name.is_empty()).then(|| PluginsTxtEntry {
                plugin: ModKey::from(name),
                active,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_active_and_inactive() {
        let entries = parse_plugins_txt("*ModA.esp\nModB.esp\n");
        assert_eq!(entries.len(), 2);
        assert!(entries[0].active);
        assert!(entries[0].plugin.matches("ModA.esp"));
        assert!(!entries[1].active);
    }

    #[test]
    fn test_parse_skips_comments_blank_and_bom() {
        let text = "\u{feff}# This file is used by the game\n\n  *ModA.esp  \r\n*\n";
        let entries = parse_plugins_txt(text);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].plugin.as_str(), "ModA.esp");
    }
}
