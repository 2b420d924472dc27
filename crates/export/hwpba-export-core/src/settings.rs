//! Export settings (JSON file, overridable from the CLI).

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use hwpba_manifest::clean;

use crate::error::ExportError;

pub const DEFAULT_CHARACTER_NAME: &str = "Character";

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ExportSettings {
    /// Empty means: use the source file stem.
    pub character_name: String,
    /// Base folder; the `HWPBA_Output` layout is created inside it.
    pub output_root: PathBuf,
    /// Restrict part discovery to this node's subtree.
    pub source_node: Option<String>,
}

impl ExportSettings {
    pub fn load(path: &Path) -> Result<Self, ExportError> {
        let raw = fs::read_to_string(path).map_err(|e| ExportError::Settings {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        serde_json::from_str(&raw).map_err(|e| ExportError::Settings {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Character name, falling back to `source_stem`, then `"Character"`.
    pub fn resolved_name(&self, source_stem: Option<&str>) -> String {
        let name = self.character_name.trim();
        if !name.is_empty() {
            return name.to_string();
        }
        source_stem
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_CHARACTER_NAME)
            .to_string()
    }
}

/// `clean(name) + "_"`, or empty when nothing survives cleaning.
pub fn name_prefix(character_name: &str) -> String {
    let cleaned = clean(character_name);
    if cleaned.is_empty() {
        String::new()
    } else {
        format!("{cleaned}_")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_falls_back_to_stem_then_default() {
        let mut s = ExportSettings::default();
        assert_eq!(s.resolved_name(Some("walker")), "walker");
        assert_eq!(s.resolved_name(None), "Character");
        s.character_name = " Goblin King ".into();
        assert_eq!(s.resolved_name(Some("walker")), "Goblin King");
        assert_eq!(name_prefix(&s.resolved_name(None)), "Goblin_King_");
        assert_eq!(name_prefix("!!"), "");
    }

    #[test]
    fn partial_json_uses_defaults() {
        let s: ExportSettings = serde_json::from_str(r#"{"outputRoot":"/tmp/out"}"#).unwrap();
        assert_eq!(s.output_root, PathBuf::from("/tmp/out"));
        assert!(s.character_name.is_empty());
        assert!(s.source_node.is_none());
    }
}
