//! Named text asset lookup.
//!
//! Hosts publish the animation driver and manifests as named public assets.
//! Worlds that cannot load file-backed public assets keep a copy of the source
//! in their own script directory instead, so lookup searches the public
//! library first and falls back to local script directories.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::debug;

use crate::error::ManifestError;

/// Extensions tried when a local file is looked up by bare asset name.
const LOCAL_EXTENSIONS: &[&str] = &["ts", "js", "json", "txt"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AssetOrigin {
    /// Found in the public library under this name.
    Library,
    /// Read from a local script directory.
    Local(PathBuf),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocatedAsset {
    pub name: String,
    pub origin: AssetOrigin,
    pub contents: String,
}

#[derive(Clone, Debug, Default)]
pub struct TextAssetLocator {
    library: IndexMap<String, String>,
    script_dirs: Vec<PathBuf>,
}

impl TextAssetLocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish an asset in the in-memory public library.
    pub fn publish(&mut self, name: impl Into<String>, contents: impl Into<String>) {
        self.library.insert(name.into(), contents.into());
    }

    /// Publish every regular file of `dir` under its file stem.
    pub fn publish_dir(&mut self, dir: &Path) -> Result<usize, ManifestError> {
        let mut count = 0;
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let contents = fs::read_to_string(&path)?;
            self.library.insert(stem.to_string(), contents);
            count += 1;
        }
        debug!("published {count} asset(s) from {}", dir.display());
        Ok(count)
    }

    /// Add a local script directory consulted after the library.
    pub fn with_script_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.script_dirs.push(dir.into());
        self
    }

    pub fn locate(&self, name: &str) -> Result<LocatedAsset, ManifestError> {
        if let Some(contents) = self.library.get(name) {
            return Ok(LocatedAsset {
                name: name.to_string(),
                origin: AssetOrigin::Library,
                contents: contents.clone(),
            });
        }

        for dir in &self.script_dirs {
            if let Some(path) = find_local(dir, name) {
                debug!("asset '{name}' not published; using {}", path.display());
                let contents = fs::read_to_string(&path)?;
                return Ok(LocatedAsset {
                    name: name.to_string(),
                    origin: AssetOrigin::Local(path),
                    contents,
                });
            }
        }

        let mut searched = vec![format!("library ({} assets)", self.library.len())];
        searched.extend(self.script_dirs.iter().map(|d| d.display().to_string()));
        Err(ManifestError::AssetNotFound {
            name: name.to_string(),
            searched: searched.join(", "),
        })
    }
}

fn find_local(dir: &Path, name: &str) -> Option<PathBuf> {
    let exact = dir.join(name);
    if exact.is_file() {
        return Some(exact);
    }
    LOCAL_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{name}.{ext}")))
        .find(|p| p.is_file())
}
