//! Shared test fixtures, resolved through `fixtures/manifest.json`.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use tempfile::TempDir;

#[derive(Debug, Deserialize)]
struct Index {
    manifests: HashMap<String, String>,
    gltf: HashMap<String, String>,
}

fn index() -> &'static Index {
    static INDEX: OnceLock<Index> = OnceLock::new();
    INDEX.get_or_init(|| {
        let raw = include_str!("../../../../fixtures/manifest.json");
        serde_json::from_str(raw).expect("fixtures manifest should parse")
    })
}

fn fixtures_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../fixtures")
}

fn resolve_path(rel: &str) -> PathBuf {
    fixtures_root().join(rel)
}

fn read_to_string(rel: &str) -> Result<String> {
    let path = resolve_path(rel);
    fs::read_to_string(&path)
        .with_context(|| format!("failed to read fixture at {}", path.display()))
}

fn lookup<'a>(map: &'a HashMap<String, String>, kind: &str, name: &str) -> Result<&'a str> {
    map.get(name)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("unknown {kind} fixture '{name}'"))
}

pub mod manifests {
    use super::*;

    pub fn keys() -> Vec<String> {
        index().manifests.keys().cloned().collect()
    }

    pub fn json(name: &str) -> Result<String> {
        read_to_string(lookup(&index().manifests, "manifest", name)?)
    }

    pub fn path(name: &str) -> Result<PathBuf> {
        Ok(resolve_path(lookup(&index().manifests, "manifest", name)?))
    }
}

pub mod gltf {
    use super::*;

    pub fn path(name: &str) -> Result<PathBuf> {
        Ok(resolve_path(lookup(&index().gltf, "gltf", name)?))
    }
}

/// A fresh, empty directory under the system temp dir; removed on drop.
pub fn scratch_dir(label: &str) -> Result<TempDir> {
    tempfile::Builder::new()
        .prefix(&format!("hwpba-{label}-"))
        .tempdir()
        .with_context(|| format!("failed to create scratch dir for '{label}'"))
}
