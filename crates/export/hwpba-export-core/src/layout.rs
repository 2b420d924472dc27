//! Output folder layout and pre-export cleanup.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use hwpba_manifest::is_animations_file;

use crate::error::ExportError;

pub const OUTPUT_DIR: &str = "HWPBA_Output";
pub const ASSETS_DIR: &str = "assetsToUpload";
pub const MODELS_DIR: &str = "3dModels";
pub const TEMP_DIR: &str = "tempFiles";

/// Loose files of these kinds are swept from `assetsToUpload/` before export.
const STRAY_EXTENSIONS: &[&str] = &[
    "fbx", "png", "jpg", "jpeg", "webp", "tga", "tif", "tiff", "bmp", "gif",
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputLayout {
    pub root: PathBuf,
    pub assets: PathBuf,
    pub models: PathBuf,
    pub temp: PathBuf,
}

impl OutputLayout {
    /// Resolve the layout under `base` without touching the filesystem.
    pub fn resolve(base: &Path) -> Result<Self, ExportError> {
        if base.as_os_str().is_empty() {
            return Err(ExportError::NoOutputFolder);
        }
        let is_root = base
            .file_name()
            .is_some_and(|n| n.to_string_lossy().eq_ignore_ascii_case(OUTPUT_DIR));
        let root = if is_root {
            base.to_path_buf()
        } else {
            base.join(OUTPUT_DIR)
        };
        let assets = root.join(ASSETS_DIR);
        Ok(Self {
            models: assets.join(MODELS_DIR),
            temp: root.join(TEMP_DIR),
            assets,
            root,
        })
    }

    /// Resolve and create the layout directories.
    pub fn ensure(base: &Path) -> Result<Self, ExportError> {
        let layout = Self::resolve(base)?;
        fs::create_dir_all(&layout.models)?;
        fs::create_dir_all(&layout.temp)?;
        debug!("output layout ready at {}", layout.root.display());
        Ok(layout)
    }

    /// Empty `tempFiles/` and `3dModels/` and sweep stray model/texture files
    /// from the `assetsToUpload/` root. Animation manifests and subfolders are
    /// kept. Individual removal failures are logged. Returns entries removed.
    pub fn clean_known_outputs(&self) -> Result<usize, ExportError> {
        let mut removed = empty_dir(&self.temp)?;
        removed += empty_dir(&self.models)?;

        fs::create_dir_all(&self.assets)?;
        for entry in fs::read_dir(&self.assets)? {
            let path = entry?.path();
            if path.is_dir() {
                continue;
            }
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            if is_animations_file(&name) {
                continue;
            }
            let stray = path
                .extension()
                .map(|e| e.to_string_lossy().to_ascii_lowercase())
                .is_some_and(|e| STRAY_EXTENSIONS.contains(&e.as_str()));
            if stray {
                match fs::remove_file(&path) {
                    Ok(()) => removed += 1,
                    Err(e) => warn!("could not remove {}: {e}", path.display()),
                }
            }
        }
        Ok(removed)
    }
}

/// Delete everything inside `dir`, keeping `dir` itself (created if missing).
fn empty_dir(dir: &Path) -> io::Result<usize> {
    if !dir.is_dir() {
        fs::create_dir_all(dir)?;
        return Ok(0);
    }
    let mut removed = 0;
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let res = if path.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        match res {
            Ok(()) => removed += 1,
            Err(e) => warn!("could not remove {}: {e}", path.display()),
        }
    }
    Ok(removed)
}
