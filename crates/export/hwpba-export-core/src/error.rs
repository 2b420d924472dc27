//! Error types for the exporter

use std::path::PathBuf;

use hwpba_manifest::ManifestError;
use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ExportError {
    #[error("gltf: {0}")]
    Gltf(#[from] gltf::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("timestamp: {0}")]
    Timestamp(#[from] time::error::Format),

    #[error("No Output Folder selected")]
    NoOutputFolder,

    /// Validation refused the export; `message` is user-facing.
    #[error("{message}")]
    NotReady { message: String },

    #[error("failed to read settings {path}: {reason}")]
    Settings { path: PathBuf, reason: String },
}
