//! Loaded glTF document plus its buffers.
//!
//! Images are not decoded: textures are packaged as the original bytes.

use std::path::{Path, PathBuf};

use log::debug;

use crate::error::ExportError;

pub struct GltfSource {
    pub path: PathBuf,
    pub document: gltf::Document,
    pub buffers: Vec<gltf::buffer::Data>,
}

impl GltfSource {
    /// Open a `.gltf` (external or data-URI buffers) or `.glb` file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ExportError> {
        let path = path.as_ref();
        let gltf::Gltf { document, blob } = gltf::Gltf::open(path)?;
        let buffers = gltf::import_buffers(&document, path.parent(), blob)?;
        debug!(
            "opened {}: {} node(s), {} animation(s), {} buffer(s)",
            path.display(),
            document.nodes().len(),
            document.animations().len(),
            buffers.len()
        );
        Ok(Self {
            path: path.to_path_buf(),
            document,
            buffers,
        })
    }

    /// File name recorded in the manifest `meta.source`.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn file_stem(&self) -> Option<String> {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .filter(|s| !s.is_empty())
    }

    /// Directory that relative URIs resolve against.
    pub fn base_dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    /// Bytes of a buffer view.
    pub fn view_bytes(&self, view: &gltf::buffer::View) -> Option<&[u8]> {
        let data = self.buffers.get(view.buffer().index())?;
        data.get(view.offset()..view.offset() + view.length())
    }
}

/// Node name, falling back to `node_<index>`.
pub fn node_name(node: &gltf::Node) -> String {
    match node.name() {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => format!("node_{}", node.index()),
    }
}
