//! Validate → layout → cleanup → textures → manifest → instructions.

use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::Serialize;

use hwpba_manifest::animations_file_name;

use crate::convert::{build_manifest, write_manifest, ConvertOptions};
use crate::error::ExportError;
use crate::gltf_source::GltfSource;
use crate::instructions::write_instructions;
use crate::layout::OutputLayout;
use crate::naming::name_sanity;
use crate::parts::{find_parts, PartSearch};
use crate::settings::{name_prefix, ExportSettings};
use crate::textures::package_textures;

/// Outcome of `validate`; never an error so UIs can show the message.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct Readiness {
    pub ok: bool,
    pub message: String,
    pub part_count: usize,
    pub source_label: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct BuildReport {
    pub root: PathBuf,
    pub manifest_path: PathBuf,
    pub instructions_path: PathBuf,
    pub textures: Vec<PathBuf>,
    pub part_count: usize,
    pub clip_count: usize,
    pub source_label: String,
    pub warnings: Vec<String>,
    pub message: String,
}

fn search(settings: &ExportSettings) -> PartSearch<'_> {
    match settings.source_node.as_deref() {
        Some(name) if !name.is_empty() => PartSearch::SourceNode(name),
        _ => PartSearch::Auto,
    }
}

pub fn validate(settings: &ExportSettings, source: &GltfSource) -> Readiness {
    let (parts, source_label) = find_parts(source, search(settings));
    let message = if settings.output_root.as_os_str().is_empty() {
        "Choose an output folder"
    } else if parts.is_empty() {
        "No parts found. Name a source node, or group the parts under 'hw_parts'."
    } else {
        ""
    };
    Readiness {
        ok: message.is_empty(),
        message: message.to_string(),
        part_count: parts.len(),
        source_label,
    }
}

/// Run the full export of `gltf_path` into the settings' output folder.
pub fn create_files(settings: &ExportSettings, gltf_path: &Path) -> Result<BuildReport, ExportError> {
    let source = GltfSource::open(gltf_path)?;
    let readiness = validate(settings, &source);
    if !readiness.ok {
        return Err(ExportError::NotReady {
            message: readiness.message,
        });
    }

    let layout = OutputLayout::ensure(&settings.output_root)?;
    if let Err(e) = layout.clean_known_outputs() {
        warn!("cleanup of {} failed: {e}", layout.root.display());
    }

    let (parts, source_label) = find_parts(&source, search(settings));
    let warnings = name_sanity(parts.iter().map(|p| p.name.as_str()));
    let textures = package_textures(&source, &parts, &layout.models)?;

    let character = settings.resolved_name(source.file_stem().as_deref());
    let opts = ConvertOptions {
        name_prefix: name_prefix(&character),
        source_node: settings.source_node.clone().filter(|s| !s.is_empty()),
    };
    let manifest = build_manifest(&source, &opts)?;
    let file_name = animations_file_name(&character);
    let manifest_path = layout.assets.join(&file_name);
    write_manifest(&manifest, &manifest_path)?;
    let instructions_path = write_instructions(&layout.root, &file_name)?;

    let message = format!(
        "Exported {} part(s), {} clip(s) and {} texture(s) to {}",
        parts.len(),
        manifest.animations.len(),
        textures.len(),
        layout.root.display()
    );
    info!("{message}");

    Ok(BuildReport {
        root: layout.root,
        manifest_path,
        instructions_path,
        textures,
        part_count: parts.len(),
        clip_count: manifest.animations.len(),
        source_label,
        warnings,
        message,
    })
}
