//! glTF → manifest conversion.

use std::fs;
use std::path::Path;

use hwpba_manifest::{Manifest, Meta};
use indexmap::IndexMap;
use log::info;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

use crate::animation::extract_animations;
use crate::error::ExportError;
use crate::gltf_source::GltfSource;
use crate::parts::{find_parts, PartSearch};

#[derive(Clone, Debug, Default)]
pub struct ConvertOptions {
    pub name_prefix: String,
    /// Node whose subtree holds the parts (see `find_parts`).
    pub source_node: Option<String>,
}

/// Local time as `YYYY-MM-DDTHH:MM:SS`, UTC when the local offset is unknown.
pub fn generated_timestamp() -> Result<String, ExportError> {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    let now = OffsetDateTime::now_utc().to_offset(offset);
    Ok(now.format(format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second]"
    ))?)
}

/// Build the manifest for an already opened source.
pub fn build_manifest(source: &GltfSource, opts: &ConvertOptions) -> Result<Manifest, ExportError> {
    let search = match opts.source_node.as_deref() {
        Some(name) => PartSearch::SourceNode(name),
        None => PartSearch::Auto,
    };
    let (parts, _) = find_parts(source, search);
    let initial_positions: IndexMap<String, [f32; 3]> = parts
        .iter()
        .map(|p| (p.name.clone(), p.initial_position()))
        .collect();

    let manifest = Manifest {
        animations: extract_animations(source, &parts),
        initial_positions,
        name_prefix: opts.name_prefix.clone(),
        meta: Meta {
            source: source.file_name(),
            generated: generated_timestamp()?,
        },
    };
    manifest.validate()?;
    Ok(manifest)
}

pub fn convert_gltf_to_manifest(
    path: impl AsRef<Path>,
    opts: &ConvertOptions,
) -> Result<Manifest, ExportError> {
    let source = GltfSource::open(path)?;
    build_manifest(&source, opts)
}

/// Write the compact manifest; returns the user-facing message.
pub fn write_manifest(manifest: &Manifest, out_path: &Path) -> Result<String, ExportError> {
    if let Some(dir) = out_path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    fs::write(out_path, manifest.to_json_compact()?)?;
    let file = out_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let message = format!("Wrote {file}");
    info!("{message}");
    Ok(message)
}
