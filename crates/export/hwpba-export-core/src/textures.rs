//! Texture packaging into `assetsToUpload/3dModels`.
//!
//! Every image referenced by a part's materials is written next to the part
//! models as `clean(stem) + ext`. External files (percent-decoded URIs) are
//! copied; `data:` URIs and buffer views are written from their bytes. Images
//! whose final file name was already written are skipped.

use std::fs;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use indexmap::{IndexMap, IndexSet};
use log::{debug, warn};
use percent_encoding::percent_decode_str;

use hwpba_manifest::clean;

use crate::error::ExportError;
use crate::gltf_source::GltfSource;
use crate::naming::safe_filename_component;
use crate::parts::Part;

fn extension_for_mime(mime: &str) -> Option<&'static str> {
    match mime {
        "image/png" => Some(".png"),
        "image/jpeg" => Some(".jpg"),
        "image/webp" => Some(".webp"),
        _ => None,
    }
}

/// Relative file path of a non-data URI, percent-decoded.
fn uri_path(uri: &str) -> Option<PathBuf> {
    if uri.starts_with("data:") {
        None
    } else {
        Some(PathBuf::from(
            percent_decode_str(uri).decode_utf8_lossy().into_owned(),
        ))
    }
}

/// An RFC 2397 `data:` URI split into its MIME type and decoded payload.
struct DataUri<'a> {
    mime: Option<&'a str>,
    payload: &'a str,
    base64: bool,
}

impl<'a> DataUri<'a> {
    fn parse(uri: &'a str) -> Option<Self> {
        let (header, payload) = uri.strip_prefix("data:")?.split_once(',')?;
        let (mime, base64) = match header.strip_suffix(";base64") {
            Some(mime) => (mime, true),
            None => (header, false),
        };
        let mime = mime.split(';').next().filter(|m| !m.is_empty());
        Some(Self {
            mime,
            payload,
            base64,
        })
    }

    fn decode(&self) -> Option<Vec<u8>> {
        if self.base64 {
            STANDARD.decode(self.payload.trim()).ok()
        } else {
            Some(percent_decode_str(self.payload).collect())
        }
    }
}

/// Output file name for an image: cleaned name (or URI stem) plus extension
/// from the URI, else the MIME type, else `.png`.
pub fn texture_file_name(image: &gltf::Image) -> String {
    let (uri, mime) = match image.source() {
        gltf::image::Source::Uri { uri, mime_type } => (
            uri_path(uri),
            mime_type.or_else(|| DataUri::parse(uri).and_then(|d| d.mime)),
        ),
        gltf::image::Source::View { mime_type, .. } => (None, Some(mime_type)),
    };

    let stem = image
        .name()
        .filter(|n| !n.is_empty())
        .map(|n| {
            let n = safe_filename_component(n);
            Path::new(&n)
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or(n)
        })
        .or_else(|| {
            uri.as_deref()
                .and_then(Path::file_stem)
                .map(|s| s.to_string_lossy().into_owned())
        })
        .map(|s| clean(&s))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "Image".to_string());

    let ext = uri
        .as_deref()
        .and_then(Path::extension)
        .map(|e| format!(".{}", e.to_string_lossy().to_ascii_lowercase()))
        .or_else(|| mime.and_then(extension_for_mime).map(str::to_string))
        .unwrap_or_else(|| ".png".to_string());

    format!("{stem}{ext}")
}

/// Image indices used by the materials of `parts`, in first-seen order.
fn part_images(source: &GltfSource, parts: &[Part]) -> IndexSet<usize> {
    let meshes: Vec<gltf::Mesh> = source.document.meshes().collect();
    let mut images = IndexSet::new();
    for mesh in parts.iter().filter_map(|p| p.mesh).filter_map(|m| meshes.get(m)) {
        for primitive in mesh.primitives() {
            let material = primitive.material();
            let pbr = material.pbr_metallic_roughness();
            let textures = [
                pbr.base_color_texture().map(|t| t.texture()),
                pbr.metallic_roughness_texture().map(|t| t.texture()),
                material.normal_texture().map(|t| t.texture()),
                material.occlusion_texture().map(|t| t.texture()),
                material.emissive_texture().map(|t| t.texture()),
            ];
            for texture in textures.into_iter().flatten() {
                images.insert(texture.source().index());
            }
        }
    }
    images
}

/// Write the textures of `parts` into `models_dir`. Returns written paths.
pub fn package_textures(
    source: &GltfSource,
    parts: &[Part],
    models_dir: &Path,
) -> Result<Vec<PathBuf>, ExportError> {
    let images: Vec<gltf::Image> = source.document.images().collect();
    let mut written: IndexMap<String, PathBuf> = IndexMap::new();

    for index in part_images(source, parts) {
        let Some(image) = images.get(index) else {
            continue;
        };
        let file_name = texture_file_name(image);
        if written.contains_key(&file_name) {
            debug!("texture '{file_name}' already written; skipping image {index}");
            continue;
        }
        let target = models_dir.join(&file_name);

        match image.source() {
            gltf::image::Source::Uri { uri, .. } => match uri_path(uri) {
                Some(rel) => {
                    let src = source.base_dir().join(rel);
                    if !src.is_file() {
                        warn!("texture source {} is missing; skipped", src.display());
                        continue;
                    }
                    fs::copy(&src, &target)?;
                }
                None => {
                    let Some(bytes) = DataUri::parse(uri).and_then(|d| d.decode()) else {
                        warn!("image {index} has a malformed data URI; skipped");
                        continue;
                    };
                    fs::write(&target, bytes)?;
                }
            },
            gltf::image::Source::View { view, .. } => {
                let Some(bytes) = source.view_bytes(&view) else {
                    warn!("image {index} points outside its buffer; skipped");
                    continue;
                };
                fs::write(&target, bytes)?;
            }
        }
        debug!("wrote texture {}", target.display());
        written.insert(file_name, target);
    }
    Ok(written.into_values().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_uri_decodes_base64_and_plain_payloads() {
        let d = DataUri::parse("data:image/png;base64,aGk=").unwrap();
        assert_eq!(d.mime, Some("image/png"));
        assert_eq!(d.decode().unwrap(), b"hi");

        let d = DataUri::parse("data:,a%20b").unwrap();
        assert_eq!(d.mime, None);
        assert_eq!(d.decode().unwrap(), b"a b");

        assert!(DataUri::parse("data:image/png;base64,@@").unwrap().decode().is_none());
        assert!(DataUri::parse("skin.png").is_none());
    }

    #[test]
    fn uri_paths_are_percent_decoded() {
        assert_eq!(uri_path("tex/my%20skin.png"), Some(PathBuf::from("tex/my skin.png")));
        assert_eq!(uri_path("data:image/png;base64,aGk="), None);
    }
}
