//! HWPBA manifest core
//!
//! The manifest is the plain-text contract between the exporter and the
//! parts-based animation runtime. It is uploaded to the host as a Text Asset
//! next to the per-part models and lists, per clip, a shared time base and
//! per-part rotation/translation samples already expressed in host axes.

pub mod asset;
pub mod axis;
pub mod error;
pub mod file_names;
pub mod manifest;

pub use asset::{AssetOrigin, LocatedAsset, TextAssetLocator};
pub use axis::{gltf_rotation_to_host, gltf_translation_to_host};
pub use error::ManifestError;
pub use file_names::{animations_file_name, clean, is_animations_file};
pub use manifest::{
    parse_manifest_json, ClipEntry, ClipSummary, Manifest, ManifestSummary, Meta, Quat, Vec3,
};
