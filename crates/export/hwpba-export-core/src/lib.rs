//! HWPBA exporter
//!
//! Reads a glTF export of a parts-based rig (one rigid mesh node per part),
//! discovers the parts, extracts rotation/translation clips into the manifest
//! format and lays out the folder that gets uploaded to the host:
//!
//! ```text
//! HWPBA_Output/
//!   assetsToUpload/
//!     3dModels/               part textures
//!     <Name>_Animations.json  manifest (Text Asset)
//!   tempFiles/
//!   instructions.txt
//! ```

pub mod animation;
pub mod convert;
pub mod error;
pub mod gltf_source;
pub mod instructions;
pub mod layout;
pub mod naming;
pub mod parts;
pub mod pipeline;
pub mod settings;
pub mod textures;

pub use animation::{
    extract_animations, read_channels, resample_rotations, resample_translations, Channel,
    ChannelValues,
};
pub use convert::{convert_gltf_to_manifest, write_manifest, ConvertOptions};
pub use error::ExportError;
pub use gltf_source::GltfSource;
pub use instructions::write_instructions;
pub use layout::OutputLayout;
pub use naming::{name_sanity, safe_bone_name, safe_filename_component};
pub use parts::{find_parts, joint_targets, Part, PartSearch};
pub use pipeline::{create_files, validate, BuildReport, Readiness};
pub use settings::ExportSettings;
pub use textures::{package_textures, texture_file_name};

pub use hwpba_manifest::{clean, Manifest};
