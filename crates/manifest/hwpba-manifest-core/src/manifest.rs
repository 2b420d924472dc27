//! Manifest schema and codec.
//!
//! ```json
//! {
//!   "animations": { "Walk": { "times": [..], "rotations": { "Arm": [[x,y,z,w], ..] },
//!                             "positions": { "Body": [[x,y,z], ..] } } },
//!   "initialPositions": { "Arm": [x,y,z] },
//!   "namePrefix": "Goblin_",
//!   "meta": { "source": "Goblin.gltf", "generated": "2025-01-01T12:00:00" }
//! }
//! ```
//!
//! Every track holds one sample per entry of its clip's `times`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::ManifestError;

pub type Vec3 = [f32; 3];
/// Quaternion (x, y, z, w).
pub type Quat = [f32; 4];

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ClipEntry {
    #[serde(default)]
    pub times: Vec<f32>,
    #[serde(default)]
    pub rotations: IndexMap<String, Vec<Quat>>,
    #[serde(default)]
    pub positions: IndexMap<String, Vec<Vec3>>,
}

impl ClipEntry {
    /// Clip length in seconds (last key time minus first key time).
    pub fn duration(&self) -> f32 {
        match (self.times.first(), self.times.last()) {
            (Some(first), Some(last)) => (last - first).max(0.0),
            _ => 0.0,
        }
    }

    fn validate(&self, clip: &str) -> Result<(), ManifestError> {
        let mut last = f32::NEG_INFINITY;
        for t in &self.times {
            if !t.is_finite() {
                return Err(ManifestError::invalid(format!(
                    "clip '{clip}': times must be finite"
                )));
            }
            if *t < last {
                return Err(ManifestError::invalid(format!(
                    "clip '{clip}': times must be non-decreasing"
                )));
            }
            last = *t;
        }

        let frames = self.times.len();
        for (part, samples) in &self.rotations {
            if samples.len() != frames {
                return Err(ManifestError::invalid(format!(
                    "clip '{clip}': rotation track '{part}' has {} samples, expected {frames}",
                    samples.len()
                )));
            }
            if samples.iter().flatten().any(|c| !c.is_finite()) {
                return Err(ManifestError::invalid(format!(
                    "clip '{clip}': rotation track '{part}' has non-finite components"
                )));
            }
        }
        for (part, samples) in &self.positions {
            if samples.len() != frames {
                return Err(ManifestError::invalid(format!(
                    "clip '{clip}': position track '{part}' has {} samples, expected {frames}",
                    samples.len()
                )));
            }
            if samples.iter().flatten().any(|c| !c.is_finite()) {
                return Err(ManifestError::invalid(format!(
                    "clip '{clip}': position track '{part}' has non-finite components"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Meta {
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub generated: String,
}

/// The animation manifest uploaded as a Text Asset.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(default)]
    pub animations: IndexMap<String, ClipEntry>,
    /// Rest (bind) world positions of each part, in host axes.
    #[serde(default)]
    pub initial_positions: IndexMap<String, Vec3>,
    #[serde(default)]
    pub name_prefix: String,
    #[serde(default)]
    pub meta: Meta,
}

/// Parse and validate manifest JSON.
pub fn parse_manifest_json(s: &str) -> Result<Manifest, ManifestError> {
    let manifest: Manifest = serde_json::from_str(s)?;
    manifest.validate()?;
    Ok(manifest)
}

impl Manifest {
    pub fn validate(&self) -> Result<(), ManifestError> {
        for (name, clip) in &self.animations {
            clip.validate(name)?;
        }
        for (part, p) in &self.initial_positions {
            if p.iter().any(|c| !c.is_finite()) {
                return Err(ManifestError::invalid(format!(
                    "initial position of '{part}' has non-finite components"
                )));
            }
        }
        Ok(())
    }

    /// Compact encoding, as uploaded to the host.
    pub fn to_json_compact(&self) -> Result<String, ManifestError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, ManifestError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn clip(&self, name: &str) -> Result<&ClipEntry, ManifestError> {
        self.animations
            .get(name)
            .ok_or_else(|| ManifestError::ClipNotFound {
                name: name.to_string(),
            })
    }

    pub fn clip_names(&self) -> impl Iterator<Item = &str> {
        self.animations.keys().map(String::as_str)
    }

    /// Every part mentioned anywhere in the manifest, in first-seen order.
    pub fn part_names(&self) -> Vec<String> {
        let mut seen: IndexMap<&str, ()> = IndexMap::new();
        for part in self.initial_positions.keys() {
            seen.insert(part.as_str(), ());
        }
        for clip in self.animations.values() {
            for part in clip.rotations.keys().chain(clip.positions.keys()) {
                seen.insert(part.as_str(), ());
            }
        }
        seen.into_keys().map(str::to_string).collect()
    }

    pub fn summary(&self) -> ManifestSummary {
        ManifestSummary {
            name_prefix: self.name_prefix.clone(),
            source: self.meta.source.clone(),
            generated: self.meta.generated.clone(),
            parts: self.part_names(),
            clips: self
                .animations
                .iter()
                .map(|(name, clip)| ClipSummary {
                    name: name.clone(),
                    frames: clip.times.len(),
                    duration: clip.duration(),
                    rotated_parts: clip.rotations.len(),
                    positioned_parts: clip.positions.len(),
                })
                .collect(),
        }
    }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ClipSummary {
    pub name: String,
    pub frames: usize,
    pub duration: f32,
    pub rotated_parts: usize,
    pub positioned_parts: usize,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ManifestSummary {
    pub name_prefix: String,
    pub source: String,
    pub generated: String,
    pub parts: Vec<String>,
    pub clips: Vec<ClipSummary>,
}
