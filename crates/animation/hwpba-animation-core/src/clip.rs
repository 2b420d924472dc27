//! Clips compiled from manifest entries.
//!
//! A manifest clip stores rotations and positions in two maps keyed by part.
//! Playback wants one track per part, so both maps are merged here in
//! first-seen order.

use hwpba_manifest::{ClipEntry, Quat, Vec3};
use indexmap::IndexMap;

use crate::ids::ClipId;

#[derive(Clone, Debug, PartialEq)]
pub struct PartTrack {
    pub part: String,
    pub positions: Option<Vec<Vec3>>,
    pub rotations: Option<Vec<Quat>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Clip {
    /// Assigned when loaded into an engine.
    pub id: Option<ClipId>,
    pub name: String,
    /// Absolute key times in seconds (shared by every track).
    pub times: Vec<f32>,
    pub tracks: Vec<PartTrack>,
}

impl Clip {
    pub fn from_manifest(name: &str, entry: &ClipEntry) -> Self {
        let mut by_part: IndexMap<&str, PartTrack> = IndexMap::new();
        for (part, rotations) in &entry.rotations {
            by_part
                .entry(part.as_str())
                .or_insert_with(|| empty_track(part))
                .rotations = Some(rotations.clone());
        }
        for (part, positions) in &entry.positions {
            by_part
                .entry(part.as_str())
                .or_insert_with(|| empty_track(part))
                .positions = Some(positions.clone());
        }
        Self {
            id: None,
            name: name.to_string(),
            times: entry.times.clone(),
            tracks: by_part.into_values().collect(),
        }
    }

    /// Time of the first key; local clip time 0 maps here.
    pub fn start(&self) -> f32 {
        self.times.first().copied().unwrap_or(0.0)
    }

    /// Length in seconds.
    pub fn duration(&self) -> f32 {
        match (self.times.first(), self.times.last()) {
            (Some(first), Some(last)) => (last - first).max(0.0),
            _ => 0.0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn track(&self, part: &str) -> Option<&PartTrack> {
        self.tracks.iter().find(|t| t.part == part)
    }
}

fn empty_track(part: &str) -> PartTrack {
    PartTrack {
        part: part.to_string(),
        positions: None,
        rotations: None,
    }
}
