//! Output contracts from the core engine.
//!
//! Outputs carry the per-part pose changes for this tick and a separate list
//! of semantic events. Hosts apply changes to their parts and transport events.

use hwpba_manifest::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::binding::PartHandle;
use crate::ids::PlayerId;
use crate::interp::IDENTITY_QUAT;

/// Local pose of one rigid part relative to the character root.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct PartPose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl PartPose {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            rotation: IDENTITY_QUAT,
        }
    }
}

impl Default for PartPose {
    fn default() -> Self {
        Self::at([0.0; 3])
    }
}

/// One part pose for a given player this tick.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Change {
    pub player: PlayerId,
    pub part: String,
    /// Host handle resolved at prebind; `None` when the part was not found.
    pub handle: Option<PartHandle>,
    pub pose: PartPose,
}

/// Discrete semantic signals emitted during stepping.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[non_exhaustive]
pub enum CoreEvent {
    PlaybackStarted { player: PlayerId, clip: String },
    CrossFadeStarted { player: PlayerId, from: String, to: String, duration: f32 },
    CrossFadeFinished { player: PlayerId, clip: String },
    PlaybackPaused { player: PlayerId },
    PlaybackResumed { player: PlayerId },
    PlaybackStopped { player: PlayerId },
    /// A `Once` clip reached its end (emitted once per play).
    PlaybackEnded { player: PlayerId, clip: String },
    /// A `Loop`/`PingPong` clip wrapped around.
    Looped { player: PlayerId, clip: String },
    TimeChanged { player: PlayerId, old_time: f32, new_time: f32 },
    Error { message: String },
}

/// Outputs returned by Engine::update().
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Outputs {
    #[serde(default)]
    pub changes: Vec<Change>,
    #[serde(default)]
    pub events: Vec<CoreEvent>,
}

impl Outputs {
    #[inline]
    pub fn clear(&mut self) {
        self.changes.clear();
        self.events.clear();
    }

    #[inline]
    pub fn push_change(&mut self, change: Change) {
        self.changes.push(change);
    }

    #[inline]
    pub fn push_event(&mut self, event: CoreEvent) {
        self.events.push(event);
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty() && self.events.is_empty()
    }

    /// Pose emitted for `part` by `player` this tick, if any.
    pub fn pose_of(&self, player: PlayerId, part: &str) -> Option<&PartPose> {
        self.changes
            .iter()
            .find(|c| c.player == player && c.part == part)
            .map(|c| &c.pose)
    }
}
