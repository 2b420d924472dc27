//! HWPBA animation core (engine-agnostic)
//!
//! Plays back parts-based animation manifests. A character is a root entity
//! whose named child parts are rigid meshes; each clip drives per-part
//! rotations and positions sampled from a shared time base. Hosts resolve
//! part names to handles once (`Engine::prebind`), step the engine each tick
//! and apply the emitted pose changes.

pub mod accumulate;
pub mod binding;
pub mod clip;
pub mod component;
pub mod config;
pub mod engine;
pub mod error;
pub mod ids;
pub mod inputs;
pub mod interp;
pub mod outputs;
pub mod sampling;
pub mod scaling;
pub mod scene;

// Re-exports for consumers (hosts)
pub use binding::{BindingTable, PartHandle, PartResolver};
pub use clip::{Clip, PartTrack};
pub use component::{AnimatedBase, AnimatedComponent};
pub use config::Config;
pub use engine::{Character, Engine, PlaybackState, Player, PlayerSnapshot};
pub use error::AnimationError;
pub use ids::{CharacterId, ClipId, PlayerId};
pub use inputs::{Inputs, LoopMode, PlayerCommand};
pub use outputs::{Change, CoreEvent, Outputs, PartPose};
pub use sampling::{sample_clip, sample_track};
pub use scaling::ScalingBase;
pub use scene::{Entity, EntityId, SceneGraph, SceneResolver};

pub use hwpba_manifest::{parse_manifest_json, Manifest};
