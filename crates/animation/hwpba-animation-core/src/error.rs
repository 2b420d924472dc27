//! Error types for the animation runtime

use hwpba_manifest::ManifestError;
use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum AnimationError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("character not found: {id}")]
    CharacterNotFound { id: u32 },

    #[error("player not found: {id}")]
    PlayerNotFound { id: u32 },

    #[error("clip not found: {name}")]
    ClipNotFound { name: String },

    /// ScalingBase only supports uniform, positive scale.
    #[error("non-uniform scale {scale:?}: wrap the character in a ScalingBase and scale it uniformly")]
    NonUniformScale { scale: [f32; 3] },

    #[error("invalid scale {scale}: must be finite and > 0")]
    InvalidScale { scale: f32 },

    /// An animated component was driven before its base initialised.
    #[error("animated component used before pre_start initialised it")]
    NotInitialized,

    #[error("entity not found: {id}")]
    EntityNotFound { id: u64 },
}
