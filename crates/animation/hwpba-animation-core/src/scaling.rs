//! ScalingBase: uniform character scaling that keeps the feet on the ground.
//!
//! Animated parts move in the character's local space, so scaling the
//! character root directly would also scale it about its pivot and lift or
//! sink the feet. The character is instead parented under a base entity that
//! carries the scale, and the root is offset down by the lowest rest point so
//! that point stays on the base's ground plane. Only uniform scale is
//! supported.

use hwpba_manifest::Vec3;

use crate::engine::Character;
use crate::error::AnimationError;
use crate::scene::{EntityId, SceneGraph};

const UNIFORM_EPSILON: f32 = 1e-5;

#[derive(Clone, Debug, PartialEq)]
pub struct ScalingBase {
    origin: Vec3,
    scale: f32,
    ground_offset: f32,
}

impl ScalingBase {
    pub fn new(origin: Vec3) -> Self {
        Self {
            origin,
            scale: 1.0,
            ground_offset: 0.0,
        }
    }

    pub fn with_ground_offset(mut self, ground_offset: f32) -> Self {
        self.ground_offset = ground_offset;
        self
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn ground_offset(&self) -> f32 {
        self.ground_offset
    }

    pub fn set_uniform_scale(&mut self, scale: f32) -> Result<(), AnimationError> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(AnimationError::InvalidScale { scale });
        }
        self.scale = scale;
        Ok(())
    }

    /// Accepts a per-axis scale only when all three axes agree.
    pub fn set_scale(&mut self, scale: [f32; 3]) -> Result<(), AnimationError> {
        let [x, y, z] = scale;
        let tol = UNIFORM_EPSILON * x.abs().max(1.0);
        if (x - y).abs() > tol || (x - z).abs() > tol {
            return Err(AnimationError::NonUniformScale { scale });
        }
        self.set_uniform_scale(x)
    }

    /// Ground on the lowest rest position of `character`.
    pub fn ground_to(&mut self, character: &Character) {
        self.ground_offset = character
            .rest
            .values()
            .map(|p| p.position[1])
            .fold(None, |lo: Option<f32>, y| Some(lo.map_or(y, |lo| lo.min(y))))
            .unwrap_or(0.0);
    }

    /// World position of a character-local point.
    pub fn world_position(&self, local: Vec3) -> Vec3 {
        let s = self.scale;
        [
            self.origin[0] + s * local[0],
            self.origin[1] + s * (local[1] - self.ground_offset),
            self.origin[2] + s * local[2],
        ]
    }

    /// Configure `base` (the scaling entity) and the character `root` below it.
    pub fn apply(
        &self,
        scene: &mut SceneGraph,
        base: EntityId,
        root: EntityId,
    ) -> Result<(), AnimationError> {
        let b = scene
            .get_mut(base)
            .ok_or(AnimationError::EntityNotFound { id: base.0 })?;
        b.position = self.origin;
        b.scale = [self.scale; 3];

        let r = scene
            .get_mut(root)
            .ok_or(AnimationError::EntityNotFound { id: root.0 })?;
        r.position = [0.0, -self.ground_offset, 0.0];
        Ok(())
    }
}
