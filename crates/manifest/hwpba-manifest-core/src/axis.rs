//! Axis conversions from glTF (right-handed, +Y up) into host axes.
//!
//! - translations: (x, y, z) -> (-x, y, z)
//! - quaternions:  (x, y, z, w) -> (x, -y, -z, w)

use crate::manifest::{Quat, Vec3};

#[inline]
pub fn gltf_translation_to_host(v: [f32; 3]) -> Vec3 {
    [-v[0], v[1], v[2]]
}

#[inline]
pub fn gltf_rotation_to_host(q: [f32; 4]) -> Quat {
    [q[0], -q[1], -q[2], q[3]]
}
