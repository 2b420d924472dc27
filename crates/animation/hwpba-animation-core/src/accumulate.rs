//! Weighted accumulation of part poses (cross-fades).
//!
//! Positions accumulate as weighted sums. Rotations accumulate as weighted
//! quaternion sums, sign-aligned to the first contribution so opposite
//! hemispheres do not cancel, and are normalized at finalize.

use indexmap::IndexMap;

use crate::interp::{dot4, normalize_quat};
use crate::outputs::PartPose;

#[derive(Clone, Debug)]
struct Entry {
    pos: [f32; 3],
    rot: [f32; 4],
    w: f32,
}

#[derive(Debug, Default)]
pub struct Accumulator {
    entries: IndexMap<String, Entry>,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, part: &str, pose: &PartPose, w: f32) {
        if w <= 0.0 {
            return;
        }
        let e = self.entries.entry(part.to_string()).or_insert(Entry {
            pos: [0.0; 3],
            rot: [0.0; 4],
            w: 0.0,
        });
        let mut q = pose.rotation;
        if e.w > 0.0 && dot4(e.rot, q) < 0.0 {
            q = [-q[0], -q[1], -q[2], -q[3]];
        }
        for i in 0..3 {
            e.pos[i] += pose.position[i] * w;
        }
        for i in 0..4 {
            e.rot[i] += q[i] * w;
        }
        e.w += w;
    }

    /// Weighted average per part, in insertion order.
    pub fn finalize(self) -> Vec<(String, PartPose)> {
        self.entries
            .into_iter()
            .map(|(part, e)| {
                let inv = if e.w > 0.0 { e.w.recip() } else { 0.0 };
                let pose = PartPose {
                    position: [e.pos[0] * inv, e.pos[1] * inv, e.pos[2] * inv],
                    rotation: normalize_quat(e.rot),
                };
                (part, pose)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blends_positions_by_weight() {
        let mut acc = Accumulator::new();
        acc.add("Body", &PartPose::at([0.0, 0.0, 0.0]), 0.75);
        acc.add("Body", &PartPose::at([4.0, 0.0, 0.0]), 0.25);
        let out = acc.finalize();
        assert_eq!(out.len(), 1);
        assert!((out[0].1.position[0] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn opposite_sign_quaternions_do_not_cancel() {
        let mut acc = Accumulator::new();
        let a = PartPose {
            position: [0.0; 3],
            rotation: [0.0, 0.0, 0.0, 1.0],
        };
        let b = PartPose {
            position: [0.0; 3],
            rotation: [0.0, 0.0, 0.0, -1.0],
        };
        acc.add("Arm", &a, 0.5);
        acc.add("Arm", &b, 0.5);
        let q = acc.finalize()[0].1.rotation;
        assert!((q[3].abs() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn zero_weight_contributions_are_ignored() {
        let mut acc = Accumulator::new();
        acc.add("Arm", &PartPose::at([1.0, 1.0, 1.0]), 0.0);
        assert!(acc.finalize().is_empty());
    }
}
