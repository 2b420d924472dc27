//! Clip sampling.
//!
//! Model:
//! - A clip has one absolute time base (`times`); every track holds one sample
//!   per key.
//! - Positions interpolate linearly, rotations by shortest-arc NLERP.
//! - Before the first key / after the last key the end sample is held.
//! - Parts without a track of a given kind keep their rest value.

use crate::clip::{Clip, PartTrack};
use crate::interp::{lerp_vec3, nlerp_quat, normalize_quat};
use crate::outputs::PartPose;

/// Find the key segment containing absolute time `t`.
/// Returns (i, i+1, local_t) with local_t in [0,1]; (i, i, 0) when clamped to an end.
/// NaN holds the first key.
pub fn find_segment(times: &[f32], t: f32) -> (usize, usize, f32) {
    let n = times.len();
    if n == 0 {
        return (0, 0, 0.0);
    }
    if n == 1 || t.is_nan() || t <= times[0] {
        return (0, 0, 0.0);
    }
    if t >= times[n - 1] {
        return (n - 1, n - 1, 0.0);
    }
    // First index whose time is > t; always in 1..n here.
    let hi = times.partition_point(|k| *k <= t);
    let lo = hi - 1;
    let denom = (times[hi] - times[lo]).max(f32::EPSILON);
    (lo, hi, ((t - times[lo]) / denom).clamp(0.0, 1.0))
}

/// Sample one part track at absolute time `t`, filling gaps from `rest`.
pub fn sample_track(track: &PartTrack, times: &[f32], t: f32, rest: &PartPose) -> PartPose {
    let (i0, i1, lt) = find_segment(times, t);

    let position = track
        .positions
        .as_deref()
        .and_then(|p| match (p.get(i0), p.get(i1)) {
            (Some(a), Some(b)) => Some(lerp_vec3(*a, *b, lt)),
            (Some(a), None) => Some(*a),
            _ => p.last().copied(),
        })
        .unwrap_or(rest.position);

    let rotation = track
        .rotations
        .as_deref()
        .and_then(|r| match (r.get(i0), r.get(i1)) {
            (Some(a), Some(b)) => Some(nlerp_quat(*a, *b, lt)),
            (Some(a), None) => Some(normalize_quat(*a)),
            _ => r.last().copied().map(normalize_quat),
        })
        .unwrap_or(rest.rotation);

    PartPose { position, rotation }
}

/// Sample every track of `clip` at local time `local_t` (seconds from the first key).
/// `rest` supplies the pose of parts/channels the clip does not animate.
pub fn sample_clip<'a, F>(clip: &'a Clip, local_t: f32, rest: F) -> Vec<(&'a str, PartPose)>
where
    F: Fn(&str) -> PartPose,
{
    if clip.is_empty() {
        return Vec::new();
    }
    let t = clip.start() + local_t.clamp(0.0, clip.duration());
    clip.tracks
        .iter()
        .map(|track| {
            let rest_pose = rest(track.part.as_str());
            (
                track.part.as_str(),
                sample_track(track, &clip.times, t, &rest_pose),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_lookup_clamps_and_interpolates() {
        let times = [0.0, 1.0, 3.0];
        assert_eq!(find_segment(&times, -1.0), (0, 0, 0.0));
        assert_eq!(find_segment(&times, 5.0), (2, 2, 0.0));
        assert_eq!(find_segment(&times, 0.5), (0, 1, 0.5));
        assert_eq!(find_segment(&times, 2.0), (1, 2, 0.5));
        // Exactly on an interior key starts the following segment.
        assert_eq!(find_segment(&times, 1.0), (1, 2, 0.0));
        assert_eq!(find_segment(&[], 1.0), (0, 0, 0.0));
    }

    #[test]
    fn nan_time_holds_first_key() {
        let times = [0.0, 1.0, 3.0];
        assert_eq!(find_segment(&times, f32::NAN), (0, 0, 0.0));
        assert_eq!(find_segment(&times, f32::INFINITY), (2, 2, 0.0));
    }

    #[test]
    fn duplicate_times_do_not_divide_by_zero() {
        let times = [0.0, 1.0, 1.0, 2.0];
        let (i0, i1, lt) = find_segment(&times, 1.5);
        assert_eq!((i0, i1), (2, 3));
        assert!((lt - 0.5).abs() < 1e-6);
    }

    #[test]
    fn missing_channels_fall_back_to_rest() {
        let track = PartTrack {
            part: "Arm".into(),
            positions: None,
            rotations: Some(vec![[0.0, 0.0, 0.0, 1.0], [0.0, 0.0, 1.0, 0.0]]),
        };
        let rest = PartPose {
            position: [1.0, 2.0, 3.0],
            rotation: [0.0, 0.0, 0.0, 1.0],
        };
        let pose = sample_track(&track, &[0.0, 1.0], 1.0, &rest);
        assert_eq!(pose.position, [1.0, 2.0, 3.0]);
        assert!((pose.rotation[2] - 1.0).abs() < 1e-6);
    }
}
