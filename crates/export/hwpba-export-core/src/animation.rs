//! Clip extraction.
//!
//! Each glTF animation becomes one manifest clip. The clip's shared `times`
//! is the longest input array of any of its channels. Rotation and
//! translation channels keyed on a different time base are resampled onto
//! the shared times, then converted to host axes. Scale and morph weight
//! channels are dropped. Channels on a skinned part's driving joint are keyed
//! by the part name.

use glam::{Quat, Vec3};
use gltf::animation::util::ReadOutputs;
use gltf::animation::{Interpolation, Property};
use hwpba_manifest::{gltf_rotation_to_host, gltf_translation_to_host, ClipEntry};
use indexmap::IndexMap;
use log::{debug, warn};

use crate::gltf_source::{node_name, GltfSource};
use crate::parts::{joint_targets, Part};

const TIME_EPSILON: f32 = 1e-6;

#[derive(Clone, Debug, PartialEq)]
pub enum ChannelValues {
    Translations(Vec<[f32; 3]>),
    Rotations(Vec<[f32; 4]>),
}

/// One rotation/translation channel, keyframe values only.
#[derive(Clone, Debug, PartialEq)]
pub struct Channel {
    pub node: usize,
    pub target: String,
    pub interpolation: Interpolation,
    pub inputs: Vec<f32>,
    pub values: ChannelValues,
}

/// CUBICSPLINE outputs are (in-tangent, value, out-tangent) triples.
fn keyframe_values<T: Copy>(raw: Vec<T>, interpolation: Interpolation) -> Vec<T> {
    match interpolation {
        Interpolation::CubicSpline => raw.chunks(3).filter_map(|c| c.get(1).copied()).collect(),
        _ => raw,
    }
}

fn same_times(a: &[f32], b: &[f32]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() <= TIME_EPSILON)
}

fn resample<T: Copy>(
    inputs: &[f32],
    values: &[T],
    interpolation: Interpolation,
    times: &[f32],
    mix: impl Fn(T, T, f32) -> T,
) -> Vec<T> {
    let n = inputs.len().min(values.len());
    if n == 0 {
        return Vec::new();
    }
    if n == values.len() && same_times(&inputs[..n], times) {
        return values.to_vec();
    }
    let (inputs, values) = (&inputs[..n], &values[..n]);
    times
        .iter()
        .map(|&t| {
            let idx = inputs.partition_point(|&x| x <= t);
            if idx == 0 {
                return values[0];
            }
            if idx >= n {
                return values[n - 1];
            }
            let (i0, i1) = (idx - 1, idx);
            match interpolation {
                Interpolation::Step => values[i0],
                // Cubic segments are approximated linearly between their values.
                Interpolation::Linear | Interpolation::CubicSpline => {
                    let span = inputs[i1] - inputs[i0];
                    let u = if span > 0.0 { (t - inputs[i0]) / span } else { 0.0 };
                    mix(values[i0], values[i1], u)
                }
            }
        })
        .collect()
}

pub fn resample_translations(
    inputs: &[f32],
    values: &[[f32; 3]],
    interpolation: Interpolation,
    times: &[f32],
) -> Vec<[f32; 3]> {
    resample(inputs, values, interpolation, times, |a, b, u| {
        Vec3::from_array(a).lerp(Vec3::from_array(b), u).to_array()
    })
}

/// Shortest-arc NLERP between keys.
pub fn resample_rotations(
    inputs: &[f32],
    values: &[[f32; 4]],
    interpolation: Interpolation,
    times: &[f32],
) -> Vec<[f32; 4]> {
    resample(inputs, values, interpolation, times, |a, b, u| {
        Quat::from_array(a).lerp(Quat::from_array(b), u).to_array()
    })
}

/// Read every rotation/translation channel of `animation`. Also returns the
/// longest input array of any channel (scale and morph channels included).
pub fn read_channels(source: &GltfSource, animation: &gltf::Animation) -> (Vec<Channel>, Vec<f32>) {
    let mut shared: Vec<f32> = Vec::new();
    let mut channels = Vec::new();

    for channel in animation.channels() {
        let reader = channel.reader(|buffer| Some(&source.buffers[buffer.index()]));
        let Some(inputs) = reader.read_inputs() else {
            continue;
        };
        let inputs: Vec<f32> = inputs.collect();
        if inputs.len() > shared.len() {
            shared = inputs.clone();
        }

        let node = channel.target().node();
        let interpolation = channel.sampler().interpolation();
        let values = match (channel.target().property(), reader.read_outputs()) {
            (Property::Translation, Some(ReadOutputs::Translations(it))) => {
                ChannelValues::Translations(keyframe_values(it.collect(), interpolation))
            }
            (Property::Rotation, Some(ReadOutputs::Rotations(it))) => {
                ChannelValues::Rotations(keyframe_values(it.into_f32().collect(), interpolation))
            }
            (Property::Translation | Property::Rotation, _) => {
                warn!(
                    "channel on '{}' has unreadable outputs; skipped",
                    node_name(&node)
                );
                continue;
            }
            (property, _) => {
                debug!("dropping {property:?} channel on '{}'", node_name(&node));
                continue;
            }
        };

        channels.push(Channel {
            node: node.index(),
            target: node_name(&node),
            interpolation,
            inputs,
            values,
        });
    }
    (channels, shared)
}

/// Extract every animation as a manifest clip, keyed by clip name.
pub fn extract_animations(source: &GltfSource, parts: &[Part]) -> IndexMap<String, ClipEntry> {
    let targets = joint_targets(parts);
    let mut clips = IndexMap::new();

    for animation in source.document.animations() {
        let name = match animation.name() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("Animation{}", animation.index()),
        };
        let (channels, times) = read_channels(source, &animation);

        let mut entry = ClipEntry {
            times,
            ..Default::default()
        };
        for mut ch in channels {
            if let Some(part) = targets.get(&ch.node) {
                ch.target = part.clone();
            }
            match &ch.values {
                ChannelValues::Rotations(values) => {
                    let track =
                        resample_rotations(&ch.inputs, values, ch.interpolation, &entry.times)
                            .into_iter()
                            .map(gltf_rotation_to_host)
                            .collect();
                    entry.rotations.insert(ch.target, track);
                }
                ChannelValues::Translations(values) => {
                    let track =
                        resample_translations(&ch.inputs, values, ch.interpolation, &entry.times)
                            .into_iter()
                            .map(gltf_translation_to_host)
                            .collect();
                    entry.positions.insert(ch.target, track);
                }
            }
        }

        debug!(
            "clip '{name}': {} key(s), {} rotation and {} position track(s)",
            entry.times.len(),
            entry.rotations.len(),
            entry.positions.len()
        );
        clips.insert(name, entry);
    }
    clips
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_time_base_is_copied() {
        let v = [[0.0, 0.0, 0.0], [1.0, 2.0, 3.0]];
        let out = resample_translations(&[0.0, 1.0], &v, Interpolation::Linear, &[0.0, 1.0]);
        assert_eq!(out, v.to_vec());
    }

    #[test]
    fn linear_resample_interpolates_and_holds_ends() {
        let v = [[0.0, 0.0, 0.0], [0.0, 3.0, 0.0]];
        let out = resample_translations(&[1.0, 2.5], &v, Interpolation::Linear, &[0.0, 1.5, 3.0]);
        assert_eq!(out[0], [0.0, 0.0, 0.0]);
        assert!((out[1][1] - 1.0).abs() < 1e-5);
        assert_eq!(out[2], [0.0, 3.0, 0.0]);
    }

    #[test]
    fn step_resample_holds_left_key() {
        let v = [[0.0; 3], [1.0; 3]];
        let out = resample_translations(&[0.0, 1.0], &v, Interpolation::Step, &[0.0, 0.99, 1.0]);
        assert_eq!(out, vec![[0.0; 3], [0.0; 3], [1.0; 3]]);
    }

    #[test]
    fn cubic_spline_keeps_value_elements() {
        let raw = vec![[9.0; 3], [1.0; 3], [9.0; 3], [8.0; 3], [2.0; 3], [8.0; 3]];
        assert_eq!(
            keyframe_values(raw, Interpolation::CubicSpline),
            vec![[1.0; 3], [2.0; 3]]
        );
    }

    #[test]
    fn rotation_resample_takes_shortest_arc() {
        let a = [0.0, 0.0, 0.0, 1.0];
        let b = [0.0, 0.0, 0.0, -1.0];
        let out = resample_rotations(&[0.0, 1.0], &[a, b], Interpolation::Linear, &[0.5]);
        assert!((out[0][3].abs() - 1.0).abs() < 1e-5);
    }
}
