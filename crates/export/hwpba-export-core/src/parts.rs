//! Part discovery and world transforms.
//!
//! Parts are the mesh nodes of the rig. Search order:
//! 1. an explicitly named source node: mesh nodes in its subtree (itself included)
//! 2. mesh nodes bound to a skin
//! 3. the subtree of a node named `hw_parts` (case-insensitive)
//! 4. every mesh node of the default scene
//!
//! A source node that is missing or holds no meshes falls through to 2..4.
//! Skinned parts remember the joint that drives them; clips key that joint's
//! channels by the part name.

use glam::{Mat4, Vec3};
use hwpba_manifest::{gltf_translation_to_host, Vec3 as HostVec3};
use indexmap::IndexMap;
use log::{debug, warn};

use crate::gltf_source::{node_name, GltfSource};

#[derive(Clone, Debug, PartialEq)]
pub struct Part {
    pub node: usize,
    pub name: String,
    pub mesh: Option<usize>,
    pub world: Mat4,
    /// Joint node whose channels animate this part (skinned rigs only).
    pub joint: Option<usize>,
}

impl Part {
    pub fn world_translation(&self) -> Vec3 {
        self.world.w_axis.truncate()
    }

    /// World translation in host axes (the manifest's `initialPositions`).
    pub fn initial_position(&self) -> HostVec3 {
        gltf_translation_to_host(self.world_translation().to_array())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PartSearch<'a> {
    /// Use the named node's subtree.
    SourceNode(&'a str),
    Auto,
}

/// Pre-order node indices of `node`'s subtree.
fn subtree(node: gltf::Node, out: &mut Vec<usize>) {
    out.push(node.index());
    for child in node.children() {
        subtree(child, out);
    }
}

fn scene_order(document: &gltf::Document) -> Vec<usize> {
    let mut order = Vec::new();
    match document.default_scene().or_else(|| document.scenes().next()) {
        Some(scene) => {
            for root in scene.nodes() {
                subtree(root, &mut order);
            }
        }
        None => {
            let mut has_parent = vec![false; document.nodes().len()];
            for node in document.nodes() {
                for child in node.children() {
                    has_parent[child.index()] = true;
                }
            }
            for node in document.nodes().filter(|n| !has_parent[n.index()]) {
                subtree(node, &mut order);
            }
        }
    }
    order
}

/// World matrix of every node, indexed by node index.
pub fn world_transforms(document: &gltf::Document) -> Vec<Mat4> {
    let mut world = vec![Mat4::IDENTITY; document.nodes().len()];
    let mut visited = vec![false; world.len()];

    fn walk(node: gltf::Node, parent: Mat4, world: &mut [Mat4], visited: &mut [bool]) {
        let i = node.index();
        if visited[i] {
            return;
        }
        visited[i] = true;
        world[i] = parent * Mat4::from_cols_array_2d(&node.transform().matrix());
        for child in node.children() {
            walk(child, world[i], world, visited);
        }
    }

    for scene in document.scenes() {
        for root in scene.nodes() {
            walk(root, Mat4::IDENTITY, &mut world, &mut visited);
        }
    }
    // Nodes outside every scene: compose from their own roots.
    let mut has_parent = vec![false; world.len()];
    for node in document.nodes() {
        for child in node.children() {
            has_parent[child.index()] = true;
        }
    }
    for node in document.nodes() {
        if !has_parent[node.index()] {
            walk(node, Mat4::IDENTITY, &mut world, &mut visited);
        }
    }
    world
}

fn make_parts(source: &GltfSource, indices: &[usize], world: &[Mat4]) -> Vec<Part> {
    let mut seen: IndexMap<usize, Part> = IndexMap::new();
    for &i in indices {
        let Some(node) = source.document.nodes().nth(i) else {
            continue;
        };
        let Some(mesh) = node.mesh() else {
            continue;
        };
        seen.entry(i).or_insert_with(|| Part {
            node: i,
            name: node_name(&node),
            mesh: Some(mesh.index()),
            world: world[i],
            joint: None,
        });
    }
    seen.into_values().collect()
}

/// Joint carrying most of the skin weight of `node`'s mesh. A single-joint
/// skin is its own answer.
fn driving_joint(source: &GltfSource, node: &gltf::Node) -> Option<usize> {
    let skin = node.skin()?;
    let joints: Vec<usize> = skin.joints().map(|j| j.index()).collect();
    if joints.len() == 1 {
        return joints.first().copied();
    }

    let mut totals = vec![0.0f32; joints.len()];
    for primitive in node.mesh()?.primitives() {
        let reader = primitive.reader(|buffer| source.buffers.get(buffer.index()).map(|d| &d[..]));
        let (Some(ids), Some(weights)) = (reader.read_joints(0), reader.read_weights(0)) else {
            continue;
        };
        for (ids, weights) in ids.into_u16().zip(weights.into_f32()) {
            for (j, w) in ids.iter().zip(weights) {
                if let Some(total) = totals.get_mut(*j as usize) {
                    *total += w;
                }
            }
        }
    }
    totals
        .iter()
        .enumerate()
        .filter(|(_, w)| **w > 0.0)
        .max_by(|a, b| a.1.total_cmp(b.1))
        .and_then(|(i, _)| joints.get(i).copied())
}

/// Channel target names that differ from node names: each skinned part's
/// driving joint is keyed by the part name. A joint shared by several parts
/// keeps the first.
pub fn joint_targets(parts: &[Part]) -> IndexMap<usize, String> {
    let mut targets = IndexMap::new();
    for part in parts {
        let Some(joint) = part.joint else {
            continue;
        };
        if let Some(first) = targets.get(&joint) {
            warn!(
                "parts '{first}' and '{}' share joint {joint}; keeping '{first}'",
                part.name
            );
            continue;
        }
        targets.insert(joint, part.name.clone());
    }
    targets
}

/// Discover parts; returns them with a label describing where they came from.
pub fn find_parts(source: &GltfSource, search: PartSearch<'_>) -> (Vec<Part>, String) {
    let doc = &source.document;
    let world = world_transforms(doc);

    let mut fallback_note = String::new();
    if let PartSearch::SourceNode(name) = search {
        match doc.nodes().find(|n| n.name() == Some(name)) {
            Some(node) => {
                let mut order = Vec::new();
                subtree(node, &mut order);
                let parts = make_parts(source, &order, &world);
                debug!("{} part(s) under source node '{name}'", parts.len());
                if !parts.is_empty() {
                    return (parts, format!("Source node: {name}"));
                }
                warn!("source node '{name}' has no meshes; searching the whole file");
                fallback_note = format!(" (source node '{name}' has no meshes)");
            }
            None => {
                warn!("source node '{name}' not found; searching the whole file");
                fallback_note = format!(" (source node '{name}' not found)");
            }
        }
    }

    let (parts, label) = auto_parts(source, &world);
    (parts, format!("{label}{fallback_note}"))
}

fn auto_parts(source: &GltfSource, world: &[Mat4]) -> (Vec<Part>, String) {
    let doc = &source.document;
    let order = scene_order(doc);

    let skinned: Vec<usize> = order
        .iter()
        .copied()
        .filter(|&i| {
            doc.nodes()
                .nth(i)
                .is_some_and(|n| n.skin().is_some() && n.mesh().is_some())
        })
        .collect();
    if !skinned.is_empty() {
        let mut parts = make_parts(source, &skinned, world);
        for part in &mut parts {
            part.joint = doc
                .nodes()
                .nth(part.node)
                .and_then(|n| driving_joint(source, &n));
            if part.joint.is_none() {
                warn!("skinned part '{}' has no weighted joint; it will not animate", part.name);
            }
        }
        return (parts, "Skinned rig".to_string());
    }

    if let Some(container) = doc
        .nodes()
        .find(|n| n.name().is_some_and(|s| s.eq_ignore_ascii_case("hw_parts")))
    {
        let mut sub = Vec::new();
        for child in container.children() {
            subtree(child, &mut sub);
        }
        let parts = make_parts(source, &sub, world);
        if !parts.is_empty() {
            return (parts, format!("Container: {}", node_name(&container)));
        }
    }

    let parts = make_parts(source, &order, world);
    let label = match doc.default_scene().or_else(|| doc.scenes().next()) {
        Some(scene) => format!("Scene: {}", scene.name().unwrap_or("default")),
        None => "All nodes".to_string(),
    };
    (parts, label)
}
