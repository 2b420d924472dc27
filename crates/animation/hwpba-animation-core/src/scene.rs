//! In-process scene graph host.
//!
//! A minimal entity tree used by tests, the CLI and the component lifecycle.
//! Parts are looked up by name under a character root. A mesh-less entity
//! with the same parent and the exact name of a part is that part's collider
//! and follows the part's pose when outputs are applied.

use hwpba_manifest::{Quat, Vec3};
use indexmap::IndexMap;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::binding::{PartHandle, PartResolver};
use crate::error::AnimationError;
use crate::interp::{mul_quat, rotate_vec3, IDENTITY_QUAT};
use crate::outputs::Outputs;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u64);

#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    pub parent: Option<EntityId>,
    pub children: Vec<EntityId>,
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    pub has_mesh: bool,
}

#[derive(Debug, Default)]
pub struct SceneGraph {
    entities: IndexMap<EntityId, Entity>,
    next: u64,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Add an entity under `parent` (or at the top level).
    pub fn spawn(
        &mut self,
        name: &str,
        parent: Option<EntityId>,
        position: Vec3,
        has_mesh: bool,
    ) -> Result<EntityId, AnimationError> {
        if let Some(pid) = parent {
            if !self.entities.contains_key(&pid) {
                return Err(AnimationError::EntityNotFound { id: pid.0 });
            }
        }
        let id = EntityId(self.next);
        self.next += 1;
        self.entities.insert(
            id,
            Entity {
                id,
                name: name.to_string(),
                parent,
                children: Vec::new(),
                position,
                rotation: IDENTITY_QUAT,
                scale: [1.0; 3],
                has_mesh,
            },
        );
        if let Some(p) = parent.and_then(|pid| self.entities.get_mut(&pid)) {
            p.children.push(id);
        }
        Ok(id)
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Depth-first search below `root` for `name`. Mesh entities win over
    /// empties of the same name so a part resolves to its mesh, not its collider.
    pub fn find_descendant(&self, root: EntityId, name: &str) -> Option<EntityId> {
        let mut fallback = None;
        let mut stack: Vec<EntityId> = self
            .get(root)
            .map(|e| e.children.iter().rev().copied().collect())
            .unwrap_or_default();
        while let Some(id) = stack.pop() {
            let Some(e) = self.get(id) else { continue };
            if e.name == name {
                if e.has_mesh {
                    return Some(id);
                }
                fallback.get_or_insert(id);
            }
            stack.extend(e.children.iter().rev().copied());
        }
        fallback
    }

    /// Empty entities sharing `part`'s parent and exact name.
    pub fn collider_siblings(&self, part: EntityId) -> Vec<EntityId> {
        let Some(p) = self.get(part) else {
            return Vec::new();
        };
        self.entities
            .values()
            .filter(|e| e.id != part && e.parent == p.parent && e.name == p.name && !e.has_mesh)
            .map(|e| e.id)
            .collect()
    }

    /// Write every bound change to its entity (and colliders). Returns the
    /// number of entities updated.
    pub fn apply(&mut self, outputs: &Outputs, colliders_follow: bool) -> usize {
        let mut touched = 0;
        for change in &outputs.changes {
            let Some(handle) = change.handle else {
                continue;
            };
            let id = EntityId(handle);
            let Some(e) = self.get_mut(id) else {
                warn!("part '{}' bound to missing entity {handle}", change.part);
                continue;
            };
            e.position = change.pose.position;
            e.rotation = change.pose.rotation;
            touched += 1;

            if colliders_follow {
                for cid in self.collider_siblings(id) {
                    if let Some(c) = self.get_mut(cid) {
                        c.position = change.pose.position;
                        c.rotation = change.pose.rotation;
                        touched += 1;
                    }
                }
            }
        }
        touched
    }

    /// World position of `id`, composing parent translation, rotation and scale.
    pub fn world_position(&self, id: EntityId) -> Result<Vec3, AnimationError> {
        let (pos, _, _) = self.world_transform(id)?;
        Ok(pos)
    }

    fn world_transform(&self, id: EntityId) -> Result<(Vec3, Quat, Vec3), AnimationError> {
        let e = self
            .get(id)
            .ok_or(AnimationError::EntityNotFound { id: id.0 })?;
        let Some(pid) = e.parent else {
            return Ok((e.position, e.rotation, e.scale));
        };
        let (ppos, prot, pscale) = self.world_transform(pid)?;
        let scaled = [
            e.position[0] * pscale[0],
            e.position[1] * pscale[1],
            e.position[2] * pscale[2],
        ];
        let r = rotate_vec3(prot, scaled);
        Ok((
            [ppos[0] + r[0], ppos[1] + r[1], ppos[2] + r[2]],
            mul_quat(prot, e.rotation),
            [
                pscale[0] * e.scale[0],
                pscale[1] * e.scale[1],
                pscale[2] * e.scale[2],
            ],
        ))
    }
}

/// Resolves part names to entities below a character root.
pub struct SceneResolver<'a> {
    pub scene: &'a SceneGraph,
    pub root: EntityId,
}

impl PartResolver for SceneResolver<'_> {
    fn resolve(&mut self, name: &str) -> Option<PartHandle> {
        self.scene.find_descendant(self.root, name).map(|id| id.0)
    }
}
