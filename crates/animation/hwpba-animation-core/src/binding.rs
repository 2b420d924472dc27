//! Part binding.
//!
//! Manifests name parts; hosts address them by handle. `Engine::prebind()`
//! asks a `PartResolver` for each part of each character once and records the
//! handles in a `BindingTable`. Lookup tries the bare part name first, then
//! the character's name prefix + part name (the uploaded model names).

use crate::ids::CharacterId;

/// Opaque host handle for a part entity.
pub type PartHandle = u64;

/// Adapters implement this and pass it into `Engine::prebind()`.
pub trait PartResolver {
    fn resolve(&mut self, name: &str) -> Option<PartHandle>;
}

/// Resolve `part`, retrying with `prefix` prepended.
pub fn resolve_part(
    resolver: &mut dyn PartResolver,
    prefix: &str,
    part: &str,
) -> Option<PartHandle> {
    resolver.resolve(part).or_else(|| {
        if prefix.is_empty() {
            None
        } else {
            resolver.resolve(&format!("{prefix}{part}"))
        }
    })
}

/// One row in the binding table.
#[derive(Clone, Debug)]
pub struct BindingRow {
    pub character: CharacterId,
    pub part: String,
    pub handle: PartHandle,
}

#[derive(Default, Debug)]
pub struct BindingTable {
    pub rows: Vec<BindingRow>,
}

impl BindingTable {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn get(&self, character: CharacterId, part: &str) -> Option<PartHandle> {
        self.rows
            .iter()
            .find(|r| r.character == character && r.part == part)
            .map(|r| r.handle)
    }

    /// Insert or update a binding row.
    pub fn upsert(&mut self, character: CharacterId, part: &str, handle: PartHandle) {
        if let Some(row) = self
            .rows
            .iter_mut()
            .find(|r| r.character == character && r.part == part)
        {
            row.handle = handle;
        } else {
            self.rows.push(BindingRow {
                character,
                part: part.to_string(),
                handle,
            });
        }
    }

    pub fn clear_character(&mut self, character: CharacterId) {
        self.rows.retain(|r| r.character != character);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapResolver(HashMap<String, PartHandle>);
    impl PartResolver for MapResolver {
        fn resolve(&mut self, name: &str) -> Option<PartHandle> {
            self.0.get(name).copied()
        }
    }

    #[test]
    fn prefixed_name_is_tried_second() {
        let mut r = MapResolver(HashMap::from([
            ("Goblin_Arm".to_string(), 7),
            ("Body".to_string(), 3),
        ]));
        assert_eq!(resolve_part(&mut r, "Goblin_", "Arm"), Some(7));
        assert_eq!(resolve_part(&mut r, "Goblin_", "Body"), Some(3));
        assert_eq!(resolve_part(&mut r, "", "Arm"), None);
    }

    #[test]
    fn upsert_replaces_existing_row() {
        let mut t = BindingTable::new();
        t.upsert(CharacterId(0), "Arm", 1);
        t.upsert(CharacterId(0), "Arm", 2);
        t.upsert(CharacterId(1), "Arm", 3);
        assert_eq!(t.rows.len(), 2);
        assert_eq!(t.get(CharacterId(0), "Arm"), Some(2));
        t.clear_character(CharacterId(0));
        assert_eq!(t.get(CharacterId(0), "Arm"), None);
    }
}
