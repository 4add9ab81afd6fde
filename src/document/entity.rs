// Entities
// Out-of-band metadata attached to runs of characters by key

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Reference to an entity stored in an [`EntityRegistry`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityKey(String);

impl EntityKey {
    pub fn new(key: impl Into<String>) -> Self {
        EntityKey(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How an entity behaves when the text it covers is edited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mutability {
    /// Text may be edited freely; typing at the edge extends the entity
    Mutable,
    /// Any edit removes the entity
    Immutable,
    /// Edits remove whole whitespace-delimited segments
    Segmented,
}

/// Opaque entity payload
pub type EntityData = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub entity_type: String,
    pub mutability: Mutability,
    pub data: EntityData,
}

/// Storage for all entities of an editor instance.
///
/// Keys are decimal strings handed out in increasing order and never reused,
/// so a key always resolves to the entity it was created for.
#[derive(Debug, Default)]
pub struct EntityRegistry {
    entities: HashMap<EntityKey, Entity>,
    next_key: u64,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an entity
    pub fn get(&self, key: &EntityKey) -> Option<&Entity> {
        self.entities.get(key)
    }

    /// Create a new entity and return its key
    pub fn create(
        &mut self,
        entity_type: impl Into<String>,
        mutability: Mutability,
        data: EntityData,
    ) -> EntityKey {
        self.next_key += 1;
        let key = EntityKey(self.next_key.to_string());
        self.entities.insert(
            key.clone(),
            Entity {
                entity_type: entity_type.into(),
                mutability,
                data,
            },
        );
        key
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
