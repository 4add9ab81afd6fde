use std::collections::{BTreeSet, HashMap};

use tracing::warn;

use crate::document::{EntityKey, EntityRegistry, Fragment};

/// Copy of `fragment` in which every referenced entity is replaced by a fresh
/// entity with the same type, mutability and data.
///
/// Text, styles and block order are untouched. Keys that do not resolve in
/// the registry are left as they are.
pub fn clone_entities_in_fragment(fragment: &Fragment, registry: &mut EntityRegistry) -> Fragment {
    let referenced: BTreeSet<&EntityKey> = fragment
        .blocks()
        .flat_map(|block| block.characters().iter())
        .filter_map(|c| c.entity.as_ref())
        .collect();

    let mut new_keys: HashMap<EntityKey, EntityKey> = HashMap::with_capacity(referenced.len());
    for key in referenced {
        let Some(entity) = registry.get(key).cloned() else {
            warn!(entity = %key, "fragment references an unknown entity");
            continue;
        };
        let new_key = registry.create(entity.entity_type, entity.mutability, entity.data);
        new_keys.insert(key.clone(), new_key);
    }

    Fragment::from_blocks(fragment.blocks().map(|block| {
        let mut updated = block.clone();
        block.find_entity_ranges(
            |c| c.entity.is_some(),
            |start, end| {
                if let Some(new_key) = block.entity_at(start).and_then(|k| new_keys.get(k)) {
                    updated = updated.apply_entity(start, end, Some(new_key));
                }
            },
        );
        updated
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{
        BlockType, CharacterMetadata, ContentBlock, EntityData, InlineStyle, Mutability,
    };

    #[test]
    fn test_clone_replaces_every_entity() {
        let mut registry = EntityRegistry::new();
        let mut data = EntityData::new();
        data.insert("url".to_string(), "https://example.com".to_string());
        let link = registry.create("LINK", Mutability::Mutable, data.clone());
        let mention = registry.create("MENTION", Mutability::Segmented, EntityData::new());

        let bold_link = CharacterMetadata::new(InlineStyle::new().with("BOLD"), Some(link.clone()));
        let plain = CharacterMetadata::plain();
        let tagged = CharacterMetadata::new(InlineStyle::new(), Some(mention.clone()));
        let fragment = Fragment::from_blocks(vec![
            ContentBlock::new(
                "a",
                BlockType::Unstyled,
                "abcd",
                vec![bold_link.clone(), bold_link, plain.clone(), tagged],
            ),
            ContentBlock::uniform("b", "no entities", &plain),
        ]);

        let cloned = clone_entities_in_fragment(&fragment, &mut registry);

        assert_eq!(registry.len(), 4);
        let keys: Vec<&str> = cloned.blocks().map(|b| b.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b"]);

        let block = cloned.get("a").unwrap();
        assert_eq!(block.text(), "abcd");
        let new_link = block.entity_at(0).unwrap();
        assert_ne!(*new_link, link);
        assert_eq!(block.entity_at(1), Some(new_link));
        assert!(block.entity_at(2).is_none());
        assert!(block.style_at(1).unwrap().contains("BOLD"));
        assert_ne!(*block.entity_at(3).unwrap(), mention);

        let entity = registry.get(new_link).unwrap();
        assert_eq!(entity.entity_type, "LINK");
        assert_eq!(entity.data, data);

        assert_eq!(cloned.get("b"), fragment.get("b"));
        assert_eq!(fragment.get("a").unwrap().entity_at(0), Some(&link));
    }

    #[test]
    fn test_shared_entity_across_blocks_maps_to_one_clone() {
        let mut registry = EntityRegistry::new();
        let key = registry.create("LINK", Mutability::Mutable, EntityData::new());
        let linked = CharacterMetadata::new(InlineStyle::new(), Some(key));
        let fragment = Fragment::from_blocks(vec![
            ContentBlock::uniform("a", "x", &linked),
            ContentBlock::uniform("b", "y", &linked),
        ]);

        let cloned = clone_entities_in_fragment(&fragment, &mut registry);

        assert_eq!(registry.len(), 2);
        assert_eq!(
            cloned.get("a").unwrap().entity_at(0),
            cloned.get("b").unwrap().entity_at(0)
        );
    }

    #[test]
    fn test_unknown_entity_is_left_alone() {
        let mut registry = EntityRegistry::new();
        let ghost = CharacterMetadata::new(InlineStyle::new(), Some(EntityKey::new("404")));
        let fragment = Fragment::from_blocks(vec![ContentBlock::uniform("a", "x", &ghost)]);

        let cloned = clone_entities_in_fragment(&fragment, &mut registry);

        assert!(registry.is_empty());
        assert_eq!(cloned, fragment);
    }
}
