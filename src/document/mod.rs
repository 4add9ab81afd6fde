// Document model consumed by the paste path

pub mod content;
pub mod entity;
pub mod modifier;
pub mod selection;

pub use content::{
    BlockType, CharacterMetadata, ContentBlock, ContentState, Fragment, InlineStyle,
    generate_block_key,
};
pub use entity::{Entity, EntityData, EntityKey, EntityRegistry, Mutability};
pub use modifier::{remove_range, replace_with_fragment};
pub use selection::{SelectionState, get_entity_key_for_selection};
