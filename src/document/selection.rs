// Selection state and caret-derived queries

use super::content::ContentState;
use super::entity::{EntityKey, EntityRegistry, Mutability};

/// Anchor/focus pair addressing block keys and character offsets
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    pub anchor_key: String,
    pub anchor_offset: usize,
    pub focus_key: String,
    pub focus_offset: usize,
    /// True when the focus precedes the anchor in document order
    pub is_backward: bool,
}

impl SelectionState {
    pub fn collapsed(key: impl Into<String>, offset: usize) -> Self {
        let key = key.into();
        SelectionState {
            anchor_key: key.clone(),
            anchor_offset: offset,
            focus_key: key,
            focus_offset: offset,
            is_backward: false,
        }
    }

    /// Forward selection from (start_key, start_offset) to (end_key, end_offset)
    pub fn range(
        start_key: impl Into<String>,
        start_offset: usize,
        end_key: impl Into<String>,
        end_offset: usize,
    ) -> Self {
        SelectionState {
            anchor_key: start_key.into(),
            anchor_offset: start_offset,
            focus_key: end_key.into(),
            focus_offset: end_offset,
            is_backward: false,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor_key == self.focus_key && self.anchor_offset == self.focus_offset
    }

    pub fn start_key(&self) -> &str {
        if self.is_backward { &self.focus_key } else { &self.anchor_key }
    }

    pub fn start_offset(&self) -> usize {
        if self.is_backward { self.focus_offset } else { self.anchor_offset }
    }

    pub fn end_key(&self) -> &str {
        if self.is_backward { &self.anchor_key } else { &self.focus_key }
    }

    pub fn end_offset(&self) -> usize {
        if self.is_backward { self.anchor_offset } else { self.focus_offset }
    }
}

/// Entity that newly inserted characters should carry at the current selection.
///
/// Only mutable entities extend to inserted text; anything else yields `None`.
pub fn get_entity_key_for_selection(
    content: &ContentState,
    selection: &SelectionState,
    entities: &EntityRegistry,
) -> Option<EntityKey> {
    let entity_key = if selection.is_collapsed() {
        let offset = selection.anchor_offset;
        if offset == 0 {
            return None;
        }
        content
            .block_for_key(&selection.anchor_key)?
            .entity_at(offset - 1)
    } else {
        let block = content.block_for_key(selection.start_key())?;
        if selection.start_offset() == block.len() {
            None
        } else {
            block.entity_at(selection.start_offset())
        }
    };

    let key = entity_key?;
    match entities.get(key) {
        Some(entity) if entity.mutability == Mutability::Mutable => Some(key.clone()),
        _ => None,
    }
}
