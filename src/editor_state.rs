// Editor state snapshots with undo/redo history

use std::rc::Rc;

use crate::document::{ContentState, InlineStyle, SelectionState};

const MAX_HISTORY_SIZE: usize = 100;

/// The kind of change that produced a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeType {
    AdjustDepth,
    ApplyEntity,
    BackspaceCharacter,
    ChangeBlockData,
    ChangeBlockType,
    ChangeInlineStyle,
    DeleteCharacter,
    InsertCharacters,
    InsertFragment,
    MoveBlock,
    RemoveRange,
    SplitBlock,
    Undo,
    Redo,
}

impl ChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::AdjustDepth => "adjust-depth",
            ChangeType::ApplyEntity => "apply-entity",
            ChangeType::BackspaceCharacter => "backspace-character",
            ChangeType::ChangeBlockData => "change-block-data",
            ChangeType::ChangeBlockType => "change-block-type",
            ChangeType::ChangeInlineStyle => "change-inline-style",
            ChangeType::DeleteCharacter => "delete-character",
            ChangeType::InsertCharacters => "insert-characters",
            ChangeType::InsertFragment => "insert-fragment",
            ChangeType::MoveBlock => "move-block",
            ChangeType::RemoveRange => "remove-range",
            ChangeType::SplitBlock => "split-block",
            ChangeType::Undo => "undo",
            ChangeType::Redo => "redo",
        }
    }

    /// Block-level changes keep a pending inline style override alive
    fn keeps_style_override(&self) -> bool {
        matches!(
            self,
            ChangeType::AdjustDepth | ChangeType::ChangeBlockType | ChangeType::SplitBlock
        )
    }
}

#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub content: Rc<ContentState>,
    pub change_type: ChangeType,
}

/// Immutable editor snapshot. Every transition returns a new value.
#[derive(Debug, Clone)]
pub struct EditorState {
    current: Rc<ContentState>,
    selection: SelectionState,
    inline_style_override: Option<InlineStyle>,
    undo_stack: Vec<HistoryEntry>,
    redo_stack: Vec<HistoryEntry>,
    last_change_type: Option<ChangeType>,
}

impl EditorState {
    /// Fresh state with the caret at the start of the document
    pub fn create_with_content(content: ContentState) -> Self {
        let selection = content
            .first_block()
            .map(|b| SelectionState::collapsed(b.key.clone(), 0))
            .unwrap_or_default();
        EditorState {
            current: Rc::new(content),
            selection,
            inline_style_override: None,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            last_change_type: None,
        }
    }

    pub fn create_empty() -> Self {
        Self::create_with_content(ContentState::from_blocks(Vec::new()))
    }

    pub fn current_content(&self) -> &ContentState {
        &self.current
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn last_change_type(&self) -> Option<ChangeType> {
        self.last_change_type
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Same content, different selection. Not recorded in the history.
    pub fn with_selection(&self, selection: SelectionState) -> Self {
        EditorState {
            selection,
            inline_style_override: None,
            ..self.clone()
        }
    }

    /// Style that the next inserted characters should carry until the caret moves
    pub fn with_inline_style_override(&self, style: InlineStyle) -> Self {
        EditorState {
            inline_style_override: Some(style),
            ..self.clone()
        }
    }

    /// Commit `content` as a new snapshot following `prior`.
    ///
    /// The prior content goes onto the undo stack tagged with `change_type`,
    /// the redo stack is cleared and the selection moves to the content's
    /// `selection_after`.
    pub fn push(prior: &EditorState, content: ContentState, change_type: ChangeType) -> Self {
        let mut undo_stack = prior.undo_stack.clone();
        undo_stack.push(HistoryEntry {
            content: Rc::clone(&prior.current),
            change_type,
        });
        if undo_stack.len() > MAX_HISTORY_SIZE {
            undo_stack.remove(0);
        }

        let inline_style_override = if change_type.keeps_style_override() {
            prior.inline_style_override.clone()
        } else {
            None
        };

        EditorState {
            selection: content.selection_after.clone(),
            current: Rc::new(content),
            inline_style_override,
            undo_stack,
            redo_stack: Vec::new(),
            last_change_type: Some(change_type),
        }
    }

    /// Step back one change, or return `None` if there is nothing to undo
    pub fn undo(&self) -> Option<Self> {
        let mut undo_stack = self.undo_stack.clone();
        let entry = undo_stack.pop()?;
        let mut redo_stack = self.redo_stack.clone();
        redo_stack.push(HistoryEntry {
            content: Rc::clone(&self.current),
            change_type: entry.change_type,
        });

        Some(EditorState {
            selection: self.current.selection_before.clone(),
            current: entry.content,
            inline_style_override: None,
            undo_stack,
            redo_stack,
            last_change_type: Some(ChangeType::Undo),
        })
    }

    /// Re-apply the last undone change
    pub fn redo(&self) -> Option<Self> {
        let mut redo_stack = self.redo_stack.clone();
        let entry = redo_stack.pop()?;
        let mut undo_stack = self.undo_stack.clone();
        undo_stack.push(HistoryEntry {
            content: Rc::clone(&self.current),
            change_type: entry.change_type,
        });

        Some(EditorState {
            selection: entry.content.selection_after.clone(),
            current: entry.content,
            inline_style_override: None,
            undo_stack,
            redo_stack,
            last_change_type: Some(ChangeType::Redo),
        })
    }

    /// Inline style for characters typed or pasted at the current selection
    pub fn current_inline_style(&self) -> InlineStyle {
        if let Some(style) = &self.inline_style_override {
            return style.clone();
        }

        let content = &self.current;
        let key = self.selection.start_key();
        let offset = self.selection.start_offset();
        let Some(block) = content.block_for_key(key) else {
            return InlineStyle::new();
        };

        if offset > 0 {
            return block.style_at(offset - 1).cloned().unwrap_or_default();
        }
        if !block.is_empty() {
            return block.style_at(0).cloned().unwrap_or_default();
        }
        look_upward_for_inline_style(content, key)
    }
}

/// Style of the last character of the nearest non-empty block above `key`
fn look_upward_for_inline_style<'a>(content: &'a ContentState, key: &'a str) -> InlineStyle {
    let mut current = key;
    while let Some(block) = content.block_before(current) {
        if !block.is_empty() {
            return block.style_at(block.len() - 1).cloned().unwrap_or_default();
        }
        current = &block.key;
    }
    InlineStyle::new()
}
