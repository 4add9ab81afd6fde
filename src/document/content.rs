// Content model
// Blocks of text with per-character style and entity metadata

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::entity::EntityKey;
use super::selection::SelectionState;

/// Set of inline style tags (BOLD, ITALIC, ...)
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct InlineStyle(BTreeSet<String>);

impl InlineStyle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a copy of this style with `tag` added
    pub fn with(mut self, tag: impl Into<String>) -> Self {
        self.0.insert(tag.into());
        self
    }

    pub fn insert(&mut self, tag: impl Into<String>) {
        self.0.insert(tag.into());
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.contains(tag)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for InlineStyle {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        InlineStyle(iter.into_iter().map(Into::into).collect())
    }
}

/// Style and entity of a single character
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharacterMetadata {
    pub style: InlineStyle,
    pub entity: Option<EntityKey>,
}

impl CharacterMetadata {
    pub fn new(style: InlineStyle, entity: Option<EntityKey>) -> Self {
        CharacterMetadata { style, entity }
    }

    pub fn plain() -> Self {
        Self::default()
    }
}

/// Block-level types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockType {
    #[default]
    Unstyled,
    HeaderOne,
    HeaderTwo,
    HeaderThree,
    HeaderFour,
    HeaderFive,
    HeaderSix,
    UnorderedListItem,
    OrderedListItem,
    Blockquote,
    CodeBlock,
    Atomic,
}

impl BlockType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockType::Unstyled => "unstyled",
            BlockType::HeaderOne => "header-one",
            BlockType::HeaderTwo => "header-two",
            BlockType::HeaderThree => "header-three",
            BlockType::HeaderFour => "header-four",
            BlockType::HeaderFive => "header-five",
            BlockType::HeaderSix => "header-six",
            BlockType::UnorderedListItem => "unordered-list-item",
            BlockType::OrderedListItem => "ordered-list-item",
            BlockType::Blockquote => "blockquote",
            BlockType::CodeBlock => "code-block",
            BlockType::Atomic => "atomic",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        let block_type = match name {
            "unstyled" => BlockType::Unstyled,
            "header-one" => BlockType::HeaderOne,
            "header-two" => BlockType::HeaderTwo,
            "header-three" => BlockType::HeaderThree,
            "header-four" => BlockType::HeaderFour,
            "header-five" => BlockType::HeaderFive,
            "header-six" => BlockType::HeaderSix,
            "unordered-list-item" => BlockType::UnorderedListItem,
            "ordered-list-item" => BlockType::OrderedListItem,
            "blockquote" => BlockType::Blockquote,
            "code-block" => BlockType::CodeBlock,
            "atomic" => BlockType::Atomic,
            _ => return None,
        };
        Some(block_type)
    }
}

static NEXT_BLOCK_KEY: AtomicU64 = AtomicU64::new(1);

/// Generate a short block key that is unique within this process
pub fn generate_block_key() -> String {
    let mut n = NEXT_BLOCK_KEY.fetch_add(1, Ordering::Relaxed);
    let mut digits = Vec::new();
    while n > 0 {
        let digit = (n % 36) as u32;
        digits.push(char::from_digit(digit, 36).unwrap_or('0'));
        n /= 36;
    }
    while digits.len() < 5 {
        digits.push('0');
    }
    digits.iter().rev().collect()
}

/// Byte index of the `offset`-th character, clamped to the end of `text`
pub(crate) fn byte_index(text: &str, offset: usize) -> usize {
    text.char_indices()
        .nth(offset)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len())
}

/// A block of text. `characters` is aligned 1:1 with the chars of `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentBlock {
    pub key: String,
    pub block_type: BlockType,
    text: String,
    characters: Vec<CharacterMetadata>,
}

impl ContentBlock {
    /// Build a block, padding or truncating `characters` to the text length
    pub fn new(
        key: impl Into<String>,
        block_type: BlockType,
        text: impl Into<String>,
        mut characters: Vec<CharacterMetadata>,
    ) -> Self {
        let text = text.into();
        characters.resize(text.chars().count(), CharacterMetadata::plain());
        ContentBlock {
            key: key.into(),
            block_type,
            text,
            characters,
        }
    }

    /// An unstyled block where every character carries `character`
    pub fn uniform(key: impl Into<String>, text: impl Into<String>, character: &CharacterMetadata) -> Self {
        let text = text.into();
        let characters = vec![character.clone(); text.chars().count()];
        ContentBlock {
            key: key.into(),
            block_type: BlockType::Unstyled,
            text,
            characters,
        }
    }

    pub fn empty(key: impl Into<String>) -> Self {
        Self::new(key, BlockType::Unstyled, "", Vec::new())
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn characters(&self) -> &[CharacterMetadata] {
        &self.characters
    }

    /// Length in characters
    pub fn len(&self) -> usize {
        self.characters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }

    pub fn entity_at(&self, offset: usize) -> Option<&EntityKey> {
        self.characters.get(offset).and_then(|c| c.entity.as_ref())
    }

    pub fn style_at(&self, offset: usize) -> Option<&InlineStyle> {
        self.characters.get(offset).map(|c| &c.style)
    }

    /// Text and metadata of the character range [start..end)
    pub fn slice(&self, start: usize, end: usize) -> (String, Vec<CharacterMetadata>) {
        let end = end.min(self.len());
        let start = start.min(end);
        let text = self.text[byte_index(&self.text, start)..byte_index(&self.text, end)].to_string();
        (text, self.characters[start..end].to_vec())
    }

    /// Copy of this block with `text`/`characters` spliced in at `offset`
    pub fn splice(&self, offset: usize, text: &str, characters: &[CharacterMetadata]) -> Self {
        let offset = offset.min(self.len());
        let mut new_text = self.text.clone();
        new_text.insert_str(byte_index(&self.text, offset), text);
        let mut new_chars = self.characters.clone();
        new_chars.splice(offset..offset, characters.iter().cloned());
        ContentBlock {
            key: self.key.clone(),
            block_type: self.block_type,
            text: new_text,
            characters: new_chars,
        }
    }

    /// Report each maximal range of characters that share an entity and pass `filter`
    pub fn find_entity_ranges(
        &self,
        filter: impl Fn(&CharacterMetadata) -> bool,
        mut callback: impl FnMut(usize, usize),
    ) {
        let mut start: Option<usize> = None;
        for (idx, character) in self.characters.iter().enumerate() {
            if let Some(range_start) = start
                && self.characters[range_start].entity != character.entity
            {
                callback(range_start, idx);
                start = None;
            }
            if start.is_none() && filter(character) {
                start = Some(idx);
            }
        }
        if let Some(range_start) = start {
            callback(range_start, self.characters.len());
        }
    }

    /// Copy of this block with the entity of [start..end) set to `key`
    pub fn apply_entity(&self, start: usize, end: usize, key: Option<&EntityKey>) -> Self {
        let mut block = self.clone();
        let end = end.min(block.characters.len());
        for character in &mut block.characters[start.min(end)..end] {
            character.entity = key.cloned();
        }
        block
    }
}

/// Ordered map of blocks keyed by block key
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    blocks: IndexMap<String, ContentBlock>,
}

impl Fragment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from an ordered list of blocks; a later block with a duplicate key replaces the earlier one
    pub fn from_blocks(blocks: impl IntoIterator<Item = ContentBlock>) -> Self {
        Fragment {
            blocks: blocks.into_iter().map(|b| (b.key.clone(), b)).collect(),
        }
    }

    pub fn insert(&mut self, block: ContentBlock) {
        self.blocks.insert(block.key.clone(), block);
    }

    pub fn get(&self, key: &str) -> Option<&ContentBlock> {
        self.blocks.get(key)
    }

    pub fn first(&self) -> Option<&ContentBlock> {
        self.blocks.first().map(|(_, b)| b)
    }

    pub fn last(&self) -> Option<&ContentBlock> {
        self.blocks.last().map(|(_, b)| b)
    }

    pub fn blocks(&self) -> impl Iterator<Item = &ContentBlock> {
        self.blocks.values()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Plain text, blocks joined by newlines
    pub fn to_plain_text(&self) -> String {
        self.blocks().map(ContentBlock::text).collect::<Vec<_>>().join("\n")
    }
}

impl IntoIterator for Fragment {
    type Item = ContentBlock;
    type IntoIter = indexmap::map::IntoValues<String, ContentBlock>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks.into_values()
    }
}

/// The live document: a non-empty ordered block map plus the selections
/// recorded by the last modification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentState {
    blocks: IndexMap<String, ContentBlock>,
    pub selection_before: SelectionState,
    pub selection_after: SelectionState,
}

impl ContentState {
    /// Document from a list of blocks; an empty list yields one empty block
    pub fn from_blocks(blocks: impl IntoIterator<Item = ContentBlock>) -> Self {
        let mut blocks: IndexMap<String, ContentBlock> =
            blocks.into_iter().map(|b| (b.key.clone(), b)).collect();
        if blocks.is_empty() {
            let block = ContentBlock::empty(generate_block_key());
            blocks.insert(block.key.clone(), block);
        }
        let selection = blocks
            .first()
            .map(|(key, _)| SelectionState::collapsed(key.clone(), 0))
            .unwrap_or_default();
        ContentState {
            blocks,
            selection_before: selection.clone(),
            selection_after: selection,
        }
    }

    /// Unstyled document with one block per line of `text`
    pub fn from_text(text: &str) -> Self {
        Self::from_blocks(
            text.split('\n')
                .map(|line| ContentBlock::uniform(generate_block_key(), line, &CharacterMetadata::plain())),
        )
    }

    pub(crate) fn with_blocks(
        blocks: IndexMap<String, ContentBlock>,
        selection_before: SelectionState,
        selection_after: SelectionState,
    ) -> Self {
        ContentState {
            blocks,
            selection_before,
            selection_after,
        }
    }

    pub(crate) fn block_map(&self) -> &IndexMap<String, ContentBlock> {
        &self.blocks
    }

    pub fn block_for_key(&self, key: &str) -> Option<&ContentBlock> {
        self.blocks.get(key)
    }

    /// The block preceding `key` in document order
    pub fn block_before(&self, key: &str) -> Option<&ContentBlock> {
        let idx = self.blocks.get_index_of(key)?;
        idx.checked_sub(1)
            .and_then(|prev| self.blocks.get_index(prev))
            .map(|(_, b)| b)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.blocks.contains_key(key)
    }

    pub fn first_block(&self) -> Option<&ContentBlock> {
        self.blocks.first().map(|(_, b)| b)
    }

    pub fn last_block(&self) -> Option<&ContentBlock> {
        self.blocks.last().map(|(_, b)| b)
    }

    pub fn blocks(&self) -> impl Iterator<Item = &ContentBlock> {
        self.blocks.values()
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn to_plain_text(&self) -> String {
        self.blocks().map(ContentBlock::text).collect::<Vec<_>>().join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linked_block() -> ContentBlock {
        let link = CharacterMetadata::new(InlineStyle::new(), Some(EntityKey::new("1")));
        let other = CharacterMetadata::new(InlineStyle::new(), Some(EntityKey::new("2")));
        let plain = CharacterMetadata::plain();
        ContentBlock::new(
            "a",
            BlockType::Unstyled,
            "xabyc",
            vec![plain.clone(), link.clone(), link, plain, other],
        )
    }

    #[test]
    fn test_generated_keys_are_unique() {
        let a = generate_block_key();
        let b = generate_block_key();
        assert_ne!(a, b);
        assert!(a.len() >= 5);
    }

    #[test]
    fn test_find_entity_ranges() {
        let block = linked_block();
        let mut ranges = Vec::new();
        block.find_entity_ranges(|c| c.entity.is_some(), |s, e| ranges.push((s, e)));
        assert_eq!(ranges, vec![(1, 3), (4, 5)]);
    }

    #[test]
    fn test_adjacent_entities_are_separate_ranges() {
        let one = CharacterMetadata::new(InlineStyle::new(), Some(EntityKey::new("1")));
        let two = CharacterMetadata::new(InlineStyle::new(), Some(EntityKey::new("2")));
        let block = ContentBlock::new("a", BlockType::Unstyled, "abcd", vec![one.clone(), one, two.clone(), two]);

        let mut ranges = Vec::new();
        block.find_entity_ranges(|c| c.entity.is_some(), |s, e| ranges.push((s, e)));
        assert_eq!(ranges, vec![(0, 2), (2, 4)]);
    }

    #[test]
    fn test_slice_and_splice_multibyte() {
        let block = ContentBlock::uniform("a", "héllo", &CharacterMetadata::plain());
        let (text, chars) = block.slice(1, 3);
        assert_eq!(text, "él");
        assert_eq!(chars.len(), 2);

        let bold = CharacterMetadata::new(InlineStyle::new().with("BOLD"), None);
        let spliced = block.splice(2, "ü", &[bold]);
        assert_eq!(spliced.text(), "héüllo");
        assert!(spliced.style_at(2).unwrap().contains("BOLD"));
        assert_eq!(spliced.len(), 6);
    }

    #[test]
    fn test_new_aligns_characters_with_text() {
        let block = ContentBlock::new("a", BlockType::Unstyled, "abc", Vec::new());
        assert_eq!(block.characters().len(), 3);
    }

    #[test]
    fn test_empty_document_has_one_block() {
        let content = ContentState::from_blocks(Vec::new());
        assert_eq!(content.block_count(), 1);
        assert_eq!(content.to_plain_text(), "");
    }

    #[test]
    fn test_block_before() {
        let content = ContentState::from_blocks(vec![
            ContentBlock::uniform("a", "one", &CharacterMetadata::plain()),
            ContentBlock::uniform("b", "two", &CharacterMetadata::plain()),
        ]);
        assert_eq!(content.block_before("b").map(|b| b.text()), Some("one"));
        assert!(content.block_before("a").is_none());
    }
}
