// Document modifications
// Pure functions producing a new ContentState from an old one

use std::collections::HashSet;

use indexmap::IndexMap;

use super::content::{ContentBlock, ContentState, Fragment, generate_block_key};
use super::selection::SelectionState;

/// Remove the selected range, merging the start and end blocks
pub fn remove_range(content: &ContentState, selection: &SelectionState) -> ContentState {
    let blocks = content.block_map();
    let start_key = selection.start_key();
    let end_key = selection.end_key();

    let (Some(start_idx), Some(end_idx)) = (blocks.get_index_of(start_key), blocks.get_index_of(end_key))
    else {
        return unchanged(content, selection);
    };
    if selection.is_collapsed() || end_idx < start_idx {
        return unchanged(content, selection);
    }

    let start_block = &blocks[start_idx];
    let end_block = &blocks[end_idx];
    let start_offset = selection.start_offset().min(start_block.len());
    let end_offset = selection.end_offset().min(end_block.len());
    if start_idx == end_idx && end_offset <= start_offset {
        return unchanged(content, selection);
    }

    let (head_text, mut characters) = start_block.slice(0, start_offset);
    let (tail_text, tail_chars) = end_block.slice(end_offset, end_block.len());
    characters.extend(tail_chars);
    let merged = ContentBlock::new(
        start_block.key.clone(),
        start_block.block_type,
        head_text + &tail_text,
        characters,
    );

    let mut new_blocks = IndexMap::with_capacity(blocks.len());
    for (idx, (key, block)) in blocks.iter().enumerate() {
        if idx == start_idx {
            new_blocks.insert(key.clone(), merged.clone());
        } else if idx < start_idx || idx > end_idx {
            new_blocks.insert(key.clone(), block.clone());
        }
    }

    ContentState::with_blocks(
        new_blocks,
        selection.clone(),
        SelectionState::collapsed(start_block.key.clone(), start_offset),
    )
}

fn unchanged(content: &ContentState, selection: &SelectionState) -> ContentState {
    let caret = SelectionState::collapsed(selection.start_key(), selection.start_offset());
    ContentState::with_blocks(content.block_map().clone(), selection.clone(), caret)
}

/// Replace the selected range with `fragment`.
///
/// A single-block fragment is spliced into the target block, which takes the
/// fragment block's type only if it was empty. A longer fragment
/// splits the target: the head keeps the target's key (and its type, unless
/// the insertion point is at offset 0), the last fragment block takes the tail. The caret ends up after the inserted content.
pub fn replace_with_fragment(
    content: &ContentState,
    selection: &SelectionState,
    fragment: &Fragment,
) -> ContentState {
    let removed = remove_range(content, selection);
    let target_key = removed.selection_after.anchor_key.clone();

    let (Some(target), Some(first)) = (removed.block_for_key(&target_key), fragment.first()) else {
        return ContentState::with_blocks(
            removed.block_map().clone(),
            selection.clone(),
            removed.selection_after.clone(),
        );
    };
    let offset = removed.selection_after.anchor_offset.min(target.len());

    if fragment.len() == 1 {
        let mut blocks = removed.block_map().clone();
        let mut spliced = target.splice(offset, first.text(), first.characters());
        if target.is_empty() {
            spliced.block_type = first.block_type;
        }
        blocks.insert(target_key.clone(), spliced);
        return ContentState::with_blocks(
            blocks,
            selection.clone(),
            SelectionState::collapsed(target_key, offset + first.len()),
        );
    }

    let (head_text, mut head_chars) = target.slice(0, offset);
    head_chars.extend_from_slice(first.characters());
    let head_type = if head_text.is_empty() { first.block_type } else { target.block_type };
    let head = ContentBlock::new(
        target.key.clone(),
        head_type,
        head_text + first.text(),
        head_chars,
    );
    let (tail_text, tail_chars) = target.slice(offset, target.len());

    let mut taken: HashSet<String> = removed.block_map().keys().cloned().collect();
    let mut inserted = Vec::with_capacity(fragment.len());
    inserted.push(head);

    let rest: Vec<&ContentBlock> = fragment.blocks().skip(1).collect();
    let last_idx = rest.len() - 1;
    for (idx, block) in rest.into_iter().enumerate() {
        let mut key = block.key.clone();
        while taken.contains(&key) {
            key = generate_block_key();
        }
        taken.insert(key.clone());

        if idx == last_idx {
            let mut characters = block.characters().to_vec();
            characters.extend_from_slice(&tail_chars);
            inserted.push(ContentBlock::new(
                key,
                block.block_type,
                block.text().to_string() + &tail_text,
                characters,
            ));
        } else {
            let mut block = block.clone();
            block.key = key;
            inserted.push(block);
        }
    }

    let caret = inserted
        .last()
        .map(|b| SelectionState::collapsed(b.key.clone(), b.len() - tail_chars.len()))
        .unwrap_or_default();

    let mut blocks = IndexMap::with_capacity(removed.block_count() + inserted.len());
    let mut pending = Some(inserted);
    for (key, block) in removed.block_map() {
        if *key == target_key {
            for block in pending.take().into_iter().flatten() {
                blocks.insert(block.key.clone(), block);
            }
        } else {
            blocks.insert(key.clone(), block.clone());
        }
    }

    ContentState::with_blocks(blocks, selection.clone(), caret)
}
