use std::sync::LazyLock;

use regex::Regex;

use crate::document::{CharacterMetadata, ContentBlock, generate_block_key};

static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r\n?|\n").expect("line break pattern is valid"));

/// Split text into one string per block, breaking on CRLF, CR or LF
pub fn split_text_into_blocks(text: &str) -> Vec<String> {
    LINE_BREAK.split(text).map(str::to_string).collect()
}

/// One unstyled block per string, every character carrying `character`
pub fn process_text(blocks: &[String], character: &CharacterMetadata) -> Vec<ContentBlock> {
    blocks
        .iter()
        .map(|text| ContentBlock::uniform(generate_block_key(), text.as_str(), character))
        .collect()
}
