// HTML fragment parsing
// Pasted HTML is read with tdoc and bridged into content blocks.

use std::io::Cursor;

use tdoc::html;
use tracing::debug;

use super::config::BlockRenderMap;
use super::tdoc_bridge::tdoc_to_blocks;
use crate::document::{ContentBlock, EntityRegistry};

/// Parses pasted HTML into blocks.
///
/// Returns `None` when the HTML yields no usable content; the caller then
/// falls back to plain text.
pub trait HtmlFragmentParser {
    fn parse(
        &self,
        html: &str,
        render_map: &BlockRenderMap,
        entities: &mut EntityRegistry,
    ) -> Option<Vec<ContentBlock>>;
}

/// Parser backed by `tdoc::html`
#[derive(Debug, Default, Clone, Copy)]
pub struct TdocHtmlParser;

impl HtmlFragmentParser for TdocHtmlParser {
    fn parse(
        &self,
        html_content: &str,
        render_map: &BlockRenderMap,
        entities: &mut EntityRegistry,
    ) -> Option<Vec<ContentBlock>> {
        if html_content.trim().is_empty() {
            return None;
        }

        let document = match html::parse(Cursor::new(html_content.as_bytes())) {
            Ok(document) => document,
            Err(err) => {
                debug!(error = %err, "pasted HTML did not parse");
                return None;
            }
        };

        let blocks = tdoc_to_blocks(&document, render_map, entities);
        if blocks.is_empty() {
            None
        } else {
            Some(blocks)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{BlockType, Mutability};

    fn parse(html: &str) -> (Option<Vec<ContentBlock>>, EntityRegistry) {
        let mut entities = EntityRegistry::new();
        let blocks = TdocHtmlParser.parse(html, &BlockRenderMap::default(), &mut entities);
        (blocks, entities)
    }

    fn types(blocks: &[ContentBlock]) -> Vec<BlockType> {
        blocks.iter().map(|b| b.block_type).collect()
    }

    fn texts(blocks: &[ContentBlock]) -> Vec<&str> {
        blocks.iter().map(|b| b.text()).collect()
    }

    #[test]
    fn test_paragraphs_become_blocks() {
        let (blocks, _) = parse("<p>Hello</p>\n<p>World</p>");
        let blocks = blocks.unwrap();
        assert_eq!(texts(&blocks), vec!["Hello", "World"]);
        assert_eq!(types(&blocks), vec![BlockType::Unstyled, BlockType::Unstyled]);
    }

    #[test]
    fn test_inline_styles() {
        let (blocks, _) = parse("<p>a<b>b</b>c</p>");
        let block = &blocks.unwrap()[0];
        assert_eq!(block.text(), "abc");
        assert!(block.style_at(0).unwrap().is_empty());
        assert!(block.style_at(1).unwrap().contains("BOLD"));
        assert!(block.style_at(2).unwrap().is_empty());
    }

    #[test]
    fn test_links_create_entities() {
        let (blocks, entities) = parse(r#"<p>see <a href="https://example.com/">here</a></p>"#);
        let block = &blocks.unwrap()[0];
        assert_eq!(block.text(), "see here");
        assert!(block.entity_at(0).is_none());

        let entity = entities.get(block.entity_at(4).unwrap()).unwrap();
        assert_eq!(entity.entity_type, "LINK");
        assert_eq!(entity.mutability, Mutability::Mutable);
        assert_eq!(entity.data["url"], "https://example.com/");
    }

    #[test]
    fn test_headings_and_lists() {
        let (blocks, _) = parse("<h1>Title</h1><ol><li>one</li></ol><ul><li>two</li></ul>");
        assert_eq!(
            types(&blocks.unwrap()),
            vec![
                BlockType::HeaderOne,
                BlockType::OrderedListItem,
                BlockType::UnorderedListItem,
            ]
        );
    }

    #[test]
    fn test_paragraphs_inside_list_items_keep_the_list() {
        let (blocks, _) =
            parse(r#"<ul><li dir="ltr"><p dir="ltr">one</p></li><li><p>two</p></li></ul>"#);
        let blocks = blocks.unwrap();
        assert_eq!(texts(&blocks), vec!["one", "two"]);
        assert_eq!(
            types(&blocks),
            vec![BlockType::UnorderedListItem, BlockType::UnorderedListItem]
        );
    }

    #[test]
    fn test_paragraph_inside_blockquote_is_quoted() {
        let (blocks, _) = parse("<blockquote><p>quoted</p></blockquote>");
        let blocks = blocks.unwrap();
        assert_eq!(texts(&blocks), vec!["quoted"]);
        assert_eq!(types(&blocks), vec![BlockType::Blockquote]);
    }

    #[test]
    fn test_empty_markup_yields_none() {
        let (blocks, _) = parse("<p></p>");
        assert!(blocks.is_none());
        let (blocks, _) = parse("   ");
        assert!(blocks.is_none());
    }
}
