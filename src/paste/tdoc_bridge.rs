use tdoc::Document as TdocDocument;
use tdoc::inline::{InlineStyle as SpanStyle, Span};
use tdoc::paragraph::{Paragraph, ParagraphType};

use super::config::BlockRenderMap;
use crate::document::{
    BlockType, CharacterMetadata, ContentBlock, EntityData, EntityKey, EntityRegistry,
    InlineStyle, Mutability, generate_block_key,
};

/// Convert a [`tdoc::Document`] into content blocks.
///
/// Each paragraph kind is looked up in `render_map` under the element it is
/// read from (`p`, `h1`, `li`, `blockquote`, `pre`), so overrides in the paste
/// configuration decide the block types. Links become mutable `LINK` entities
/// in `entities`. Paragraphs without text produce no block.
pub fn tdoc_to_blocks(
    doc: &TdocDocument,
    render_map: &BlockRenderMap,
    entities: &mut EntityRegistry,
) -> Vec<ContentBlock> {
    let mut bridge = Bridge {
        render_map,
        entities,
        blocks: Vec::new(),
    };
    for paragraph in &doc.paragraphs {
        bridge.append_paragraph(paragraph);
    }
    bridge.blocks
}

struct Bridge<'a> {
    render_map: &'a BlockRenderMap,
    entities: &'a mut EntityRegistry,
    blocks: Vec<ContentBlock>,
}

#[derive(Default)]
struct BlockText {
    text: String,
    characters: Vec<CharacterMetadata>,
}

impl BlockText {
    fn push(&mut self, text: &str, style: &InlineStyle, entity: Option<&EntityKey>) {
        let character = CharacterMetadata::new(style.clone(), entity.cloned());
        self.text.push_str(text);
        self.characters
            .extend(std::iter::repeat_n(character, text.chars().count()));
    }
}

impl Bridge<'_> {
    fn append_paragraph(&mut self, paragraph: &Paragraph) {
        match paragraph.paragraph_type() {
            ParagraphType::OrderedList => {
                for entry in paragraph.entries() {
                    self.append_list_entry(entry, true);
                }
            }
            ParagraphType::UnorderedList | ParagraphType::Checklist => {
                for entry in paragraph.entries() {
                    self.append_list_entry(entry, false);
                }
            }
            ParagraphType::Quote => {
                if paragraph.children().is_empty() {
                    let text = self.spans_to_text(paragraph.content());
                    self.push_block("blockquote", text);
                } else {
                    for child in paragraph.children() {
                        if matches!(child.paragraph_type(), ParagraphType::Text) {
                            let text = self.spans_to_text(child.content());
                            self.push_block("blockquote", text);
                        } else {
                            self.append_paragraph(child);
                        }
                    }
                }
            }
            ParagraphType::Text => self.append_text_paragraph("p", paragraph),
            ParagraphType::Header1 => self.append_text_paragraph("h1", paragraph),
            ParagraphType::Header2 => self.append_text_paragraph("h2", paragraph),
            ParagraphType::Header3 => self.append_text_paragraph("h3", paragraph),
            ParagraphType::CodeBlock => self.append_text_paragraph("pre", paragraph),
        }
    }

    fn append_text_paragraph(&mut self, element: &str, paragraph: &Paragraph) {
        let text = self.spans_to_text(paragraph.content());
        self.push_block(element, text);
    }

    /// One block per list entry; the entry's paragraphs are joined by newlines
    /// and nested lists follow as blocks of their own.
    fn append_list_entry(&mut self, entry: &[Paragraph], ordered: bool) {
        let mut item = BlockText::default();
        let mut nested = Vec::new();
        for paragraph in entry {
            if is_list(paragraph) {
                nested.push(paragraph);
                continue;
            }
            if !item.text.is_empty() {
                item.push("\n", &InlineStyle::new(), None);
            }
            self.push_spans(paragraph.content(), &mut item);
        }

        let block_type = match self.render_map.block_type_for("li") {
            Some(BlockType::UnorderedListItem) | None if ordered => BlockType::OrderedListItem,
            Some(block_type) => block_type,
            None => BlockType::UnorderedListItem,
        };
        self.push_typed(block_type, item);

        for paragraph in nested {
            self.append_paragraph(paragraph);
        }
    }

    fn push_block(&mut self, element: &str, text: BlockText) {
        let block_type = self
            .render_map
            .block_type_for(element)
            .unwrap_or(BlockType::Unstyled);
        self.push_typed(block_type, text);
    }

    fn push_typed(&mut self, block_type: BlockType, text: BlockText) {
        if text.text.trim().is_empty() {
            return;
        }
        self.blocks.push(ContentBlock::new(
            generate_block_key(),
            block_type,
            text.text,
            text.characters,
        ));
    }

    fn spans_to_text(&mut self, spans: &[Span]) -> BlockText {
        let mut text = BlockText::default();
        self.push_spans(spans, &mut text);
        text
    }

    fn push_spans(&mut self, spans: &[Span], out: &mut BlockText) {
        let plain = InlineStyle::new();
        for span in spans {
            self.push_span(span, &plain, None, out);
        }
    }

    fn push_span(
        &mut self,
        span: &Span,
        active: &InlineStyle,
        entity: Option<&EntityKey>,
        out: &mut BlockText,
    ) {
        let mut style = active.clone();
        if let Some(name) = style_name(&span.style) {
            style.insert(name);
        }

        let link = if span.style == SpanStyle::Link {
            span.link_target
                .as_deref()
                .filter(|target| !target.is_empty())
                .map(|url| self.create_link(url))
        } else {
            None
        };
        let entity = link.as_ref().or(entity);

        if !span.text.is_empty() {
            out.push(&span.text, &style, entity);
        }
        for child in &span.children {
            self.push_span(child, &style, entity, out);
        }
    }

    fn create_link(&mut self, url: &str) -> EntityKey {
        let mut data = EntityData::new();
        data.insert("url".to_string(), url.to_string());
        self.entities.create("LINK", Mutability::Mutable, data)
    }
}

fn is_list(paragraph: &Paragraph) -> bool {
    matches!(
        paragraph.paragraph_type(),
        ParagraphType::OrderedList | ParagraphType::UnorderedList | ParagraphType::Checklist
    )
}

fn style_name(style: &SpanStyle) -> Option<&'static str> {
    match style {
        SpanStyle::Bold => Some("BOLD"),
        SpanStyle::Italic => Some("ITALIC"),
        SpanStyle::Underline => Some("UNDERLINE"),
        SpanStyle::Strike => Some("STRIKETHROUGH"),
        SpanStyle::Code => Some("CODE"),
        SpanStyle::Highlight => Some("HIGHLIGHT"),
        SpanStyle::Link | SpanStyle::None => None,
    }
}
