// Paste reconciliation
// Decides how a clipboard payload becomes a fragment: reuse of the internal
// clipboard, parsed HTML, or plain text, and commits exactly one insertion.

use std::fmt;

use tracing::debug;

use super::config::PasteConfig;
use super::entities::clone_entities_in_fragment;
use super::files::{FileTextExtractor, TextFileExtractor, TextFuture};
use super::hooks::{HandleValue, NoHooks, PasteHooks};
use super::html::{HtmlFragmentParser, TdocHtmlParser};
use super::text::{process_text, split_text_into_blocks};
use crate::clipboard::payload::{TEXT_HTML, WEBARCHIVE};
use crate::clipboard::{ClipboardPayload, InternalClipboard, PasteEvent};
use crate::document::{
    CharacterMetadata, EntityRegistry, Fragment, get_entity_key_for_selection,
    replace_with_fragment,
};
use crate::editor_state::{ChangeType, EditorState};

/// How a paste event ended
#[derive(Debug)]
pub enum PasteOutcome {
    /// A host hook took over the paste
    Delegated,
    /// Nothing to paste
    NoOp,
    /// The new editor state; the caller makes it current
    Inserted(EditorState),
    /// Files are being read; finish with [`PendingFilePaste::resolve`]
    FilesPending(PendingFilePaste),
}

impl PasteOutcome {
    /// The new state if this outcome inserted content
    pub fn into_state(self) -> Option<EditorState> {
        match self {
            PasteOutcome::Inserted(state) => Some(state),
            _ => None,
        }
    }
}

/// A file paste waiting for its text to be extracted
pub struct PendingFilePaste {
    extraction: TextFuture,
    fallback_text: String,
    editor_state: EditorState,
}

impl fmt::Debug for PendingFilePaste {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingFilePaste")
            .field("fallback_text", &self.fallback_text)
            .finish_non_exhaustive()
    }
}

impl PendingFilePaste {
    /// Wait for the file text and insert it at the selection captured when the paste began.
    ///
    /// Falls back to the payload's plain text when the files yield nothing.
    pub async fn resolve(self, entities: &EntityRegistry) -> PasteOutcome {
        let file_text = self.extraction.await;
        let text = if file_text.is_empty() {
            self.fallback_text
        } else {
            file_text
        };
        if text.is_empty() {
            debug!("pasted files produced no text");
            return PasteOutcome::NoOp;
        }

        let blocks = split_text_into_blocks(&text);
        let character = character_for_selection(&self.editor_state, entities);
        let fragment = Fragment::from_blocks(process_text(&blocks, &character));
        debug!(blocks = fragment.len(), "inserting text extracted from files");
        PasteOutcome::Inserted(insert_fragment(&self.editor_state, &fragment))
    }
}

/// Replace the selection with `fragment` and commit it as one undo step
pub fn insert_fragment(editor_state: &EditorState, fragment: &Fragment) -> EditorState {
    let content = replace_with_fragment(
        editor_state.current_content(),
        editor_state.selection(),
        fragment,
    );
    EditorState::push(editor_state, content, ChangeType::InsertFragment)
}

/// Metadata for plain characters typed or pasted at the current selection
fn character_for_selection(editor_state: &EditorState, entities: &EntityRegistry) -> CharacterMetadata {
    CharacterMetadata::new(
        editor_state.current_inline_style(),
        get_entity_key_for_selection(
            editor_state.current_content(),
            editor_state.selection(),
            entities,
        ),
    )
}

/// Per-editor paste handler
pub struct PasteReconciler {
    editor_key: String,
    config: PasteConfig,
    hooks: Box<dyn PasteHooks>,
    html_parser: Box<dyn HtmlFragmentParser>,
    file_extractor: Box<dyn FileTextExtractor>,
}

impl PasteReconciler {
    /// `editor_key` must be unique per editor instance; copies made by this
    /// editor embed it in their HTML.
    pub fn new(editor_key: impl Into<String>, config: PasteConfig) -> Self {
        let file_extractor = TextFileExtractor::new(config.max_file_text_chars);
        PasteReconciler {
            editor_key: editor_key.into(),
            config,
            hooks: Box::new(NoHooks),
            html_parser: Box::new(TdocHtmlParser),
            file_extractor: Box::new(file_extractor),
        }
    }

    pub fn with_hooks(mut self, hooks: impl PasteHooks + 'static) -> Self {
        self.hooks = Box::new(hooks);
        self
    }

    pub fn with_html_parser(mut self, parser: impl HtmlFragmentParser + 'static) -> Self {
        self.html_parser = Box::new(parser);
        self
    }

    pub fn with_file_extractor(mut self, extractor: impl FileTextExtractor + 'static) -> Self {
        self.file_extractor = Box::new(extractor);
        self
    }

    pub fn set_hooks(&mut self, hooks: impl PasteHooks + 'static) {
        self.hooks = Box::new(hooks);
    }

    pub fn editor_key(&self) -> &str {
        &self.editor_key
    }

    pub fn config(&self) -> &PasteConfig {
        &self.config
    }

    /// Handle one paste event against `editor_state`.
    ///
    /// The platform default is suppressed before anything else happens.
    /// `clipboard` is read and, when the paste proves it stale, cleared.
    pub fn handle_paste(
        &mut self,
        event: &mut dyn PasteEvent,
        editor_state: &EditorState,
        clipboard: &mut InternalClipboard,
        entities: &mut EntityRegistry,
    ) -> PasteOutcome {
        event.prevent_default();
        let payload = ClipboardPayload::new(event.clipboard_data());

        // Files only count when this is not likely a string meant to go inline
        if !payload.is_rich_text() {
            let files = payload.files();
            if !files.is_empty() {
                if self.hooks.handle_pasted_files(&files) == HandleValue::Handled {
                    debug!(files = files.len(), "host handled pasted files");
                    return PasteOutcome::Delegated;
                }
                debug!(files = files.len(), "reading text from pasted files");
                return PasteOutcome::FilesPending(PendingFilePaste {
                    extraction: self.file_extractor.extract(files),
                    fallback_text: payload.text(),
                    editor_state: editor_state.clone(),
                });
            }
        }

        let text = payload.text();
        let html = payload.html();
        if self.hooks.handle_pasted_text(&text, &html) == HandleValue::Handled {
            debug!("host handled pasted text");
            return PasteOutcome::Delegated;
        }

        let text_blocks = if text.is_empty() {
            Vec::new()
        } else {
            split_text_into_blocks(&text)
        };

        if !self.config.strip_pasted_styles {
            if let Some(internal) = self.match_internal_clipboard(&payload, &text, &html, &text_blocks, clipboard) {
                let fragment = if self.config.paste_unique_entities {
                    clone_entities_in_fragment(internal, entities)
                } else {
                    internal.clone()
                };
                return PasteOutcome::Inserted(insert_fragment(editor_state, &fragment));
            }

            // The system clipboard no longer holds our last copy
            if !clipboard.is_empty() {
                debug!("clearing stale internal clipboard");
                clipboard.clear();
            }

            if !html.is_empty() {
                match self.html_parser.parse(&html, &self.config.block_render_map, entities) {
                    Some(blocks) if !blocks.is_empty() => {
                        let fragment = Fragment::from_blocks(blocks);
                        debug!(blocks = fragment.len(), "inserting parsed HTML");
                        return PasteOutcome::Inserted(insert_fragment(editor_state, &fragment));
                    }
                    _ => debug!("pasted HTML produced no blocks"),
                }
            }
        }

        if text_blocks.is_empty() {
            debug!("nothing to paste");
            return PasteOutcome::NoOp;
        }

        let character = character_for_selection(editor_state, entities);
        let fragment = Fragment::from_blocks(process_text(&text_blocks, &character));
        debug!(blocks = fragment.len(), "inserting plain text");
        PasteOutcome::Inserted(insert_fragment(editor_state, &fragment))
    }

    /// The internal clipboard fragment, if the payload evidently came from this editor
    fn match_internal_clipboard<'c>(
        &self,
        payload: &ClipboardPayload<'_>,
        text: &str,
        html: &str,
        text_blocks: &[String],
        clipboard: &'c InternalClipboard,
    ) -> Option<&'c Fragment> {
        let internal = clipboard.get()?;

        if payload.is_rich_text() {
            let has_marker = !self.editor_key.is_empty() && html.contains(self.editor_key.as_str());
            // A copy within a single block carries no editor marker
            let single_block_match = text_blocks.len() == 1
                && internal.len() == 1
                && internal.first().is_some_and(|block| block.text() == text);
            if has_marker || single_block_match {
                debug!(has_marker, single_block_match, "paste matches internal clipboard");
                return Some(internal);
            }
        } else if payload.has_type(WEBARCHIVE)
            && !payload.has_type(TEXT_HTML)
            && text_blocks_match(text_blocks, internal)
        {
            // Safari sometimes stores a webarchive but no text/html for its own copies
            debug!("webarchive paste matches internal clipboard");
            return Some(internal);
        }

        None
    }
}

fn text_blocks_match(text_blocks: &[String], fragment: &Fragment) -> bool {
    text_blocks.len() == fragment.len()
        && fragment
            .blocks()
            .zip(text_blocks)
            .all(|(block, text)| block.text() == text)
}
