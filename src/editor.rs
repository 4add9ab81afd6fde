// Editor
// Owns the state of one editor instance and wires the copy path (which fills
// the internal clipboard) to the paste path (which reconciles against it)

use tracing::debug;

use crate::clipboard::payload::{TEXT_HTML, TEXT_PLAIN};
use crate::clipboard::{InternalClipboard, MimeClipboard, PasteEvent};
use crate::document::{
    BlockType, CharacterMetadata, ContentBlock, ContentState, EntityRegistry, Fragment,
    SelectionState, remove_range,
};
use crate::editor_state::{ChangeType, EditorState};
use crate::paste::{BlockRenderMap, PasteConfig, PasteOutcome, PasteReconciler, PendingFilePaste};

/// Result of a paste as seen by the editor
#[derive(Debug)]
pub enum PasteStatus {
    Inserted,
    Delegated,
    NoOp,
    /// Pass to [`Editor::finish_file_paste`] once the host can await it
    Pending(PendingFilePaste),
}

/// A single editor instance
pub struct Editor {
    state: EditorState,
    entities: EntityRegistry,
    clipboard: InternalClipboard,
    reconciler: PasteReconciler,
}

impl Editor {
    /// Create an editor with an empty document
    pub fn new(editor_key: impl Into<String>, config: PasteConfig) -> Self {
        Self::with_content(editor_key, config, ContentState::from_blocks(Vec::new()))
    }

    /// Create an editor with an existing document
    pub fn with_content(editor_key: impl Into<String>, config: PasteConfig, content: ContentState) -> Self {
        Editor {
            state: EditorState::create_with_content(content),
            entities: EntityRegistry::new(),
            clipboard: InternalClipboard::new(),
            reconciler: PasteReconciler::new(editor_key, config),
        }
    }

    pub fn editor_key(&self) -> &str {
        self.reconciler.editor_key()
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    /// Make `state` the active state (e.g. after the host applied its own change)
    pub fn set_state(&mut self, state: EditorState) {
        self.state = state;
    }

    pub fn content(&self) -> &ContentState {
        self.state.current_content()
    }

    pub fn set_selection(&mut self, selection: SelectionState) {
        self.state = self.state.with_selection(selection);
    }

    /// Select the whole document
    pub fn select_all(&mut self) {
        let content = self.state.current_content();
        let (Some(first), Some(last)) = (content.first_block(), content.last_block()) else {
            return;
        };
        let selection = SelectionState::range(first.key.clone(), 0, last.key.clone(), last.len());
        self.set_selection(selection);
    }

    pub fn entities(&self) -> &EntityRegistry {
        &self.entities
    }

    pub fn entities_mut(&mut self) -> &mut EntityRegistry {
        &mut self.entities
    }

    pub fn internal_clipboard(&self) -> &InternalClipboard {
        &self.clipboard
    }

    pub fn internal_clipboard_mut(&mut self) -> &mut InternalClipboard {
        &mut self.clipboard
    }

    pub fn reconciler_mut(&mut self) -> &mut PasteReconciler {
        &mut self.reconciler
    }

    /// The selected content as a fragment, or `None` for a collapsed selection
    pub fn fragment_for_selection(&self) -> Option<Fragment> {
        let selection = self.state.selection();
        if selection.is_collapsed() {
            return None;
        }

        let blocks = self.state.current_content().block_map();
        let start_idx = blocks.get_index_of(selection.start_key())?;
        let end_idx = blocks.get_index_of(selection.end_key())?;
        if end_idx < start_idx {
            return None;
        }

        let mut selected = Vec::with_capacity(end_idx - start_idx + 1);
        for (idx, (_, block)) in blocks
            .iter()
            .enumerate()
            .skip(start_idx)
            .take(end_idx - start_idx + 1)
        {
            let from = if idx == start_idx { selection.start_offset() } else { 0 };
            let to = if idx == end_idx { selection.end_offset() } else { block.len() };
            let (text, characters) = block.slice(from, to);
            selected.push(ContentBlock::new(block.key.clone(), block.block_type, text, characters));
        }
        Some(Fragment::from_blocks(selected))
    }

    /// Copy the selection.
    ///
    /// The fragment goes onto the internal clipboard; the returned payload is
    /// what the host should place on the system clipboard. Its HTML carries
    /// this editor's key so a later paste can be recognised as our own.
    pub fn copy(&mut self) -> MimeClipboard {
        let Some(fragment) = self.fragment_for_selection() else {
            return MimeClipboard::new();
        };

        let render_map = &self.reconciler.config().block_render_map;
        let html = fragment_to_html(&fragment, self.reconciler.editor_key(), &self.entities, render_map);
        let data = MimeClipboard::new()
            .with(TEXT_PLAIN, fragment.to_plain_text())
            .with(TEXT_HTML, html);

        debug!(blocks = fragment.len(), "copied fragment to internal clipboard");
        self.clipboard.set(Some(fragment));
        data
    }

    /// Copy the selection, then remove it from the document
    pub fn cut(&mut self) -> MimeClipboard {
        let data = self.copy();
        if !data.is_empty() {
            let content = remove_range(self.state.current_content(), self.state.selection());
            self.state = EditorState::push(&self.state, content, ChangeType::RemoveRange);
        }
        data
    }

    /// Paste from a clipboard event
    pub fn paste(&mut self, event: &mut dyn PasteEvent) -> PasteStatus {
        let outcome = self.reconciler.handle_paste(
            event,
            &self.state,
            &mut self.clipboard,
            &mut self.entities,
        );
        self.apply(outcome)
    }

    /// Complete a paste that was waiting on file contents
    pub async fn finish_file_paste(&mut self, pending: PendingFilePaste) -> PasteStatus {
        let outcome = pending.resolve(&self.entities).await;
        self.apply(outcome)
    }

    pub fn undo(&mut self) -> bool {
        match self.state.undo() {
            Some(state) => {
                self.state = state;
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.state.redo() {
            Some(state) => {
                self.state = state;
                true
            }
            None => false,
        }
    }

    fn apply(&mut self, outcome: PasteOutcome) -> PasteStatus {
        match outcome {
            PasteOutcome::Inserted(state) => {
                self.state = state;
                PasteStatus::Inserted
            }
            PasteOutcome::Delegated => PasteStatus::Delegated,
            PasteOutcome::NoOp => PasteStatus::NoOp,
            PasteOutcome::FilesPending(pending) => PasteStatus::Pending(pending),
        }
    }
}

/// Serialise a fragment the way it is put on the system clipboard
fn fragment_to_html(
    fragment: &Fragment,
    editor_key: &str,
    entities: &EntityRegistry,
    render_map: &BlockRenderMap,
) -> String {
    let mut html = format!(r#"<div data-editor="{}" data-contents="true">"#, escape_html(editor_key));
    let mut open_list: Option<&str> = None;

    for block in fragment.blocks() {
        let list = match block.block_type {
            BlockType::UnorderedListItem => Some("ul"),
            BlockType::OrderedListItem => Some("ol"),
            _ => None,
        };
        if open_list != list {
            if let Some(tag) = open_list {
                html.push_str(&format!("</{tag}>"));
            }
            if let Some(tag) = list {
                html.push_str(&format!("<{tag}>"));
            }
            open_list = list;
        }

        let element = if list.is_some() {
            "li"
        } else {
            render_map.element_for(block.block_type).unwrap_or("p")
        };
        html.push_str(&format!(
            r#"<{element} data-block="true" data-offset-key="{}-0-0">"#,
            escape_html(&block.key)
        ));
        push_runs(&mut html, block, entities);
        html.push_str(&format!("</{element}>"));
    }

    if let Some(tag) = open_list {
        html.push_str(&format!("</{tag}>"));
    }
    html.push_str("</div>");
    html
}

const STYLE_TAGS: &[(&str, &str)] = &[
    ("BOLD", "strong"),
    ("ITALIC", "em"),
    ("UNDERLINE", "u"),
    ("STRIKETHROUGH", "s"),
    ("CODE", "code"),
];

/// Emit runs of characters sharing style and entity
fn push_runs(html: &mut String, block: &ContentBlock, entities: &EntityRegistry) {
    let characters = block.characters();
    let mut start = 0;
    while start < characters.len() {
        let run_meta = &characters[start];
        let end = characters[start..]
            .iter()
            .position(|c| c != run_meta)
            .map_or(characters.len(), |len| start + len);
        let (text, _) = block.slice(start, end);
        push_run(html, &text, run_meta, entities);
        start = end;
    }
}

fn push_run(html: &mut String, text: &str, meta: &CharacterMetadata, entities: &EntityRegistry) {
    let entity = meta.entity.as_ref().and_then(|key| entities.get(key));

    if let Some(image) = entity.filter(|e| e.entity_type == "IMAGE") {
        let src = image.data.get("src").map(String::as_str).unwrap_or("");
        html.push_str(&format!(r#"<img src="{}">"#, escape_html(src)));
        return;
    }

    let href = entity
        .filter(|e| e.entity_type == "LINK")
        .and_then(|e| e.data.get("url"));
    if let Some(url) = href {
        html.push_str(&format!(r#"<a href="{}">"#, escape_html(url)));
    }

    let tags: Vec<&str> = STYLE_TAGS
        .iter()
        .filter(|(style, _)| meta.style.contains(style))
        .map(|(_, tag)| *tag)
        .collect();
    for tag in &tags {
        html.push_str(&format!("<{tag}>"));
    }
    html.push_str(&escape_html(text).replace('\n', "<br>"));
    for tag in tags.iter().rev() {
        html.push_str(&format!("</{tag}>"));
    }

    if href.is_some() {
        html.push_str("</a>");
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
