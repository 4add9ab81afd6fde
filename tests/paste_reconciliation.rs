// End-to-end paste behaviour through the Editor facade

use std::cell::Cell;
use std::rc::Rc;

use futures_lite::future;
use paste_reconcile::clipboard::{ClipboardEvent, MimeClipboard, PastedFile};
use paste_reconcile::document::{
    BlockType, CharacterMetadata, ContentBlock, ContentState, EntityData, EntityKey, InlineStyle,
    Mutability, SelectionState,
};
use paste_reconcile::paste::{HandleValue, PasteConfig, PasteHooks};
use paste_reconcile::{Editor, EditorState, PasteStatus};

const WEBARCHIVE: &str = "com.apple.webarchive";

fn bold() -> InlineStyle {
    InlineStyle::new().with("BOLD")
}

fn link_data(url: &str) -> EntityData {
    let mut data = EntityData::new();
    data.insert("url".to_string(), url.to_string());
    data
}

/// Editor whose single block "see docs" has a bold link over "docs"
fn linked_editor(config: PasteConfig) -> (Editor, EntityKey) {
    let mut editor = Editor::new("editor-a", config);
    let link = editor
        .entities_mut()
        .create("LINK", Mutability::Mutable, link_data("https://example.com/docs"));
    let plain = CharacterMetadata::plain();
    let linked = CharacterMetadata::new(bold(), Some(link.clone()));
    let block = ContentBlock::new(
        "a",
        BlockType::Unstyled,
        "see docs",
        vec![plain.clone(), plain.clone(), plain.clone(), plain, linked.clone(), linked.clone(), linked.clone(), linked],
    );
    editor.set_state(EditorState::create_with_content(ContentState::from_blocks(vec![block])));
    (editor, link)
}

fn paste(editor: &mut Editor, data: MimeClipboard) -> PasteStatus {
    let mut event = ClipboardEvent::new(data);
    let status = editor.paste(&mut event);
    assert!(event.default_prevented());
    status
}

fn dump(editor: &Editor) -> String {
    editor
        .content()
        .blocks()
        .map(|b| format!("{}|{}", b.block_type.as_str(), b.text()))
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn test_internal_round_trip_shares_entities() {
    let (mut editor, link) = linked_editor(PasteConfig::default());
    editor.set_selection(SelectionState::range("a", 4, "a", 8));
    let data = editor.copy();

    editor.set_selection(SelectionState::collapsed("a", 8));
    assert!(matches!(paste(&mut editor, data), PasteStatus::Inserted));

    let block = editor.content().block_for_key("a").unwrap();
    assert_eq!(block.text(), "see docsdocs");
    assert_eq!(block.entity_at(8), Some(&link));
    assert!(block.style_at(11).unwrap().contains("BOLD"));
    assert_eq!(editor.entities().len(), 1);
}

#[test]
fn test_multi_block_round_trip_reproduces_fragment() {
    let mut editor = Editor::new("editor-a", PasteConfig::default());
    let link = editor
        .entities_mut()
        .create("LINK", Mutability::Mutable, link_data("https://example.com/docs"));
    let heading = CharacterMetadata::new(bold(), None);
    let plain = CharacterMetadata::plain();
    let linked = CharacterMetadata::new(bold(), Some(link.clone()));
    let emphasised = CharacterMetadata::new(InlineStyle::new().with("ITALIC"), Some(link.clone()));
    let mut see_docs = vec![plain; 4];
    see_docs.extend(vec![linked; 4]);
    editor.set_state(EditorState::create_with_content(ContentState::from_blocks(vec![
        ContentBlock::new("a", BlockType::HeaderOne, "Intro", vec![heading; 5]),
        ContentBlock::new("b", BlockType::Unstyled, "see docs", see_docs),
        ContentBlock::new("c", BlockType::OrderedListItem, "two", vec![emphasised; 3]),
    ])));
    editor.select_all();
    let data = editor.copy();
    let copied = editor.internal_clipboard().get().unwrap().clone();
    assert_eq!(copied.len(), 3);

    editor.set_state(EditorState::create_with_content(ContentState::from_blocks(vec![
        ContentBlock::empty("z"),
    ])));
    editor.set_selection(SelectionState::collapsed("z", 0));
    assert!(matches!(paste(&mut editor, data), PasteStatus::Inserted));

    let pasted: Vec<&ContentBlock> = editor.content().blocks().collect();
    assert_eq!(pasted.len(), copied.len());
    for (pasted, copied) in pasted.iter().zip(copied.blocks()) {
        assert_eq!(pasted.block_type, copied.block_type);
        assert_eq!(pasted.text(), copied.text());
        assert_eq!(pasted.characters(), copied.characters());
    }
    assert_eq!(editor.content().block_for_key("b").unwrap().entity_at(4), Some(&link));
    assert_eq!(editor.content().block_for_key("c").unwrap().entity_at(0), Some(&link));
    assert_eq!(editor.entities().len(), 1);
}

#[test]
fn test_internal_round_trip_with_unique_entities() {
    let config = PasteConfig {
        paste_unique_entities: true,
        ..PasteConfig::default()
    };
    let (mut editor, link) = linked_editor(config);
    editor.set_selection(SelectionState::range("a", 4, "a", 8));
    let data = editor.copy();

    editor.set_selection(SelectionState::collapsed("a", 8));
    assert!(matches!(paste(&mut editor, data.clone()), PasteStatus::Inserted));
    assert!(matches!(paste(&mut editor, data), PasteStatus::Inserted));

    let block = editor.content().block_for_key("a").unwrap();
    assert_eq!(block.text(), "see docsdocsdocs");
    let first = block.entity_at(8).unwrap().clone();
    let second = block.entity_at(12).unwrap().clone();
    assert_ne!(first, link);
    assert_ne!(second, link);
    assert_ne!(first, second);
    // Each copy keeps its characters pointing at a single entity
    assert_eq!(block.entity_at(11), Some(&first));
    assert_eq!(block.entity_at(15), Some(&second));

    let original = editor.entities().get(&link).unwrap();
    let copy = editor.entities().get(&first).unwrap();
    assert_eq!(copy.entity_type, original.entity_type);
    assert_eq!(copy.data, original.data);
    assert_eq!(editor.entities().len(), 3);
}

#[test]
fn test_plain_text_carries_style_and_entity_at_caret() {
    let (mut editor, link) = linked_editor(PasteConfig::default());
    editor.set_selection(SelectionState::collapsed("a", 6));

    let data = MimeClipboard::new().with("text/plain", "x\r\ny\nz");
    assert!(matches!(paste(&mut editor, data), PasteStatus::Inserted));

    let texts: Vec<&str> = editor.content().blocks().map(|b| b.text()).collect();
    assert_eq!(texts, vec!["see dox", "y", "zcs"]);

    let blocks: Vec<&ContentBlock> = editor.content().blocks().collect();
    let inserted = [(blocks[0], 6), (blocks[1], 0), (blocks[2], 0)];
    for (block, offset) in inserted {
        assert!(block.style_at(offset).unwrap().contains("BOLD"));
        assert_eq!(block.entity_at(offset), Some(&link));
    }
}

#[test]
fn test_plain_text_after_immutable_entity_carries_no_entity() {
    let mut editor = Editor::new("editor-a", PasteConfig::default());
    let image = editor
        .entities_mut()
        .create("IMAGE", Mutability::Immutable, EntityData::new());
    let block = ContentBlock::new(
        "a",
        BlockType::Unstyled,
        "i",
        vec![CharacterMetadata::new(InlineStyle::new(), Some(image))],
    );
    editor.set_state(EditorState::create_with_content(ContentState::from_blocks(vec![block])));
    editor.set_selection(SelectionState::collapsed("a", 1));

    paste(&mut editor, MimeClipboard::new().with("text/plain", "caption"));

    let block = editor.content().block_for_key("a").unwrap();
    assert_eq!(block.text(), "icaption");
    assert_eq!(block.entity_at(1), None);
}

#[test]
fn test_webarchive_paste_falls_back_to_internal_clipboard() {
    let mut editor = Editor::new("editor-a", PasteConfig::default());
    let bold = CharacterMetadata::new(bold(), None);
    editor.set_state(EditorState::create_with_content(ContentState::from_blocks(vec![
        ContentBlock::uniform("a", "Hello", &bold),
        ContentBlock::uniform("b", "World", &bold),
    ])));
    editor.select_all();
    editor.copy();

    // Start over with a plain document so only the internal fragment can supply bold
    editor.set_state(EditorState::create_with_content(ContentState::from_text("x")));
    let key = editor.content().first_block().unwrap().key.clone();
    editor.set_selection(SelectionState::collapsed(key.clone(), 1));

    let data = MimeClipboard::new()
        .with(WEBARCHIVE, "bplist00")
        .with("text/plain", "Hello\nWorld");
    assert!(matches!(paste(&mut editor, data), PasteStatus::Inserted));

    let blocks: Vec<&ContentBlock> = editor.content().blocks().collect();
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0].key, key);
    assert_eq!(blocks[0].text(), "xHello");
    assert!(blocks[0].style_at(0).unwrap().is_empty());
    assert!(blocks[0].style_at(1).unwrap().contains("BOLD"));
    assert_eq!(blocks[1].text(), "World");
    assert!(blocks[1].style_at(0).unwrap().contains("BOLD"));
    assert!(!editor.internal_clipboard().is_empty());
}

#[test]
fn test_webarchive_with_different_text_pastes_plain() {
    let mut editor = Editor::with_content("editor-a", PasteConfig::default(), ContentState::from_text("Hello"));
    editor.select_all();
    editor.copy();
    let key = editor.content().first_block().unwrap().key.clone();
    editor.set_selection(SelectionState::collapsed(key, 5));

    let data = MimeClipboard::new()
        .with(WEBARCHIVE, "bplist00")
        .with("text/plain", "Goodbye");
    paste(&mut editor, data);

    assert_eq!(editor.content().to_plain_text(), "HelloGoodbye");
    assert!(editor.internal_clipboard().is_empty());
}

struct FileSink {
    seen: Rc<Cell<usize>>,
}

impl PasteHooks for FileSink {
    fn handle_pasted_files(&mut self, files: &[PastedFile]) -> HandleValue {
        self.seen.set(files.len());
        HandleValue::Handled
    }
}

#[test]
fn test_files_hook_takes_precedence() {
    let mut editor = Editor::with_content("editor-a", PasteConfig::default(), ContentState::from_text("doc"));
    let seen = Rc::new(Cell::new(0));
    editor.reconciler_mut().set_hooks(FileSink { seen: seen.clone() });
    let before = editor.content().clone();

    let data = MimeClipboard::new()
        .with_file(PastedFile::new("a.txt", "text/plain", "alpha"))
        .with_file(PastedFile::new("b.png", "image/png", vec![0x89u8, 0x50]));
    assert!(matches!(paste(&mut editor, data), PasteStatus::Delegated));

    assert_eq!(seen.get(), 2);
    assert_eq!(editor.content(), &before);
    assert!(!editor.state().can_undo());
}

#[test]
fn test_file_paste_inserts_extracted_text() {
    let mut editor = Editor::with_content("editor-a", PasteConfig::default(), ContentState::from_text(""));
    let data = MimeClipboard::new()
        .with_file(PastedFile::new("notes.txt", "text/plain", "one\ntwo"))
        .with_file(PastedFile::new("photo.jpg", "image/jpeg", vec![0xffu8, 0xd8]))
        .with_file(PastedFile::new("three.textClipping", "", Vec::<u8>::new()));

    let PasteStatus::Pending(pending) = paste(&mut editor, data) else {
        panic!("expected a pending file paste");
    };
    // Nothing changes until the extraction resolves
    assert_eq!(editor.content().to_plain_text(), "");

    let status = future::block_on(editor.finish_file_paste(pending));
    assert!(matches!(status, PasteStatus::Inserted));
    insta::assert_snapshot!(dump(&editor), @r"
    unstyled|one
    unstyled|two
    unstyled|three
    ");
}

#[test]
fn test_image_only_files_are_not_inserted() {
    let mut editor = Editor::with_content("editor-a", PasteConfig::default(), ContentState::from_text("doc"));
    let data = MimeClipboard::new().with_file(PastedFile::new("photo.png", "image/png", vec![0x89u8, 0x50]));

    let PasteStatus::Pending(pending) = paste(&mut editor, data) else {
        panic!("expected a pending file paste");
    };
    let status = future::block_on(editor.finish_file_paste(pending));

    assert!(matches!(status, PasteStatus::NoOp));
    assert_eq!(editor.content().to_plain_text(), "doc");
}

#[test]
fn test_foreign_paste_invalidates_internal_clipboard() {
    let mut editor = Editor::with_content("editor-a", PasteConfig::default(), ContentState::from_text("Hello"));
    editor.select_all();
    editor.copy();
    assert!(!editor.internal_clipboard().is_empty());

    let key = editor.content().first_block().unwrap().key.clone();
    editor.set_selection(SelectionState::collapsed(key.clone(), 5));
    let foreign = MimeClipboard::new()
        .with("text/plain", "Other")
        .with("text/html", "<p>Other</p>");
    paste(&mut editor, foreign);

    assert!(editor.internal_clipboard().is_empty());
    assert_eq!(editor.content().to_plain_text(), "HelloOther");

    // The earlier copy's text no longer routes through the stale fragment
    editor.set_selection(SelectionState::collapsed(key, 10));
    paste(&mut editor, MimeClipboard::new().with("text/plain", "Hello"));
    assert_eq!(editor.content().to_plain_text(), "HelloOtherHello");
}

#[test]
fn test_empty_paste_is_a_no_op() {
    let (mut editor, _) = linked_editor(PasteConfig::default());
    editor.set_selection(SelectionState::collapsed("a", 3));
    let content = editor.content().clone();
    let selection = editor.state().selection().clone();
    let depth = editor.state().undo_depth();

    let status = paste(&mut editor, MimeClipboard::new().with("text/plain", ""));

    assert!(matches!(status, PasteStatus::NoOp));
    assert_eq!(editor.content(), &content);
    assert_eq!(editor.state().selection(), &selection);
    assert_eq!(editor.state().undo_depth(), depth);
}

#[test]
fn test_cross_editor_paste_recovers_styles_and_links() {
    let (mut source, _) = linked_editor(PasteConfig::default());
    source.select_all();
    let data = source.copy();

    let mut target = Editor::with_content("editor-b", PasteConfig::default(), ContentState::from_text(""));
    assert!(matches!(paste(&mut target, data), PasteStatus::Inserted));

    let block = target.content().first_block().unwrap();
    assert_eq!(block.text(), "see docs");
    assert!(block.style_at(0).unwrap().is_empty());
    assert!(block.style_at(4).unwrap().contains("BOLD"));

    let key = block.entity_at(4).unwrap();
    let entity = target.entities().get(key).unwrap();
    assert_eq!(entity.entity_type, "LINK");
    assert_eq!(entity.data.get("url").map(String::as_str), Some("https://example.com/docs"));
    assert!(target.internal_clipboard().is_empty());
}

#[test]
fn test_foreign_html_keeps_block_structure() {
    let mut editor = Editor::with_content("editor-b", PasteConfig::default(), ContentState::from_text(""));
    let data = MimeClipboard::new()
        .with("text/plain", "Title\none\ntwo\nend bold")
        .with(
            "text/html",
            "<meta charset='utf-8'><h1>Title</h1><ul><li>one</li><li>two</li></ul><p>end <b>bold</b></p>",
        );
    paste(&mut editor, data);

    insta::assert_snapshot!(dump(&editor), @r"
    header-one|Title
    unordered-list-item|one
    unordered-list-item|two
    unstyled|end bold
    ");
}

#[test]
fn test_strip_pasted_styles_ignores_html() {
    let config = PasteConfig {
        strip_pasted_styles: true,
        ..PasteConfig::default()
    };
    let mut editor = Editor::with_content("editor-b", config, ContentState::from_text(""));
    let data = MimeClipboard::new()
        .with("text/plain", "Title\nbody")
        .with("text/html", "<h1>Title</h1><p><b>body</b></p>");
    paste(&mut editor, data);

    insta::assert_snapshot!(dump(&editor), @r"
    unstyled|Title
    unstyled|body
    ");
    let last = editor.content().last_block().unwrap();
    assert!(last.style_at(0).unwrap().is_empty());
}

#[test]
fn test_paste_over_selection_is_one_undo_step() {
    let mut editor = Editor::with_content("editor-a", PasteConfig::default(), ContentState::from_text("Hello World"));
    let key = editor.content().first_block().unwrap().key.clone();
    editor.set_selection(SelectionState::range(key.clone(), 6, key, 11));

    paste(&mut editor, MimeClipboard::new().with("text/plain", "there"));
    assert_eq!(editor.content().to_plain_text(), "Hello there");

    assert!(editor.undo());
    assert_eq!(editor.content().to_plain_text(), "Hello World");
}
