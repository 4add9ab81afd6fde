use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use futures_lite::future;
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use paste_reconcile::clipboard::{ClipboardEvent, MimeClipboard, PastedFile};
use paste_reconcile::document::{ContentState, Fragment, SelectionState};
use paste_reconcile::paste::{PasteConfig, split_text_into_blocks};
use paste_reconcile::{Editor, Error, PasteStatus, Result};

#[derive(Parser, Debug)]
#[command(name = "paste-reconcile")]
#[command(about = "Replay clipboard pastes against a document", long_about = None)]
struct Args {
    /// Paste configuration (defaults to the platform config file)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Paste a described clipboard payload into a document and print the result
    Replay {
        /// TOML file describing the clipboard payload
        payload: PathBuf,
        /// Text file with the initial document, one block per line
        #[arg(short, long)]
        document: Option<PathBuf>,
        /// Paste at the end of this block (0-based); defaults to the last block
        #[arg(short, long)]
        block: Option<usize>,
    },
    /// Print the blocks a text splits into
    Split {
        text: String,
    },
}

/// On-disk description of a clipboard payload
#[derive(Deserialize, Debug, Default)]
struct PayloadDescription {
    #[serde(default = "default_editor_key")]
    editor_key: String,
    /// Text of an earlier copy from the same editor, one block per line
    internal_clipboard: Option<String>,
    #[serde(default)]
    entry: Vec<EntryDescription>,
    #[serde(default)]
    file: Vec<FileDescription>,
}

#[derive(Deserialize, Debug)]
struct EntryDescription {
    #[serde(rename = "type")]
    mime_type: String,
    #[serde(default)]
    data: String,
}

#[derive(Deserialize, Debug)]
struct FileDescription {
    path: PathBuf,
    #[serde(default)]
    mime_type: String,
}

fn default_editor_key() -> String {
    "replay".to_string()
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn load_payload(path: &Path) -> Result<(PayloadDescription, MimeClipboard)> {
    let description: PayloadDescription =
        toml::from_str(&read(path)?).map_err(|e| Error::Payload(e.to_string()))?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));

    let mut clipboard = MimeClipboard::new();
    for entry in &description.entry {
        clipboard.set(entry.mime_type.clone(), entry.data.clone());
    }
    for file in &description.file {
        let full_path = base.join(&file.path);
        let contents = fs::read(&full_path).map_err(|source| Error::Io {
            path: full_path.clone(),
            source,
        })?;
        let name = file
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| Error::Payload(format!("file entry without a name: {}", file.path.display())))?;
        clipboard = clipboard.with_file(PastedFile::new(name, file.mime_type.clone(), contents));
    }

    Ok((description, clipboard))
}

fn cmd_replay(
    config: PasteConfig,
    payload: &Path,
    document: Option<&Path>,
    block: Option<usize>,
) -> Result<()> {
    let (description, clipboard) = load_payload(payload)?;
    let content = match document {
        Some(path) => ContentState::from_text(read(path)?.trim_end_matches('\n')),
        None => ContentState::from_blocks(Vec::new()),
    };
    let mut editor = Editor::with_content(description.editor_key.clone(), config, content);

    if let Some(text) = &description.internal_clipboard {
        seed_internal_clipboard(&mut editor, text);
    }

    let blocks: Vec<(String, usize)> = editor
        .content()
        .blocks()
        .map(|b| (b.key.clone(), b.len()))
        .collect();
    let target = match block {
        Some(idx) => blocks
            .get(idx)
            .ok_or_else(|| Error::Payload(format!("document has no block {idx}")))?,
        None => blocks
            .last()
            .ok_or_else(|| Error::Payload("document has no blocks".to_string()))?,
    };
    editor.set_selection(SelectionState::collapsed(target.0.clone(), target.1));

    let mut event = ClipboardEvent::new(clipboard);
    let status = match editor.paste(&mut event) {
        PasteStatus::Pending(pending) => future::block_on(editor.finish_file_paste(pending)),
        status => status,
    };

    println!("outcome: {}", status_name(&status));
    for block in editor.content().blocks() {
        let styles: Vec<&str> = block
            .characters()
            .iter()
            .flat_map(|c| c.style.iter())
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .collect();
        if styles.is_empty() {
            println!("{}\t{}", block.block_type.as_str(), block.text());
        } else {
            println!("{}\t{}\t[{}]", block.block_type.as_str(), block.text(), styles.join(","));
        }
    }
    println!(
        "internal clipboard: {}",
        if editor.internal_clipboard().is_empty() { "empty" } else { "kept" }
    );
    Ok(())
}

/// Put an earlier copy of `text` on the internal clipboard, leaving the document alone
fn seed_internal_clipboard(editor: &mut Editor, text: &str) {
    let copied = ContentState::from_text(text);
    let fragment = Fragment::from_blocks(copied.blocks().cloned());
    editor.internal_clipboard_mut().set(Some(fragment));
}

fn status_name(status: &PasteStatus) -> &'static str {
    match status {
        PasteStatus::Inserted => "inserted",
        PasteStatus::Delegated => "delegated",
        PasteStatus::NoOp => "no-op",
        PasteStatus::Pending(_) => "pending",
    }
}

fn cmd_split(text: &str) {
    let text = text.replace("\\n", "\n").replace("\\r", "\r");
    for (idx, block) in split_text_into_blocks(&text).iter().enumerate() {
        println!("{}: {:?}", idx, block);
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => match PasteConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },
        None => PasteConfig::load_default(),
    };

    let result = match args.command {
        Commands::Replay {
            payload,
            document,
            block,
        } => cmd_replay(config, &payload, document.as_deref(), block),
        Commands::Split { text } => {
            cmd_split(&text);
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
