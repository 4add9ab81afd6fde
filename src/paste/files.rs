use std::future::Future;
use std::pin::Pin;

use futures_lite::future;
use tracing::debug;

use crate::clipboard::PastedFile;

/// Completion of a file read. Polled on the editor's own thread, so it need not be `Send`.
pub type TextFuture = Pin<Box<dyn Future<Output = String>>>;

const TEXT_TYPES: &[&str] = &["text/plain", "text/html", "text/rtf"];
const TEXT_CLIPPING_SUFFIX: &str = ".textClipping";

/// Reads the text content of pasted or dropped files
pub trait FileTextExtractor {
    /// Resolve to the combined text of `files`, or an empty string if none is readable
    fn extract(&self, files: Vec<PastedFile>) -> TextFuture;
}

/// Extracts text from text-typed files, truncating each to a character cap.
///
/// Files without a MIME type are only understood when they are macOS text
/// clippings, whose name is the clipped text.
#[derive(Debug, Clone)]
pub struct TextFileExtractor {
    max_chars: usize,
}

impl TextFileExtractor {
    pub fn new(max_chars: usize) -> Self {
        TextFileExtractor { max_chars }
    }
}

impl FileTextExtractor for TextFileExtractor {
    fn extract(&self, files: Vec<PastedFile>) -> TextFuture {
        let max_chars = self.max_chars;
        Box::pin(async move {
            let mut results = Vec::with_capacity(files.len());
            for file in &files {
                // One file per turn of the task queue
                future::yield_now().await;
                let text = read_file(file);
                if !text.is_empty() {
                    results.push(text.chars().take(max_chars).collect::<String>());
                }
            }
            results.join("\r")
        })
    }
}

fn read_file(file: &PastedFile) -> String {
    if file.mime_type.is_empty() {
        return file
            .name
            .strip_suffix(TEXT_CLIPPING_SUFFIX)
            .map(str::to_string)
            .unwrap_or_default();
    }
    if !TEXT_TYPES.contains(&file.mime_type.as_str()) {
        debug!(name = %file.name, mime_type = %file.mime_type, "skipping non-text file");
        return String::new();
    }
    String::from_utf8_lossy(&file.contents).into_owned()
}
