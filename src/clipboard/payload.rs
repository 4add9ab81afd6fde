// Clipboard payload
// Read-only view over one paste/drop event. All platform quirks about which
// MIME types mean what live here, behind fixed query methods.

use indexmap::IndexMap;

pub const TEXT_PLAIN: &str = "text/plain";
pub const TEXT_HTML: &str = "text/html";
pub const TEXT_RTF: &str = "text/rtf";
pub const TEXT_URI_LIST: &str = "text/uri-list";
/// Declared by Safari in place of `text/html` for some copies
pub const WEBARCHIVE: &str = "com.apple.webarchive";
/// Pseudo type browsers list when files are attached
pub const FILES: &str = "Files";

const RICH_TEXT_TYPES: &[&str] = &[TEXT_HTML, TEXT_RTF];

/// A file attached to a paste or drop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PastedFile {
    pub name: String,
    pub mime_type: String,
    pub contents: Vec<u8>,
}

impl PastedFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        PastedFile {
            name: name.into(),
            mime_type: mime_type.into(),
            contents: contents.into(),
        }
    }

    pub fn size(&self) -> usize {
        self.contents.len()
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}

/// Raw access to a platform clipboard, implemented once per platform API
pub trait ClipboardData {
    /// Declared types, in the order the platform reports them
    fn types(&self) -> Vec<String>;

    /// Data stored under `mime_type`, if any
    fn data(&self, mime_type: &str) -> Option<String>;

    fn files(&self) -> Vec<PastedFile>;
}

/// A paste or drop event as delivered by the host
pub trait PasteEvent {
    /// Suppress the platform's native handling of this event
    fn prevent_default(&mut self);

    fn clipboard_data(&self) -> &dyn ClipboardData;
}

/// In-memory clipboard contents: ordered type → data entries plus files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MimeClipboard {
    entries: IndexMap<String, String>,
    files: Vec<PastedFile>,
}

impl MimeClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        self.set(mime_type, data);
        self
    }

    pub fn with_file(mut self, file: PastedFile) -> Self {
        self.files.push(file);
        self
    }

    pub fn set(&mut self, mime_type: impl Into<String>, data: impl Into<String>) {
        self.entries.insert(mime_type.into(), data.into());
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.files.is_empty()
    }
}

impl ClipboardData for MimeClipboard {
    fn types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.entries.keys().cloned().collect();
        if !self.files.is_empty() {
            types.push(FILES.to_string());
        }
        types
    }

    fn data(&self, mime_type: &str) -> Option<String> {
        self.entries.get(mime_type).cloned()
    }

    fn files(&self) -> Vec<PastedFile> {
        self.files.clone()
    }
}

/// A paste event carrying any [`ClipboardData`]
#[derive(Debug, Clone, Default)]
pub struct ClipboardEvent<C> {
    data: C,
    default_prevented: bool,
}

impl<C: ClipboardData> ClipboardEvent<C> {
    pub fn new(data: C) -> Self {
        ClipboardEvent {
            data,
            default_prevented: false,
        }
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

impl<C: ClipboardData> PasteEvent for ClipboardEvent<C> {
    fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    fn clipboard_data(&self) -> &dyn ClipboardData {
        &self.data
    }
}

/// Query adapter over [`ClipboardData`], built once per paste event
pub struct ClipboardPayload<'a> {
    data: &'a dyn ClipboardData,
    types: Vec<String>,
}

impl<'a> ClipboardPayload<'a> {
    pub fn new(data: &'a dyn ClipboardData) -> Self {
        ClipboardPayload {
            types: data.types(),
            data,
        }
    }

    pub fn types(&self) -> &[String] {
        &self.types
    }

    /// Exact membership test against the declared types
    pub fn has_type(&self, name: &str) -> bool {
        self.types.iter().any(|t| t == name)
    }

    /// Whether the payload carries more than plain text.
    ///
    /// HTML accompanied by text always counts. Image-only payloads never do,
    /// even when they declare extra types (copying an image from a preview
    /// window also puts its metadata on the clipboard as text).
    pub fn is_rich_text(&self) -> bool {
        if !self.html().is_empty() && !self.text().is_empty() {
            return true;
        }
        if self.is_image() {
            return false;
        }
        self.types.iter().any(|t| RICH_TEXT_TYPES.contains(&t.as_str()))
    }

    /// True when every attached file is an image, or the platform flags a dragged file
    pub fn is_image(&self) -> bool {
        if self.types.iter().any(|t| t.contains("application/x-moz-file")) {
            return true;
        }
        let files = self.data.files();
        !files.is_empty() && files.iter().all(PastedFile::is_image)
    }

    /// Plain text with CRLF line endings normalised to LF
    pub fn text(&self) -> String {
        let text = if self.types.is_empty() {
            self.data.data("Text")
        } else {
            self.data.data(TEXT_PLAIN)
        };
        text.map(|t| t.replace("\r\n", "\n")).unwrap_or_default()
    }

    pub fn html(&self) -> String {
        self.data.data(TEXT_HTML).unwrap_or_default()
    }

    /// First link in the payload, if it carries one
    pub fn link(&self) -> Option<String> {
        if let Some(list) = self.data.data(TEXT_URI_LIST) {
            let first = list
                .lines()
                .map(str::trim)
                .find(|line| !line.is_empty() && !line.starts_with('#'));
            if let Some(url) = first {
                return Some(url.to_string());
            }
        }
        self.data.data("URL").filter(|url| !url.is_empty())
    }

    pub fn files(&self) -> Vec<PastedFile> {
        self.data.files()
    }
}
