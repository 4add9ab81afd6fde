// Clipboard access: platform payload adapter and the internal clipboard store

pub mod payload;
pub mod store;

pub use payload::{
    ClipboardData, ClipboardEvent, ClipboardPayload, MimeClipboard, PasteEvent, PastedFile,
};
pub use store::InternalClipboard;
