// Library exports for paste-reconcile

pub mod clipboard;
pub mod document;
pub mod editor;
pub mod editor_state;
pub mod error;
pub mod paste;

pub use editor::{Editor, PasteStatus};
pub use editor_state::{ChangeType, EditorState};
pub use error::{Error, Result};
