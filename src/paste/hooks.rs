use crate::clipboard::PastedFile;

/// Answer of a host hook
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleValue {
    /// The host took over; the editor does nothing further
    Handled,
    NotHandled,
}

/// Host overrides consulted before the editor touches the document
pub trait PasteHooks {
    fn handle_pasted_files(&mut self, _files: &[PastedFile]) -> HandleValue {
        HandleValue::NotHandled
    }

    fn handle_pasted_text(&mut self, _text: &str, _html: &str) -> HandleValue {
        HandleValue::NotHandled
    }
}

/// No overrides configured
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHooks;

impl PasteHooks for NoHooks {}
