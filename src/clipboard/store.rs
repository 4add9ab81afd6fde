use crate::document::Fragment;

/// The editor's record of the last fragment it copied.
///
/// Written by the copy path. The paste path only reads it, and clears it once
/// a paste proves it stale.
#[derive(Debug, Clone, Default)]
pub struct InternalClipboard {
    fragment: Option<Fragment>,
}

impl InternalClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<&Fragment> {
        self.fragment.as_ref()
    }

    pub fn set(&mut self, fragment: Option<Fragment>) {
        self.fragment = fragment;
    }

    pub fn clear(&mut self) {
        self.fragment = None;
    }

    pub fn is_empty(&self) -> bool {
        self.fragment.is_none()
    }
}
