// Paste handling: the reconciler and the collaborators it routes through

pub mod config;
pub mod entities;
pub mod files;
pub mod hooks;
pub mod html;
pub mod reconciler;
pub mod tdoc_bridge;
pub mod text;

pub use config::{BlockRenderMap, PasteConfig};
pub use entities::clone_entities_in_fragment;
pub use files::{FileTextExtractor, TextFileExtractor, TextFuture};
pub use hooks::{HandleValue, NoHooks, PasteHooks};
pub use html::{HtmlFragmentParser, TdocHtmlParser};
pub use reconciler::{PasteOutcome, PasteReconciler, PendingFilePaste, insert_fragment};
pub use tdoc_bridge::tdoc_to_blocks;
pub use text::{process_text, split_text_into_blocks};
