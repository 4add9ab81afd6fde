use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Deserializer};
use tracing::{debug, warn};

use crate::document::BlockType;
use crate::error::{Error, Result};

/// Longest text, in characters, taken from a single pasted file
pub const DEFAULT_MAX_FILE_TEXT_CHARS: usize = 5000;

/// HTML element name → block type used when parsing pasted HTML
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockRenderMap {
    elements: HashMap<String, BlockType>,
}

impl Default for BlockRenderMap {
    fn default() -> Self {
        let elements = [
            ("p", BlockType::Unstyled),
            ("div", BlockType::Unstyled),
            ("h1", BlockType::HeaderOne),
            ("h2", BlockType::HeaderTwo),
            ("h3", BlockType::HeaderThree),
            ("h4", BlockType::HeaderFour),
            ("h5", BlockType::HeaderFive),
            ("h6", BlockType::HeaderSix),
            ("li", BlockType::UnorderedListItem),
            ("blockquote", BlockType::Blockquote),
            ("pre", BlockType::CodeBlock),
            ("figure", BlockType::Atomic),
        ];
        BlockRenderMap {
            elements: elements
                .into_iter()
                .map(|(tag, block_type)| (tag.to_string(), block_type))
                .collect(),
        }
    }
}

impl BlockRenderMap {
    /// An empty map: every element is treated as inline
    pub fn empty() -> Self {
        BlockRenderMap {
            elements: HashMap::new(),
        }
    }

    pub fn block_type_for(&self, element: &str) -> Option<BlockType> {
        self.elements.get(&element.to_ascii_lowercase()).copied()
    }

    pub fn set(&mut self, element: impl Into<String>, block_type: BlockType) {
        self.elements.insert(element.into().to_ascii_lowercase(), block_type);
    }

    /// Element used to serialise a block type: the shortest alias, ties broken by name
    pub fn element_for(&self, block_type: BlockType) -> Option<&str> {
        let mut tags: Vec<&str> = self
            .elements
            .iter()
            .filter(|(_, bt)| **bt == block_type)
            .map(|(tag, _)| tag.as_str())
            .collect();
        tags.sort_unstable_by_key(|tag| (tag.len(), *tag));
        tags.first().copied()
    }
}

/// Entries from the config file extend the default map
fn deserialize_render_map<'de, D>(deserializer: D) -> std::result::Result<BlockRenderMap, D::Error>
where
    D: Deserializer<'de>,
{
    let overrides = HashMap::<String, BlockType>::deserialize(deserializer)?;
    let mut map = BlockRenderMap::default();
    for (element, block_type) in overrides {
        map.set(element, block_type);
    }
    Ok(map)
}

/// Paste behaviour of an editor instance
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PasteConfig {
    /// Skip internal-clipboard and HTML reconciliation; always paste plain text
    pub strip_pasted_styles: bool,
    /// Give every internal paste its own copies of the entities it references
    pub paste_unique_entities: bool,
    /// Per-file cap on extracted text
    pub max_file_text_chars: usize,
    #[serde(deserialize_with = "deserialize_render_map")]
    pub block_render_map: BlockRenderMap,
}

impl Default for PasteConfig {
    fn default() -> Self {
        PasteConfig {
            strip_pasted_styles: false,
            paste_unique_entities: false,
            max_file_text_chars: DEFAULT_MAX_FILE_TEXT_CHARS,
            block_render_map: BlockRenderMap::default(),
        }
    }
}

impl PasteConfig {
    /// Load from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents).map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(contents: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Load from the platform config directory, falling back to defaults
    pub fn load_default() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        if !path.exists() {
            debug!(path = %path.display(), "no paste config, using defaults");
            return Self::default();
        }
        match Self::load(&path) {
            Ok(config) => config,
            Err(err) => {
                warn!(error = %err, "ignoring unreadable paste config");
                Self::default()
            }
        }
    }

    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "paste-reconcile").map(|dirs| dirs.config_dir().join("paste.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PasteConfig::default();
        assert!(!config.strip_pasted_styles);
        assert!(!config.paste_unique_entities);
        assert_eq!(config.max_file_text_chars, DEFAULT_MAX_FILE_TEXT_CHARS);
        assert_eq!(config.block_render_map.block_type_for("H2"), Some(BlockType::HeaderTwo));
        assert_eq!(config.block_render_map.block_type_for("span"), None);
    }

    #[test]
    fn test_from_toml_extends_render_map() {
        let config = PasteConfig::from_toml(
            r#"
            paste_unique_entities = true

            [block_render_map]
            section = "blockquote"
            h1 = "header-two"
            "#,
        )
        .unwrap();

        assert!(config.paste_unique_entities);
        assert!(!config.strip_pasted_styles);
        let map = &config.block_render_map;
        assert_eq!(map.block_type_for("section"), Some(BlockType::Blockquote));
        assert_eq!(map.block_type_for("h1"), Some(BlockType::HeaderTwo));
        assert_eq!(map.block_type_for("p"), Some(BlockType::Unstyled));
    }

    #[test]
    fn test_unknown_block_type_is_rejected() {
        let result = PasteConfig::from_toml("[block_render_map]\nsection = \"sidebar\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_element_for() {
        let map = BlockRenderMap::default();
        assert_eq!(map.element_for(BlockType::Unstyled), Some("p"));
        assert_eq!(map.element_for(BlockType::HeaderThree), Some("h3"));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = PasteConfig::load(Path::new("/nonexistent/paste.toml")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
