use std::path::PathBuf;

use thiserror::Error;

/// Errors raised outside the paste path itself (config loading, replay input).
///
/// Reconciling a paste never fails: every branch has a fallback.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration in {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid payload description: {0}")]
    Payload(String),
}

pub type Result<T> = std::result::Result<T, Error>;
