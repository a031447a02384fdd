//! Errors raised while loading a work from its serialized form.

use std::path::PathBuf;
use thiserror::Error;

/// Failures at the loading boundary. Everything past loading is total.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON dataset: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid TOML dataset: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("unsupported dataset format for {0} (expected .json or .toml)")]
    UnsupportedFormat(PathBuf),
}

pub type Result<T> = std::result::Result<T, ModelError>;
