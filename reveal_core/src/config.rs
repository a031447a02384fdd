//! Settings file for the reveal pipeline.
//!
//! ```toml
//! [graph]
//! placement = "cluster_by_faction"
//! fallback_color = "#888888"
//!
//! [visibility]
//! annotations = "progressive"
//! ```
//!
//! Every key is optional.

use crate::error::{Result, RevealError};
use crate::graph_model::GraphConfig;
use crate::visibility::VisibilityOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealConfig {
    pub graph: GraphConfig,
    pub visibility: VisibilityOptions,
}

impl RevealConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| RevealError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), ?config, "loaded configuration");
        Ok(config)
    }
}
