//! Faction definitions.

use serde::{Deserialize, Serialize};

use super::FactionId;

/// A group characters can belong to; its color is a display token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Faction {
    pub id: FactionId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Hex color, e.g. `#E7C7A7`.
    pub color: String,
}

impl Faction {
    pub fn new(id: impl Into<FactionId>, title: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            color: color.into(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}
