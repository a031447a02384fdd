//! The per-work aggregate handed to the reveal core.

mod source;

pub use source::*;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::entities::{
    Character, CharacterId, Faction, FactionId, Location, LocationId, Relationship, RelationshipId, WorkId,
};
use crate::error::{ModelError, Result};
use crate::structure::StructuralNode;

/// Author metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Author {
    #[serde(default)]
    pub id: String,
    pub name: String,
}

/// Book metadata. `id` doubles as the work's key in a library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "BookSource")]
pub struct BookInfo {
    pub id: WorkId,
    pub title: String,
    pub author: Author,
    /// Map image of the world the work is set in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map_url: Option<String>,
}

impl BookInfo {
    pub fn new(id: impl Into<WorkId>, title: impl Into<String>, author: Author) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            author,
            map_url: None,
        }
    }

    pub fn with_map_url(mut self, url: impl Into<String>) -> Self {
        self.map_url = Some(url.into());
        self
    }
}

/// Everything known about one work. Immutable once constructed.
///
/// Construction enforces uniqueness: the first character or faction with a
/// given id wins, self-relationships are dropped and relationships sharing
/// an unordered pair are merged into the first one, annotations appended in
/// source order. Dangling references are kept; consumers exclude them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "DatasetSource")]
pub struct WorkDataset {
    book: BookInfo,
    structure: Vec<StructuralNode>,
    characters: Vec<Character>,
    factions: Vec<Faction>,
    relationships: Vec<Relationship>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    locations: Vec<Location>,

    #[serde(skip)]
    character_index: HashMap<CharacterId, usize>,
    #[serde(skip)]
    faction_index: HashMap<FactionId, usize>,
    #[serde(skip)]
    location_index: HashMap<LocationId, usize>,
}

impl WorkDataset {
    /// Build a dataset, deduplicating entities as described on the type.
    pub fn new(
        book: BookInfo,
        structure: Vec<StructuralNode>,
        characters: Vec<Character>,
        factions: Vec<Faction>,
        relationships: Vec<Relationship>,
    ) -> Self {
        let mut character_index = HashMap::new();
        let mut unique_characters = Vec::with_capacity(characters.len());
        for character in characters {
            if character_index.contains_key(&character.id) {
                tracing::warn!(work = %book.id, character = %character.id, "duplicate character id, keeping first");
                continue;
            }
            character_index.insert(character.id.clone(), unique_characters.len());
            unique_characters.push(character);
        }

        let mut faction_index = HashMap::new();
        let mut unique_factions = Vec::with_capacity(factions.len());
        for faction in factions {
            if faction_index.contains_key(&faction.id) {
                tracing::warn!(work = %book.id, faction = %faction.id, "duplicate faction id, keeping first");
                continue;
            }
            faction_index.insert(faction.id.clone(), unique_factions.len());
            unique_factions.push(faction);
        }

        let mut pair_index: HashMap<RelationshipId, usize> = HashMap::new();
        let mut merged: Vec<Relationship> = Vec::with_capacity(relationships.len());
        for relationship in relationships {
            if relationship.is_self_loop() {
                tracing::debug!(work = %book.id, character = %relationship.a, "dropping self-relationship");
                continue;
            }
            match pair_index.get(&relationship.id()) {
                Some(&existing) => {
                    tracing::warn!(
                        work = %book.id,
                        a = %relationship.a,
                        b = %relationship.b,
                        "duplicate relationship pair, merging annotations"
                    );
                    let target = &mut merged[existing];
                    target.annotations.extend(relationship.annotations);
                    if target.default_description.is_none() {
                        target.default_description = relationship.default_description;
                    }
                }
                None => {
                    pair_index.insert(relationship.id(), merged.len());
                    merged.push(relationship);
                }
            }
        }

        Self {
            book,
            structure,
            characters: unique_characters,
            factions: unique_factions,
            relationships: merged,
            locations: Vec::new(),
            character_index,
            faction_index,
            location_index: HashMap::new(),
        }
    }

    /// Attach the work's locations. The first location with a given id wins.
    pub fn with_locations(mut self, locations: impl IntoIterator<Item = Location>) -> Self {
        for location in locations {
            if self.location_index.contains_key(&location.id) {
                tracing::warn!(work = %self.book.id, location = %location.id, "duplicate location id, keeping first");
                continue;
            }
            self.location_index.insert(location.id.clone(), self.locations.len());
            self.locations.push(location);
        }
        self
    }

    /// Parse a dataset from JSON.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse a dataset from TOML.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load a dataset file, choosing the format by extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let parse: fn(&str) -> Result<Self> = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str,
            Some("toml") => Self::from_toml_str,
            _ => return Err(ModelError::UnsupportedFormat(path.to_path_buf())),
        };
        let text = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let dataset = parse(&text)?;
        tracing::debug!(
            work = %dataset.id(),
            nodes = dataset.structure.len(),
            characters = dataset.characters.len(),
            relationships = dataset.relationships.len(),
            "loaded dataset from {}",
            path.display()
        );
        Ok(dataset)
    }

    pub fn id(&self) -> &WorkId {
        &self.book.id
    }

    pub fn book(&self) -> &BookInfo {
        &self.book
    }

    /// Structural nodes in source order.
    pub fn structure(&self) -> &[StructuralNode] {
        &self.structure
    }

    pub fn characters(&self) -> &[Character] {
        &self.characters
    }

    pub fn factions(&self) -> &[Faction] {
        &self.factions
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn location(&self, id: &LocationId) -> Option<&Location> {
        self.location_index.get(id).map(|&i| &self.locations[i])
    }

    pub fn character(&self, id: &CharacterId) -> Option<&Character> {
        self.character_index.get(id).map(|&i| &self.characters[i])
    }

    pub fn faction(&self, id: &FactionId) -> Option<&Faction> {
        self.faction_index.get(id).map(|&i| &self.factions[i])
    }

    /// Relationships with `character` as an endpoint.
    pub fn relationships_of<'a>(
        &'a self,
        character: &'a CharacterId,
    ) -> impl Iterator<Item = &'a Relationship> + 'a {
        self.relationships.iter().filter(move |r| r.involves(character))
    }
}

impl PartialEq for WorkDataset {
    fn eq(&self, other: &Self) -> bool {
        self.book == other.book
            && self.structure == other.structure
            && self.characters == other.characters
            && self.factions == other.factions
            && self.relationships == other.relationships
            && self.locations == other.locations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Annotation;
    use crate::structure::NodeRef;

    fn book() -> BookInfo {
        BookInfo::new("alice", "Alice's Adventures in Wonderland", Author::default())
    }

    #[test]
    fn test_duplicate_characters_keep_first() {
        let dataset = WorkDataset::new(
            book(),
            vec![StructuralNode::chapter("c1", "Down the Rabbit-Hole")],
            vec![
                Character::new("alice", "Alice", NodeRef::index(1)),
                Character::new("alice", "Impostor", NodeRef::index(1)),
            ],
            vec![],
            vec![],
        );
        assert_eq!(dataset.characters().len(), 1);
        assert_eq!(dataset.character(&"alice".into()).unwrap().name, "Alice");
    }

    #[test]
    fn test_relationship_pairs_merged() {
        let dataset = WorkDataset::new(
            book(),
            vec![],
            vec![],
            vec![],
            vec![
                Relationship::new("alice", "whiteRabbit")
                    .with_annotation(Annotation::new(NodeRef::index(1), "Alice follows the White Rabbit")),
                Relationship::new("whiteRabbit", "alice")
                    .with_annotation(Annotation::new(NodeRef::index(4), "Sent to fetch gloves")),
                Relationship::new("alice", "alice"),
            ],
        );
        assert_eq!(dataset.relationships().len(), 1);
        let annotations = &dataset.relationships()[0].annotations;
        assert_eq!(annotations.len(), 2);
        assert_eq!(annotations[0].text, "Alice follows the White Rabbit");
    }

    #[test]
    fn test_relationships_of() {
        let dataset = WorkDataset::new(
            book(),
            vec![],
            vec![],
            vec![],
            vec![
                Relationship::new("alice", "whiteRabbit"),
                Relationship::new("alice", "madHatter"),
                Relationship::new("madHatter", "marchHare"),
            ],
        );
        let alice = CharacterId::from("alice");
        assert_eq!(dataset.relationships_of(&alice).count(), 2);
    }

    #[test]
    fn test_duplicate_locations_keep_first() {
        let dataset = WorkDataset::new(book(), vec![], vec![], vec![], vec![]).with_locations([
            Location::new("pool", "The Pool of Tears"),
            Location::new("pool", "Somewhere Else"),
            Location::new("garden", "The Queen's Garden"),
        ]);
        assert_eq!(dataset.locations().len(), 2);
        assert_eq!(dataset.location(&"pool".into()).unwrap().name, "The Pool of Tears");
        assert!(dataset.location(&"teaParty".into()).is_none());
    }

    #[test]
    fn test_load_rejects_unknown_extension() {
        let err = WorkDataset::load("dataset.yaml").unwrap_err();
        assert!(matches!(err, ModelError::UnsupportedFormat(_)));

        let err = WorkDataset::load("does-not-exist.json").unwrap_err();
        assert!(matches!(err, ModelError::Io { .. }));
    }
}
