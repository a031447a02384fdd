//! Visibility - what a reader at a given position is allowed to see.
//!
//! Everything is decided by comparing global indices against the selected
//! position `P`:
//! - a character is visible once its first appearance resolves to `<= P`
//! - a faction is visible once some visible character lists it
//! - a relationship is visible once both of its characters are
//!
//! References that do not resolve never reveal anything. Moving `P` forward
//! only ever adds to the visible set.

use crate::hierarchy::{Hierarchy, Position};
use book_model::{
    Annotation, Character, CharacterId, Faction, FactionId, Location, LocationId, NodeRef, Relationship, RelationshipId,
    WorkDataset,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// How relationship annotations are revealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationPolicy {
    /// A visible relationship shows every annotation it has.
    #[default]
    AllOrNothing,
    /// Only annotations tied to a node at or before the position are shown.
    /// Undated annotations are always shown.
    Progressive,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VisibilityOptions {
    pub annotations: AnnotationPolicy,
}

/// A visible relationship together with the annotations the reader may see.
#[derive(Debug, Clone, PartialEq)]
pub struct VisibleRelationship<'a> {
    pub relationship: &'a Relationship,
    pub annotations: Vec<&'a Annotation>,
}

impl<'a> VisibleRelationship<'a> {
    pub fn id(&self) -> RelationshipId {
        self.relationship.id()
    }

    /// First visible annotation text, if any.
    pub fn headline(&self) -> Option<&'a str> {
        self.annotations.first().map(|a| a.text.as_str())
    }
}

/// Name shown for a location the dataset does not define.
pub const UNKNOWN_LOCATION: &str = "Unknown Location";

/// A location the selected node is set in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneLocation<'a> {
    pub id: &'a LocationId,
    /// `None` when the dataset has no such location.
    pub location: Option<&'a Location>,
}

impl<'a> SceneLocation<'a> {
    pub fn name(&self) -> &'a str {
        self.location.map_or(UNKNOWN_LOCATION, |l| l.name.as_str())
    }

    /// Owned copy, with a placeholder for unknown ids.
    pub fn to_location(&self) -> Location {
        match self.location {
            Some(location) => location.clone(),
            None => Location::new(self.id.clone(), UNKNOWN_LOCATION),
        }
    }
}

/// What is visible at one position. Characters and factions keep dataset order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VisibleSet<'a> {
    pub position: Option<Position>,
    pub characters: Vec<&'a Character>,
    pub factions: Vec<&'a Faction>,
    pub relationships: Vec<VisibleRelationship<'a>>,
    /// Locations of the selected node itself, in listing order.
    pub locations: Vec<SceneLocation<'a>>,
    active: HashMap<&'a CharacterId, Vec<&'a FactionId>>,
}

impl<'a> VisibleSet<'a> {
    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }

    pub fn character(&self, id: &CharacterId) -> Option<&'a Character> {
        self.characters.iter().copied().find(|c| &c.id == id)
    }

    pub fn contains_character(&self, id: &CharacterId) -> bool {
        self.active.contains_key(id)
    }

    pub fn faction(&self, id: &FactionId) -> Option<&'a Faction> {
        self.factions.iter().copied().find(|f| &f.id == id)
    }

    /// Factions the character has joined by this position, in listing order.
    /// Factions missing from the dataset are left out.
    pub fn active_factions(&self, id: &CharacterId) -> &[&'a FactionId] {
        self.active.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Visible relationships that involve `id`.
    pub fn relationships_of<'s>(&'s self, id: &'s CharacterId) -> impl Iterator<Item = &'s VisibleRelationship<'a>> + 's {
        self.relationships.iter().filter(move |r| r.relationship.involves(id))
    }
}

#[derive(Debug, Clone, Default)]
pub struct VisibilityFilter {
    options: VisibilityOptions,
}

impl VisibilityFilter {
    pub fn new(options: VisibilityOptions) -> Self {
        Self { options }
    }

    pub fn with_defaults() -> Self {
        Self::new(VisibilityOptions::default())
    }

    pub fn options(&self) -> &VisibilityOptions {
        &self.options
    }

    /// Visible subset at the selected node; the selection is clamped first.
    pub fn filter<'a>(&self, dataset: &'a WorkDataset, hierarchy: &Hierarchy, selected: &NodeRef) -> VisibleSet<'a> {
        self.filter_at(dataset, hierarchy, hierarchy.resolve_selection(selected))
    }

    /// Visible subset at an already resolved position. `None` reveals nothing.
    pub fn filter_at<'a>(
        &self,
        dataset: &'a WorkDataset,
        hierarchy: &Hierarchy,
        position: Option<Position>,
    ) -> VisibleSet<'a> {
        let Some(position) = position else {
            return VisibleSet::default();
        };
        let reached = |reference: &NodeRef| {
            hierarchy
                .global_index_of(reference)
                .is_some_and(|index| index <= position.global_index)
        };

        let characters: Vec<&Character> = dataset
            .characters()
            .iter()
            .filter(|c| reached(&c.first_appearance))
            .collect();

        let listed: HashSet<&FactionId> = characters.iter().flat_map(|c| c.faction_ids()).collect();
        let factions: Vec<&Faction> = dataset.factions().iter().filter(|f| listed.contains(&f.id)).collect();
        let known: HashSet<&FactionId> = factions.iter().map(|f| &f.id).collect();

        let active: HashMap<&CharacterId, Vec<&FactionId>> = characters
            .iter()
            .map(|&c| {
                let joined = c
                    .factions
                    .iter()
                    .filter(|m| known.contains(&m.faction))
                    .filter(|m| m.since.as_ref().map_or(true, |since| reached(since)))
                    .map(|m| &m.faction)
                    .collect();
                (&c.id, joined)
            })
            .collect();

        let relationships: Vec<VisibleRelationship> = dataset
            .relationships()
            .iter()
            .filter(|r| active.contains_key(&r.a) && active.contains_key(&r.b))
            .map(|relationship| {
                let annotations = match self.options.annotations {
                    AnnotationPolicy::AllOrNothing => relationship.annotations.iter().collect(),
                    AnnotationPolicy::Progressive => relationship
                        .annotations
                        .iter()
                        .filter(|a| match &a.node {
                            None => true,
                            Some(node) => hierarchy
                                .global_index_of(node)
                                .map_or(true, |index| index <= position.global_index),
                        })
                        .collect(),
                };
                VisibleRelationship {
                    relationship,
                    annotations,
                }
            })
            .collect();

        // Arena indices are source positions in the dataset's structure.
        let locations: Vec<SceneLocation> = dataset
            .structure()
            .get(position.node.0)
            .map(|node| {
                node.locations
                    .iter()
                    .map(|id| SceneLocation {
                        id,
                        location: dataset.location(id),
                    })
                    .collect()
            })
            .unwrap_or_default();

        tracing::debug!(
            position = position.global_index,
            characters = characters.len(),
            factions = factions.len(),
            relationships = relationships.len(),
            "filtered visible set"
        );

        VisibleSet {
            position: Some(position),
            characters,
            factions,
            relationships,
            locations,
            active,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use book_model::{Author, BookInfo, FactionMembership, StructuralNode};

    fn chapters(n: u32) -> Vec<StructuralNode> {
        (1..=n)
            .map(|i| StructuralNode::chapter(format!("ch{}", i), format!("Chapter {}", i)))
            .collect()
    }

    fn fellowship() -> WorkDataset {
        WorkDataset::new(
            BookInfo::new("lotr", "The Lord of the Rings", Author::default()),
            chapters(12),
            vec![
                Character::new("frodo", "Frodo", NodeRef::id("ch1")).with_faction("hobbits"),
                Character::new("gandalf", "Gandalf", NodeRef::index(1))
                    .with_faction("istari")
                    .with_membership(FactionMembership::new("fellowship").since(NodeRef::id("ch6"))),
                Character::new("aragorn", "Aragorn", NodeRef::index(6)).with_faction("fellowship"),
                Character::new("ghost", "Ghost", NodeRef::id("nowhere")),
            ],
            vec![
                Faction::new("hobbits", "Hobbits", "#4caf50"),
                Faction::new("istari", "Istari", "#9e9e9e"),
                Faction::new("fellowship", "Fellowship", "#2196f3"),
            ],
            vec![
                Relationship::new("frodo", "gandalf")
                    .with_annotation(Annotation::new(NodeRef::index(1), "Old friends"))
                    .with_annotation(Annotation::new(NodeRef::index(9), "Parted in Moria")),
                Relationship::new("frodo", "aragorn"),
                Relationship::new("frodo", "sauron"),
                Relationship::new("ghost", "frodo"),
            ],
        )
    }

    fn ids<'a>(set: &VisibleSet<'a>) -> Vec<&'a str> {
        set.characters.iter().map(|&c| c.id.as_str()).collect()
    }

    #[test]
    fn test_characters_revealed_by_first_appearance() {
        let dataset = fellowship();
        let hierarchy = Hierarchy::from_dataset(&dataset);
        let filter = VisibilityFilter::default();

        assert_eq!(ids(&filter.filter(&dataset, &hierarchy, &NodeRef::index(3))), ["frodo", "gandalf"]);
        assert_eq!(
            ids(&filter.filter(&dataset, &hierarchy, &NodeRef::index(6))),
            ["frodo", "gandalf", "aragorn"]
        );
    }

    #[test]
    fn test_unresolvable_first_appearance_never_visible() {
        let dataset = fellowship();
        let hierarchy = Hierarchy::from_dataset(&dataset);
        let set = VisibilityFilter::default().filter(&dataset, &hierarchy, &NodeRef::index(12));
        assert!(!set.contains_character(&"ghost".into()));
    }

    #[test]
    fn test_relationships_need_both_endpoints() {
        let dataset = fellowship();
        let hierarchy = Hierarchy::from_dataset(&dataset);
        let filter = VisibilityFilter::default();

        let early = filter.filter(&dataset, &hierarchy, &NodeRef::index(3));
        assert_eq!(early.relationships.len(), 1);

        let late = filter.filter(&dataset, &hierarchy, &NodeRef::index(12));
        let pairs: Vec<_> = late.relationships.iter().map(|r| r.relationship.pair()).collect();
        assert_eq!(pairs.len(), 2);
        assert!(late
            .relationships
            .iter()
            .all(|r| !r.relationship.involves(&"sauron".into()) && !r.relationship.involves(&"ghost".into())));
    }

    #[test]
    fn test_factions_follow_visible_members() {
        let dataset = fellowship();
        let hierarchy = Hierarchy::from_dataset(&dataset);
        let filter = VisibilityFilter::default();

        let set = filter.filter(&dataset, &hierarchy, &NodeRef::index(3));
        let factions: Vec<&str> = set.factions.iter().map(|f| f.id.as_str()).collect();
        // Gandalf lists the fellowship before joining it.
        assert_eq!(factions, ["hobbits", "istari", "fellowship"]);
    }

    #[test]
    fn test_active_factions_respect_join_position() {
        let dataset = fellowship();
        let hierarchy = Hierarchy::from_dataset(&dataset);
        let filter = VisibilityFilter::default();
        let gandalf: CharacterId = "gandalf".into();

        let early = filter.filter(&dataset, &hierarchy, &NodeRef::index(3));
        let joined: Vec<&str> = early.active_factions(&gandalf).iter().map(|f| f.as_str()).collect();
        assert_eq!(joined, ["istari"]);

        let later = filter.filter(&dataset, &hierarchy, &NodeRef::index(6));
        let joined: Vec<&str> = later.active_factions(&gandalf).iter().map(|f| f.as_str()).collect();
        assert_eq!(joined, ["istari", "fellowship"]);
    }

    #[test]
    fn test_annotation_policies() {
        let dataset = fellowship();
        let hierarchy = Hierarchy::from_dataset(&dataset);
        let frodo: CharacterId = "frodo".into();
        let gandalf: CharacterId = "gandalf".into();
        let pair = RelationshipId::for_pair(&frodo, &gandalf);

        let all = VisibilityFilter::default().filter(&dataset, &hierarchy, &NodeRef::index(3));
        let rel = all.relationships.iter().find(|r| r.id() == pair).unwrap();
        assert_eq!(rel.annotations.len(), 2);

        let progressive = VisibilityFilter::new(VisibilityOptions {
            annotations: AnnotationPolicy::Progressive,
        });
        let set = progressive.filter(&dataset, &hierarchy, &NodeRef::index(3));
        let rel = set.relationships.iter().find(|r| r.id() == pair).unwrap();
        assert_eq!(rel.headline(), Some("Old friends"));
        assert_eq!(rel.annotations.len(), 1);
    }

    #[test]
    fn test_unresolvable_join_counts_as_not_joined() {
        let dataset = WorkDataset::new(
            BookInfo::new("w", "W", Author::default()),
            chapters(3),
            vec![Character::new("sam", "Sam", NodeRef::index(1))
                .with_membership(FactionMembership::new("hobbits"))
                .with_membership(FactionMembership::new("fellowship").since(NodeRef::id("chapter-99")))],
            vec![
                Faction::new("hobbits", "Hobbits", "#4caf50"),
                Faction::new("fellowship", "Fellowship", "#2196f3"),
            ],
            Vec::new(),
        );
        let hierarchy = Hierarchy::from_dataset(&dataset);
        let set = VisibilityFilter::default().filter(&dataset, &hierarchy, &NodeRef::index(3));
        let joined: Vec<&str> = set.active_factions(&"sam".into()).iter().map(|f| f.as_str()).collect();
        assert_eq!(joined, ["hobbits"]);
        // Still listed, so the faction itself is known.
        assert!(set.faction(&"fellowship".into()).is_some());
    }

    #[test]
    fn test_locations_of_selected_node() {
        let dataset = WorkDataset::new(
            BookInfo::new("w", "W", Author::default()),
            vec![
                StructuralNode::chapter("c1", "Down the Rabbit-Hole").with_location("hole"),
                StructuralNode::chapter("c2", "The Pool of Tears")
                    .with_location("pool")
                    .with_location("shore"),
            ],
            Vec::new(),
            Vec::new(),
            Vec::new(),
        )
        .with_locations([Location::new("hole", "The Rabbit Hole"), Location::new("pool", "The Pool of Tears")]);
        let hierarchy = Hierarchy::from_dataset(&dataset);
        let filter = VisibilityFilter::default();

        let names: Vec<&str> = filter
            .filter(&dataset, &hierarchy, &NodeRef::id("c2"))
            .locations
            .iter()
            .map(|l| l.name())
            .collect();
        assert_eq!(names, ["The Pool of Tears", UNKNOWN_LOCATION]);

        let first = filter.filter(&dataset, &hierarchy, &NodeRef::index(1));
        assert_eq!(first.locations.len(), 1);
        assert_eq!(first.locations[0].to_location(), Location::new("hole", "The Rabbit Hole"));
    }

    #[test]
    fn test_empty_hierarchy_reveals_nothing() {
        let dataset = WorkDataset::new(
            BookInfo::new("empty", "Empty", Author::default()),
            Vec::new(),
            vec![Character::new("a", "A", NodeRef::index(1))],
            Vec::new(),
            Vec::new(),
        );
        let hierarchy = Hierarchy::from_dataset(&dataset);
        let set = VisibilityFilter::default().filter(&dataset, &hierarchy, &NodeRef::index(1));
        assert!(set.position.is_none());
        assert!(set.is_empty());
    }
}
