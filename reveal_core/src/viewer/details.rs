use crate::hierarchy::Hierarchy;
use crate::visibility::VisibleSet;
use book_model::{Annotation, Character, CharacterId, Faction};

/// One visible relationship from the activated character's side.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipDetail<'a> {
    pub other: &'a CharacterId,
    /// Name of the other character, or its id if it is unknown.
    pub other_name: &'a str,
    pub annotations: Vec<&'a Annotation>,
    pub default_description: Option<&'a str>,
}

/// Details view contents for an activated graph node.
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterDetails<'a> {
    pub character: &'a Character,
    /// Where the character first appears, e.g. `The Two Towers, Chapter 3`.
    pub first_appearance: String,
    pub factions: Vec<&'a Faction>,
    pub relationships: Vec<RelationshipDetail<'a>>,
}

impl<'a> CharacterDetails<'a> {
    pub fn from_visible(hierarchy: &Hierarchy, visible: &VisibleSet<'a>, id: &CharacterId) -> Option<Self> {
        let character = visible.character(id)?;
        let first_appearance = match hierarchy.resolve(&character.first_appearance) {
            Some(position) => hierarchy.display_path(position.node),
            None => character.first_appearance.to_string(),
        };
        let factions = visible
            .active_factions(id)
            .iter()
            .filter_map(|f| visible.faction(f))
            .collect();
        let relationships = visible
            .relationships
            .iter()
            .filter_map(|r| {
                let other = r.relationship.other(&character.id)?;
                let other_name = visible.character(other).map_or(other.as_str(), |c| c.name.as_str());
                Some(RelationshipDetail {
                    other,
                    other_name,
                    annotations: r.annotations.clone(),
                    default_description: r.relationship.default_description.as_deref(),
                })
            })
            .collect();
        Some(Self {
            character,
            first_appearance,
            factions,
            relationships,
        })
    }
}
