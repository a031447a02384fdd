//! Character definitions.

use serde::{Deserialize, Serialize};

use super::{CharacterId, FactionId};
use crate::ordered_set::OrderedSet;
use crate::structure::NodeRef;

/// Membership of a character in a faction, optionally starting partway through the work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactionMembership {
    pub faction: FactionId,
    /// Structural node at which the membership begins. `None` means from the start.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since: Option<NodeRef>,
}

impl FactionMembership {
    pub fn new(faction: impl Into<FactionId>) -> Self {
        Self {
            faction: faction.into(),
            since: None,
        }
    }

    pub fn since(mut self, node: NodeRef) -> Self {
        self.since = Some(node);
        self
    }
}

/// A character of the work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "crate::dataset::CharacterSource")]
pub struct Character {
    pub id: CharacterId,
    pub name: String,
    pub description: String,
    /// Where the reader first meets this character.
    pub first_appearance: NodeRef,
    pub aliases: OrderedSet<String>,
    pub attributes: OrderedSet<String>,
    /// Memberships in listing order, unique by faction id.
    pub factions: Vec<FactionMembership>,
}

impl Character {
    /// Create a character first appearing at the given node.
    pub fn new(id: impl Into<CharacterId>, name: impl Into<String>, first_appearance: NodeRef) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            first_appearance,
            aliases: OrderedSet::new(),
            attributes: OrderedSet::new(),
            factions: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.insert(alias.into());
        self
    }

    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attributes.insert(attribute.into());
        self
    }

    /// Add a membership. A second membership in the same faction is ignored.
    pub fn with_membership(mut self, membership: FactionMembership) -> Self {
        self.add_membership(membership);
        self
    }

    pub fn with_faction(self, faction: impl Into<FactionId>) -> Self {
        self.with_membership(FactionMembership::new(faction))
    }

    pub(crate) fn add_membership(&mut self, membership: FactionMembership) -> bool {
        if self.belongs_to(&membership.faction) {
            false
        } else {
            self.factions.push(membership);
            true
        }
    }

    /// Whether the character lists the faction at all, regardless of when it joined.
    pub fn belongs_to(&self, faction: &FactionId) -> bool {
        self.factions.iter().any(|m| &m.faction == faction)
    }

    pub fn faction_ids(&self) -> impl Iterator<Item = &FactionId> {
        self.factions.iter().map(|m| &m.faction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_character() {
        let character = Character::new("alice", "Alice", NodeRef::index(1));
        assert_eq!(character.name, "Alice");
        assert!(character.factions.is_empty());
        assert!(character.aliases.is_empty());
    }

    #[test]
    fn test_duplicate_membership_ignored() {
        let character = Character::new("paul", "Paul", NodeRef::id("chapter-1"))
            .with_faction("atreides")
            .with_membership(FactionMembership::new("atreides").since(NodeRef::id("chapter-9")))
            .with_faction("fremen");

        assert_eq!(character.factions.len(), 2);
        assert!(character.factions[0].since.is_none());
        assert!(character.belongs_to(&FactionId::from("fremen")));
    }
}
