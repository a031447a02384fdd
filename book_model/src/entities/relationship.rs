//! Relationships between pairs of characters.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::CharacterId;
use crate::structure::NodeRef;

/// Namespace for deriving relationship ids from character pairs.
const RELATIONSHIP_NAMESPACE: Uuid = Uuid::from_u128(0x6b1f_52c4_8d2e_4f0a_9a37_c1d5_e8b2_7f40);

/// Deterministic identity of an unordered character pair.
///
/// `RelationshipId::for_pair(a, b) == RelationshipId::for_pair(b, a)`, so a
/// renderer can upsert edges across rebuilds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RelationshipId(pub Uuid);

impl RelationshipId {
    pub fn for_pair(a: &CharacterId, b: &CharacterId) -> Self {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        // Unit separator keeps ("ab", "c") distinct from ("a", "bc").
        let key = format!("{}\u{1f}{}", lo.as_str(), hi.as_str());
        Self(Uuid::new_v5(&RELATIONSHIP_NAMESPACE, key.as_bytes()))
    }
}

impl std::fmt::Display for RelationshipId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rel-{}", self.0)
    }
}

/// How a relationship is characterized at some point in the narrative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    /// Structural node the annotation applies from.
    #[serde(default, alias = "chapter", skip_serializing_if = "Option::is_none")]
    pub node: Option<NodeRef>,
    #[serde(alias = "description")]
    pub text: String,
}

impl Annotation {
    pub fn new(node: NodeRef, text: impl Into<String>) -> Self {
        Self {
            node: Some(node),
            text: text.into(),
        }
    }

    /// An annotation not tied to any structural node.
    pub fn undated(text: impl Into<String>) -> Self {
        Self {
            node: None,
            text: text.into(),
        }
    }
}

/// A symmetric relationship between two distinct characters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    #[serde(alias = "character1")]
    pub a: CharacterId,
    #[serde(alias = "character2")]
    pub b: CharacterId,
    /// Annotations in source order.
    #[serde(default, alias = "descriptions")]
    pub annotations: Vec<Annotation>,
    /// Text shown when no annotation applies.
    #[serde(
        default,
        alias = "defaultDescription",
        skip_serializing_if = "Option::is_none"
    )]
    pub default_description: Option<String>,
}

impl Relationship {
    pub fn new(a: impl Into<CharacterId>, b: impl Into<CharacterId>) -> Self {
        Self {
            a: a.into(),
            b: b.into(),
            annotations: Vec::new(),
            default_description: None,
        }
    }

    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn with_default_description(mut self, text: impl Into<String>) -> Self {
        self.default_description = Some(text.into());
        self
    }

    pub fn id(&self) -> RelationshipId {
        RelationshipId::for_pair(&self.a, &self.b)
    }

    /// Both endpoints in canonical (sorted) order.
    pub fn pair(&self) -> (&CharacterId, &CharacterId) {
        if self.a <= self.b {
            (&self.a, &self.b)
        } else {
            (&self.b, &self.a)
        }
    }

    pub fn involves(&self, character: &CharacterId) -> bool {
        &self.a == character || &self.b == character
    }

    /// The endpoint opposite `character`, if `character` is an endpoint.
    pub fn other(&self, character: &CharacterId) -> Option<&CharacterId> {
        if &self.a == character {
            Some(&self.b)
        } else if &self.b == character {
            Some(&self.a)
        } else {
            None
        }
    }

    pub fn is_self_loop(&self) -> bool {
        self.a == self.b
    }
}
