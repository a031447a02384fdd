//! Structural units of a work: books, parts and chapters.
//!
//! Nodes arrive as a flat list. Parent links are either a direct id or an
//! embedded partial copy of the parent (`ParentRef::Snapshot`); resolving
//! them into a tree is the job of the hierarchy builder in `reveal_core`.

use serde::{Deserialize, Serialize};

use crate::entities::{string_id, LocationId};
use crate::ordered_set::OrderedSet;

string_id!(
    /// Identifier of a structural node, unique within a work.
    NodeId
);

/// The kind of a structural unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Book,
    Part,
    #[default]
    Chapter,
}

impl NodeKind {
    /// Nesting depth implied by the kind when no level is supplied.
    pub fn default_level(self) -> u8 {
        match self {
            NodeKind::Book => 0,
            NodeKind::Part => 1,
            NodeKind::Chapter => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Book => "book",
            NodeKind::Part => "part",
            NodeKind::Chapter => "chapter",
        }
    }

    /// Books and parts group other nodes; chapters are read.
    pub fn is_container(self) -> bool {
        !matches!(self, NodeKind::Chapter)
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reference to a structural node from a character, annotation or selection.
///
/// In source data an integer is a global index, a string is a node id and
/// `{ "chapter": n }` is the n-th chapter in reading order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeRef {
    /// Global index in depth-first reading order.
    Index(u32),
    /// 1-based position among chapters in reading order.
    Chapter { chapter: u32 },
    Id(NodeId),
}

impl NodeRef {
    pub fn id(id: impl Into<NodeId>) -> Self {
        NodeRef::Id(id.into())
    }

    pub fn index(index: u32) -> Self {
        NodeRef::Index(index)
    }

    pub fn chapter(chapter: u32) -> Self {
        NodeRef::Chapter { chapter }
    }
}

impl std::fmt::Display for NodeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeRef::Index(index) => write!(f, "#{}", index),
            NodeRef::Chapter { chapter } => write!(f, "chapter:{}", chapter),
            NodeRef::Id(id) => write!(f, "{}", id),
        }
    }
}

/// How a node points at its parent in source data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParentRef {
    /// Direct link by node id.
    Id(NodeId),
    /// Embedded partial copy of the parent, matched on `(title, kind, level)`.
    Snapshot {
        title: String,
        #[serde(default, alias = "type")]
        kind: NodeKind,
        #[serde(default)]
        level: Option<u8>,
    },
}

impl ParentRef {
    pub fn snapshot(title: impl Into<String>, kind: NodeKind) -> Self {
        ParentRef::Snapshot {
            title: title.into(),
            kind,
            level: None,
        }
    }
}

/// A book, part or chapter as supplied by the content source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "crate::dataset::NodeSource")]
pub struct StructuralNode {
    pub id: NodeId,
    pub title: String,
    pub kind: NodeKind,
    /// Explicit nesting depth. When absent the kind decides.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_index: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<ParentRef>,
    /// Ancestor titles, outermost first.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<String>,
    /// Locations the node is set in.
    #[serde(skip_serializing_if = "OrderedSet::is_empty")]
    pub locations: OrderedSet<LocationId>,
}

impl StructuralNode {
    pub fn new(id: impl Into<NodeId>, title: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            kind,
            level: None,
            global_index: None,
            parent: None,
            path: Vec::new(),
            locations: OrderedSet::new(),
        }
    }

    pub fn chapter(id: impl Into<NodeId>, title: impl Into<String>) -> Self {
        Self::new(id, title, NodeKind::Chapter)
    }

    pub fn part(id: impl Into<NodeId>, title: impl Into<String>) -> Self {
        Self::new(id, title, NodeKind::Part)
    }

    pub fn book(id: impl Into<NodeId>, title: impl Into<String>) -> Self {
        Self::new(id, title, NodeKind::Book)
    }

    pub fn with_parent(mut self, parent: ParentRef) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_parent_id(self, parent: impl Into<NodeId>) -> Self {
        self.with_parent(ParentRef::Id(parent.into()))
    }

    pub fn with_level(mut self, level: u8) -> Self {
        self.level = Some(level);
        self
    }

    pub fn with_global_index(mut self, index: u32) -> Self {
        self.global_index = Some(index);
        self
    }

    pub fn with_path<I, S>(mut self, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.path = path.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_location(mut self, location: impl Into<LocationId>) -> Self {
        self.locations.insert(location.into());
        self
    }

    /// Supplied level, or the one implied by the kind.
    pub fn effective_level(&self) -> u8 {
        self.level.unwrap_or_else(|| self.kind.default_level())
    }
}
