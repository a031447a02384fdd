//! Serialized form of a dataset and its normalization into model types.
//!
//! Accepts both the native field names and the names used by the existing
//! book data files (`character1`, `descriptions`, `faction_join_chapters`,
//! `hierarchy`, `map_url`, ...).

use serde::Deserialize;
use std::collections::HashMap;

use super::{Author, BookInfo, WorkDataset};
use crate::entities::{
    Character, CharacterId, Faction, FactionId, FactionMembership, Location, LocationId, Relationship, WorkId,
};
use crate::ordered_set::OrderedSet;
use crate::structure::{NodeId, NodeKind, NodeRef, ParentRef, StructuralNode};

#[derive(Debug, Deserialize)]
pub struct DatasetSource {
    pub book: BookInfo,
    #[serde(default, alias = "chapters")]
    pub structure: Vec<StructuralNode>,
    /// Flat reading-order outline; assigns kind/level and nests by level.
    #[serde(default, alias = "hierarchy")]
    pub outline: Vec<OutlineEntry>,
    #[serde(default)]
    pub characters: Vec<Character>,
    #[serde(default)]
    pub factions: Vec<Faction>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    #[serde(default)]
    pub locations: Vec<Location>,
    /// Top-level map image, used when the book carries none.
    #[serde(default, alias = "mapUrl")]
    pub map_url: Option<String>,
}

impl From<DatasetSource> for WorkDataset {
    fn from(source: DatasetSource) -> Self {
        let structure = apply_outline(source.structure, &source.outline);
        let mut book = source.book;
        if book.map_url.is_none() {
            book.map_url = source.map_url;
        }
        WorkDataset::new(
            book,
            structure,
            source.characters,
            source.factions,
            source.relationships,
        )
        .with_locations(source.locations)
    }
}

/// One line of a book → part → chapter outline.
#[derive(Debug, Clone, Deserialize)]
pub struct OutlineEntry {
    #[serde(alias = "chapter_id", alias = "chapterId")]
    pub node: NodeId,
    #[serde(default, alias = "type")]
    pub kind: Option<NodeKind>,
    #[serde(default)]
    pub level: Option<u8>,
}

#[derive(Debug, Deserialize)]
pub struct BookSource {
    #[serde(default)]
    pub id: Option<WorkId>,
    pub title: String,
    #[serde(default)]
    pub author: Author,
    #[serde(default, alias = "mapUrl")]
    pub map_url: Option<String>,
}

impl From<BookSource> for BookInfo {
    fn from(source: BookSource) -> Self {
        let id = source.id.unwrap_or_else(|| WorkId::new(slug(&source.title)));
        BookInfo {
            id,
            title: source.title,
            author: source.author,
            map_url: source.map_url,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct NodeSource {
    #[serde(default)]
    pub id: Option<NodeId>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, alias = "type")]
    pub kind: NodeKind,
    #[serde(default)]
    pub level: Option<u8>,
    #[serde(default, alias = "globalIndex")]
    pub global_index: Option<u32>,
    #[serde(default)]
    pub parent: Option<ParentRef>,
    #[serde(default)]
    pub path: Vec<String>,
    #[serde(default)]
    pub locations: OrderedSet<LocationId>,
}

impl From<NodeSource> for StructuralNode {
    fn from(source: NodeSource) -> Self {
        // Either field may stand in for the other; titles are unique within a work.
        let title = source
            .title
            .or_else(|| source.id.as_ref().map(|id| id.0.clone()))
            .unwrap_or_default();
        let id = source.id.unwrap_or_else(|| NodeId::new(title.clone()));
        StructuralNode {
            id,
            title,
            kind: source.kind,
            level: source.level,
            global_index: source.global_index,
            parent: source.parent,
            path: source.path,
            locations: source.locations,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum MembershipSource {
    Bare(FactionId),
    Detailed(FactionMembership),
}

#[derive(Debug, Deserialize)]
pub struct CharacterSource {
    pub id: CharacterId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(
        alias = "first_appearance_chapter",
        alias = "firstAppearanceChapter",
        alias = "firstAppearance"
    )]
    pub first_appearance: NodeRef,
    #[serde(default)]
    pub aliases: OrderedSet<String>,
    #[serde(default)]
    pub attributes: OrderedSet<String>,
    #[serde(default)]
    pub factions: Vec<MembershipSource>,
    #[serde(default, alias = "factionJoinChapters")]
    pub faction_join_chapters: HashMap<FactionId, NodeRef>,
}

impl From<CharacterSource> for Character {
    fn from(mut source: CharacterSource) -> Self {
        let mut character = Character {
            id: source.id,
            name: source.name,
            description: source.description,
            first_appearance: source.first_appearance,
            aliases: source.aliases,
            attributes: source.attributes,
            factions: Vec::with_capacity(source.factions.len()),
        };
        for membership in source.factions {
            let mut membership = match membership {
                MembershipSource::Bare(faction) => FactionMembership::new(faction),
                MembershipSource::Detailed(membership) => membership,
            };
            if membership.since.is_none() {
                membership.since = source.faction_join_chapters.remove(&membership.faction);
            }
            character.add_membership(membership);
        }
        character
    }
}

/// Reorder `nodes` to follow `outline` and infer parents from outline levels.
///
/// An outlined node without an explicit parent or path is nested under the
/// nearest preceding outlined node with a strictly smaller level. Nodes not
/// named by the outline keep their relative order after the outlined ones.
pub fn apply_outline(mut nodes: Vec<StructuralNode>, outline: &[OutlineEntry]) -> Vec<StructuralNode> {
    if outline.is_empty() {
        return nodes;
    }

    let mut position: HashMap<NodeId, usize> = HashMap::new();
    for (i, node) in nodes.iter().enumerate() {
        position.entry(node.id.clone()).or_insert(i);
    }

    let mut taken = vec![false; nodes.len()];
    let mut order = Vec::with_capacity(outline.len());
    let mut open: Vec<(u8, NodeId)> = Vec::new();

    for entry in outline {
        let Some(&i) = position.get(&entry.node) else {
            tracing::warn!(node = %entry.node, "outline names an unknown node, skipping");
            continue;
        };
        if taken[i] {
            tracing::warn!(node = %entry.node, "node listed twice in outline, keeping first");
            continue;
        }
        taken[i] = true;

        let node = &mut nodes[i];
        if let Some(kind) = entry.kind {
            node.kind = kind;
        }
        if entry.level.is_some() {
            node.level = entry.level;
        }

        let level = node.effective_level();
        while open.last().is_some_and(|(open_level, _)| *open_level >= level) {
            open.pop();
        }
        if node.parent.is_none() && node.path.is_empty() {
            if let Some((_, parent)) = open.last() {
                node.parent = Some(ParentRef::Id(parent.clone()));
            }
        }
        open.push((level, node.id.clone()));
        order.push(i);
    }

    let mut slots: Vec<Option<StructuralNode>> = nodes.into_iter().map(Some).collect();
    let mut ordered = Vec::with_capacity(slots.len());
    for i in order {
        if let Some(node) = slots[i].take() {
            ordered.push(node);
        }
    }
    ordered.extend(slots.into_iter().flatten());
    ordered
}

fn slug(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;
    for c in title.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        slug.push_str("untitled");
    }
    slug
}
