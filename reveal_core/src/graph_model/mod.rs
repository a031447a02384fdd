//! Graph model - the renderer-facing description of a visible set.
//!
//! Nodes carry display attributes and a position. Positions recorded by a
//! previous layout are reused as-is so the picture stays stable while the
//! reader moves; only newly revealed characters get a fresh placement.

mod placement;

pub use placement::Placement;

use crate::visibility::VisibleSet;
use book_model::{CharacterId, RelationshipId};
use placement::Clusters;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Positions keyed by character, as recorded from a previous layout.
pub type PositionMap = HashMap<CharacterId, Point>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphNode {
    pub id: CharacterId,
    pub label: String,
    /// Primary colour: the first joined faction's, or the fallback.
    pub color: String,
    /// Colours of every joined faction, in listing order.
    pub colors: Vec<String>,
    pub group: String,
    pub description: String,
    pub position: Point,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphEdge {
    pub id: RelationshipId,
    pub source: CharacterId,
    pub target: CharacterId,
    pub label: String,
    /// Number of visible annotations.
    pub annotations: usize,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct GraphDescription {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl GraphDescription {
    pub fn node(&self, id: &CharacterId) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    pub fn edge(&self, id: &RelationshipId) -> Option<&GraphEdge> {
        self.edges.iter().find(|e| &e.id == id)
    }

    /// Current node positions, suitable for feeding into the next build.
    pub fn positions(&self) -> PositionMap {
        self.nodes.iter().map(|n| (n.id.clone(), n.position)).collect()
    }
}

/// Display and placement settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Colour for characters with no joined faction.
    pub fallback_color: String,
    /// Edge label when a relationship has nothing better to show.
    pub default_edge_label: String,
    pub placement: Placement,
    /// Side of the square scattered nodes land in.
    pub scatter_extent: f64,
    /// Horizontal distance between faction clusters.
    pub cluster_spacing: f64,
    /// Vertical distance between members of a cluster.
    pub member_spacing: f64,
    /// Random offset applied around a cluster slot.
    pub jitter: f64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            fallback_color: "#cccccc".to_string(),
            default_edge_label: "Related".to_string(),
            placement: Placement::Scatter,
            scatter_extent: 400.0,
            cluster_spacing: 200.0,
            member_spacing: 80.0,
            jitter: 50.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GraphModelBuilder {
    config: GraphConfig,
}

impl GraphModelBuilder {
    pub fn new(config: GraphConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(GraphConfig::default())
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Same as [`build`](Self::build) with a fresh RNG from `seed`.
    pub fn build_seeded(&self, visible: &VisibleSet<'_>, previous: Option<&PositionMap>, seed: u64) -> GraphDescription {
        self.build(visible, previous, &mut StdRng::seed_from_u64(seed))
    }

    /// Describe the visible set as nodes and edges.
    ///
    /// Node and edge order follow the visible set. The RNG is consumed only for
    /// characters missing from `previous`, so seeded builds are reproducible.
    pub fn build<R: Rng + ?Sized>(
        &self,
        visible: &VisibleSet<'_>,
        previous: Option<&PositionMap>,
        rng: &mut R,
    ) -> GraphDescription {
        let primary: Vec<_> = visible
            .characters
            .iter()
            .map(|c| {
                let faction = visible
                    .active_factions(&c.id)
                    .first()
                    .copied()
                    .or_else(|| c.faction_ids().find(|f| visible.faction(f).is_some()));
                (&c.id, faction)
            })
            .collect();

        let clusters = match self.config.placement {
            Placement::ClusterByFaction => Some(Clusters::new(
                primary.iter().copied(),
                self.config.cluster_spacing,
                self.config.member_spacing,
            )),
            Placement::Scatter => None,
        };

        let mut reused = 0usize;
        let nodes: Vec<GraphNode> = visible
            .characters
            .iter()
            .zip(&primary)
            .map(|(character, (_, faction))| {
                let colors: Vec<String> = visible
                    .active_factions(&character.id)
                    .iter()
                    .filter_map(|f| visible.faction(f))
                    .map(|f| f.color.clone())
                    .collect();
                let color = colors
                    .first()
                    .cloned()
                    .unwrap_or_else(|| self.config.fallback_color.clone());
                let group = match faction {
                    Some(f) => format!("faction-{}", f),
                    None => "character".to_string(),
                };

                let position = match previous.and_then(|p| p.get(&character.id)) {
                    Some(point) => {
                        reused += 1;
                        *point
                    }
                    None => clusters
                        .as_ref()
                        .and_then(|c| c.place(&character.id, self.config.jitter, &mut *rng))
                        .unwrap_or_else(|| placement::scatter(&mut *rng, self.config.scatter_extent)),
                };

                GraphNode {
                    id: character.id.clone(),
                    label: character.name.clone(),
                    color,
                    colors,
                    group,
                    description: character.description.clone(),
                    position,
                }
            })
            .collect();

        let edges: Vec<GraphEdge> = visible
            .relationships
            .iter()
            .map(|r| {
                let (source, target) = r.relationship.pair();
                let label = r
                    .headline()
                    .or(r.relationship.default_description.as_deref())
                    .unwrap_or(&self.config.default_edge_label)
                    .to_string();
                GraphEdge {
                    id: r.id(),
                    source: source.clone(),
                    target: target.clone(),
                    label,
                    annotations: r.annotations.len(),
                }
            })
            .collect();

        tracing::debug!(
            nodes = nodes.len(),
            edges = edges.len(),
            reused,
            "built graph description"
        );

        GraphDescription { nodes, edges }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::Hierarchy;
    use crate::visibility::VisibilityFilter;
    use book_model::{Annotation, Author, BookInfo, Character, Faction, NodeRef, Relationship, StructuralNode, WorkDataset};

    fn dataset() -> WorkDataset {
        WorkDataset::new(
            BookInfo::new("lotr", "The Lord of the Rings", Author::default()),
            (1..=3)
                .map(|i| StructuralNode::chapter(format!("ch{}", i), format!("Chapter {}", i)))
                .collect(),
            vec![
                Character::new("frodo", "Frodo Baggins", NodeRef::index(1))
                    .with_description("Ring-bearer")
                    .with_faction("hobbits"),
                Character::new("sam", "Samwise Gamgee", NodeRef::index(1)).with_faction("hobbits"),
                Character::new("gollum", "Gollum", NodeRef::index(3)).with_faction("unknown"),
            ],
            vec![Faction::new("hobbits", "Hobbits", "#4caf50")],
            vec![
                Relationship::new("sam", "frodo").with_annotation(Annotation::undated("Loyal friends")),
                Relationship::new("frodo", "gollum").with_default_description("Guide"),
                Relationship::new("sam", "gollum"),
            ],
        )
    }

    fn build_at(index: u32, previous: Option<&PositionMap>, seed: u64) -> GraphDescription {
        let dataset = dataset();
        let hierarchy = Hierarchy::from_dataset(&dataset);
        let visible = VisibilityFilter::default().filter(&dataset, &hierarchy, &NodeRef::index(index));
        GraphModelBuilder::default().build_seeded(&visible, previous, seed)
    }

    #[test]
    fn test_node_attributes() {
        let graph = build_at(3, None, 1);
        let frodo = graph.node(&"frodo".into()).unwrap();
        assert_eq!(frodo.label, "Frodo Baggins");
        assert_eq!(frodo.color, "#4caf50");
        assert_eq!(frodo.colors, ["#4caf50"]);
        assert_eq!(frodo.group, "faction-hobbits");
        assert_eq!(frodo.description, "Ring-bearer");

        // Faction absent from the dataset: no colour, no group.
        let gollum = graph.node(&"gollum".into()).unwrap();
        assert_eq!(gollum.color, "#cccccc");
        assert_eq!(gollum.group, "character");
    }

    #[test]
    fn test_edge_labels() {
        let graph = build_at(3, None, 1);
        let labels: Vec<&str> = graph.edges.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, ["Loyal friends", "Guide", "Related"]);
        assert_eq!(graph.edges[0].source.as_str(), "frodo");
        assert_eq!(graph.edges[0].target.as_str(), "sam");
    }

    #[test]
    fn test_previous_positions_reused() {
        let early = build_at(1, None, 1);
        let previous = early.positions();
        let late = build_at(3, Some(&previous), 99);
        for node in &early.nodes {
            assert_eq!(late.node(&node.id).unwrap().position, node.position);
        }
        assert_eq!(late.nodes.len(), 3);
    }

    #[test]
    fn test_seeded_build_is_reproducible() {
        assert_eq!(build_at(3, None, 5), build_at(3, None, 5));
    }

    #[test]
    fn test_cluster_placement() {
        let dataset = dataset();
        let hierarchy = Hierarchy::from_dataset(&dataset);
        let visible = VisibilityFilter::default().filter(&dataset, &hierarchy, &NodeRef::index(3));
        let builder = GraphModelBuilder::new(GraphConfig {
            placement: Placement::ClusterByFaction,
            jitter: 0.0,
            ..GraphConfig::default()
        });
        let graph = builder.build_seeded(&visible, None, 3);
        let frodo = graph.node(&"frodo".into()).unwrap().position;
        let sam = graph.node(&"sam".into()).unwrap().position;
        assert_eq!(frodo.x, sam.x);
        assert_eq!((sam.y - frodo.y).abs(), 80.0);
    }
}
