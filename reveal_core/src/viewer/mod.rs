//! Viewer - the glue a shell uses to drive the reveal pipeline.
//!
//! The shell owns a [`ViewerState`] and hands it in on every call; nothing
//! in here keeps state between calls. A recomputation runs the whole
//! pipeline on one immutable [`PreparedWork`] snapshot:
//! hierarchy → visibility → graph description.

mod details;
mod navigation;

pub use details::*;
pub use navigation::*;

use crate::config::RevealConfig;
use crate::error::{Result, RevealError};
use crate::graph_model::{GraphDescription, GraphModelBuilder, PositionMap};
use crate::hierarchy::{Hierarchy, NodeIdx, Position};
use crate::visibility::{VisibilityFilter, VisibleSet};
use book_model::{CharacterId, Location, NodeId, NodeKind, NodeRef, WorkDataset, WorkId};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// A dataset together with its hierarchy, built once.
#[derive(Debug, Clone)]
pub struct PreparedWork {
    dataset: WorkDataset,
    hierarchy: Hierarchy,
}

impl PreparedWork {
    pub fn new(dataset: WorkDataset) -> Self {
        let hierarchy = Hierarchy::from_dataset(&dataset);
        Self { dataset, hierarchy }
    }

    pub fn id(&self) -> &WorkId {
        self.dataset.id()
    }

    pub fn dataset(&self) -> &WorkDataset {
        &self.dataset
    }

    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }
}

/// Selectable works, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct WorkLibrary {
    works: Vec<PreparedWork>,
    index: HashMap<WorkId, usize>,
}

impl WorkLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_datasets(datasets: impl IntoIterator<Item = WorkDataset>) -> Self {
        let mut library = Self::new();
        for dataset in datasets {
            library.insert(dataset);
        }
        library
    }

    /// Add a work. A dataset with a known id replaces the old one in place,
    /// which is returned.
    pub fn insert(&mut self, dataset: WorkDataset) -> Option<PreparedWork> {
        let work = PreparedWork::new(dataset);
        match self.index.get(work.id()) {
            Some(&slot) => {
                tracing::info!(work = %work.id(), "replacing work");
                Some(std::mem::replace(&mut self.works[slot], work))
            }
            None => {
                self.index.insert(work.id().clone(), self.works.len());
                self.works.push(work);
                None
            }
        }
    }

    pub fn get(&self, id: &WorkId) -> Option<&PreparedWork> {
        self.index.get(id).map(|&slot| &self.works[slot])
    }

    pub fn first(&self) -> Option<&PreparedWork> {
        self.works.first()
    }

    pub fn ids(&self) -> impl Iterator<Item = &WorkId> {
        self.works.iter().map(PreparedWork::id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PreparedWork> {
        self.works.iter()
    }

    pub fn len(&self) -> usize {
        self.works.len()
    }

    pub fn is_empty(&self) -> bool {
        self.works.is_empty()
    }
}

/// Every book and part node plus the ancestors of the selected node.
pub fn default_expansion(hierarchy: &Hierarchy, selected: Option<NodeIdx>) -> BTreeSet<NodeId> {
    let mut expanded: BTreeSet<NodeId> = hierarchy
        .iter()
        .filter(|(_, n)| matches!(n.kind, NodeKind::Book | NodeKind::Part))
        .map(|(_, n)| n.id.clone())
        .collect();
    if let Some(selected) = selected {
        expanded.extend(hierarchy.ancestors(selected).into_iter().map(|a| hierarchy.node(a).id.clone()));
    }
    expanded
}

/// Shell-owned viewer state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerState {
    pub work: WorkId,
    pub selection: NodeRef,
    pub expanded: BTreeSet<NodeId>,
    /// Positions last reported by the renderer.
    pub layout: PositionMap,
    /// Whether the renderer has received its initial data.
    pub mounted: bool,
}

impl ViewerState {
    /// Fresh state positioned at the first node of `work`.
    pub fn open(work: &PreparedWork) -> Self {
        let hierarchy = work.hierarchy();
        let first = hierarchy.first();
        // Ids may repeat; the global index always names the first node.
        let selection = NodeRef::Index(first.map_or(1, |p| p.global_index));
        Self {
            work: work.id().clone(),
            selection,
            expanded: default_expansion(hierarchy, first.map(|p| p.node)),
            layout: PositionMap::new(),
            mounted: false,
        }
    }

    /// Switch to another work, discarding everything tied to the old one.
    pub fn switch_work(&mut self, library: &WorkLibrary, id: &WorkId) -> Result<()> {
        let work = library.get(id).ok_or_else(|| RevealError::UnknownWork(id.clone()))?;
        tracing::info!(from = %self.work, to = %id, "switching work");
        *self = Self::open(work);
        Ok(())
    }

    /// Select a node and expand the path leading to it.
    pub fn select(&mut self, work: &PreparedWork, selection: NodeRef) {
        let hierarchy = work.hierarchy();
        if let Some(position) = hierarchy.resolve_selection(&selection) {
            for ancestor in hierarchy.ancestors(position.node) {
                self.expanded.insert(hierarchy.node(ancestor).id.clone());
            }
        }
        self.selection = selection;
    }

    /// Flip the expansion of one node. Returns whether it is now expanded.
    pub fn toggle_expanded(&mut self, id: &NodeId) -> bool {
        if self.expanded.remove(id) {
            false
        } else {
            self.expanded.insert(id.clone());
            true
        }
    }

    pub fn is_expanded(&self, id: &NodeId) -> bool {
        self.expanded.contains(id)
    }

    pub fn record_layout(&mut self, positions: PositionMap) {
        self.layout = positions;
    }

    pub fn mark_mounted(&mut self) {
        self.mounted = true;
    }
}

/// What the renderer should do with a new graph description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderCommand {
    /// First data for this work: set it and fit the view.
    Mount,
    /// Replace the data, keeping the camera where it is.
    SetData,
}

/// Result of one recomputation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    pub position: Option<Position>,
    pub graph: GraphDescription,
    pub command: RenderCommand,
    /// Where the selected node is set; unknown ids carry a placeholder name.
    pub locations: Vec<Location>,
}

/// Runs the pipeline with one configuration.
#[derive(Debug, Clone, Default)]
pub struct Viewer {
    filter: VisibilityFilter,
    graph: GraphModelBuilder,
}

impl Viewer {
    pub fn new(config: &RevealConfig) -> Self {
        Self {
            filter: VisibilityFilter::new(config.visibility.clone()),
            graph: GraphModelBuilder::new(config.graph.clone()),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(&RevealConfig::default())
    }

    pub fn visible<'a>(&self, work: &'a PreparedWork, state: &ViewerState) -> VisibleSet<'a> {
        self.filter.filter(work.dataset(), work.hierarchy(), &state.selection)
    }

    /// Recompute the graph for the state's selection.
    pub fn recompute<R: Rng + ?Sized>(&self, work: &PreparedWork, state: &ViewerState, rng: &mut R) -> Frame {
        let visible = self.visible(work, state);
        let previous = (!state.layout.is_empty()).then_some(&state.layout);
        let graph = self.graph.build(&visible, previous, rng);
        let command = if state.mounted {
            RenderCommand::SetData
        } else {
            RenderCommand::Mount
        };
        tracing::debug!(work = %work.id(), selection = %state.selection, ?command, "recomputed frame");
        Frame {
            position: visible.position,
            graph,
            command,
            locations: visible.locations.iter().map(|l| l.to_location()).collect(),
        }
    }

    /// Resolve a "node activated" event to what the details view shows.
    /// `None` when the character is not visible at the current selection.
    pub fn activate<'a>(&self, work: &'a PreparedWork, state: &ViewerState, id: &CharacterId) -> Option<CharacterDetails<'a>> {
        let visible = self.visible(work, state);
        CharacterDetails::from_visible(work.hierarchy(), &visible, id)
    }

    /// Rows of the navigation tree as the shell should draw them.
    pub fn navigation(&self, work: &PreparedWork, state: &ViewerState) -> Vec<NavigationEntry> {
        navigation_entries(work.hierarchy(), state)
    }
}
