//! Hierarchy - the navigable book → part → chapter forest of a work.
//!
//! The builder turns a flat node list into an arena:
//! 1. **Levels**: take the supplied level, or derive it from the kind
//! 2. **Parents**: resolve each parent reference once to an arena index
//! 3. **Cycles**: cut any parent chain that loops back on itself
//! 4. **Order**: walk the forest depth-first to get reading order
//! 5. **Indices**: keep supplied global indices if consistent, else renumber
//!
//! After building, nothing refers to nodes by title any more.

mod path;

use book_model::{LocationId, NodeId, NodeKind, NodeRef, OrderedSet, ParentRef, StructuralNode, WorkDataset};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Index of a node in a [`Hierarchy`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeIdx(pub usize);

/// A resolved narrative position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub node: NodeIdx,
    pub global_index: u32,
}

/// A structural node after resolution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HierarchyNode {
    pub id: NodeId,
    pub title: String,
    pub kind: NodeKind,
    pub level: u8,
    pub global_index: u32,
    pub parent: Option<NodeIdx>,
    pub children: Vec<NodeIdx>,
    /// Ancestor titles, outermost first.
    pub path: Vec<String>,
    pub locations: OrderedSet<LocationId>,
}

/// Irregularities found while building. These are data, not failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum HierarchyIssue {
    /// Several nodes matched a parent key; the first in source order was used.
    AmbiguousParent { node: NodeId, key: String, candidates: usize },
    /// The parent reference matched nothing; the node became a root.
    UnresolvedParent { node: NodeId, parent: String },
    /// The parent chain looped back; the link at this node was cut.
    Cycle { node: NodeId },
    /// A later node reused an id; lookups by id find the first.
    DuplicateId { node: NodeId },
    /// Supplied global indices were incomplete or out of order and were replaced.
    Renumbered,
}

/// Rooted forest of structural nodes with a stable reading order.
#[derive(Debug, Clone, Default)]
pub struct Hierarchy {
    nodes: Vec<HierarchyNode>,
    roots: Vec<NodeIdx>,
    order: Vec<NodeIdx>,
    chapters: Vec<NodeIdx>,
    by_id: HashMap<NodeId, NodeIdx>,
    issues: Vec<HierarchyIssue>,
}

/// Builds a [`Hierarchy`] from a flat list of structural nodes.
pub struct HierarchyBuilder;

impl HierarchyBuilder {
    /// Build the forest. Total over any input; irregularities are recorded as issues.
    pub fn build(source: &[StructuralNode]) -> Hierarchy {
        let mut issues = Vec::new();

        let mut by_id: HashMap<NodeId, NodeIdx> = HashMap::with_capacity(source.len());
        let mut by_key: HashMap<(&str, NodeKind, u8), Vec<usize>> = HashMap::new();
        let mut by_title: HashMap<&str, Vec<usize>> = HashMap::new();
        for (i, node) in source.iter().enumerate() {
            if by_id.contains_key(&node.id) {
                tracing::warn!(node = %node.id, "duplicate structural node id");
                issues.push(HierarchyIssue::DuplicateId {
                    node: node.id.clone(),
                });
            } else {
                by_id.insert(node.id.clone(), NodeIdx(i));
            }
            by_key
                .entry((node.title.as_str(), node.kind, node.effective_level()))
                .or_default()
                .push(i);
            by_title.entry(node.title.as_str()).or_default().push(i);
        }

        // Parent links, resolved once.
        let mut parents: Vec<Option<usize>> = Vec::with_capacity(source.len());
        for (i, node) in source.iter().enumerate() {
            let resolved = match &node.parent {
                Some(ParentRef::Id(parent)) => match by_id.get(parent) {
                    Some(&NodeIdx(p)) => Some(p),
                    None => {
                        issues.push(HierarchyIssue::UnresolvedParent {
                            node: node.id.clone(),
                            parent: parent.to_string(),
                        });
                        None
                    }
                },
                Some(ParentRef::Snapshot { title, kind, level }) => {
                    let level = level.unwrap_or_else(|| kind.default_level());
                    let key = format!("{} ({}, level {})", title, kind, level);
                    let candidates = by_key
                        .get(&(title.as_str(), *kind, level))
                        .map(Vec::as_slice)
                        .unwrap_or(&[]);
                    pick_candidate(node, i, candidates, key, &mut issues)
                }
                None => match ancestor_title(node) {
                    Some(title) => {
                        let candidates = by_title.get(title).map(Vec::as_slice).unwrap_or(&[]);
                        pick_candidate(node, i, candidates, title.to_string(), &mut issues)
                    }
                    None => None,
                },
            };
            parents.push(resolved);
        }

        break_cycles(source, &mut parents, &mut issues);

        let mut children: Vec<Vec<NodeIdx>> = vec![Vec::new(); source.len()];
        let mut roots = Vec::new();
        for (i, parent) in parents.iter().enumerate() {
            match parent {
                Some(p) => children[*p].push(NodeIdx(i)),
                None => roots.push(NodeIdx(i)),
            }
        }

        // Depth-first pre-order: the order a reader meets the nodes.
        let mut order = Vec::with_capacity(source.len());
        let mut stack: Vec<NodeIdx> = roots.iter().rev().copied().collect();
        while let Some(idx) = stack.pop() {
            order.push(idx);
            stack.extend(children[idx.0].iter().rev().copied());
        }

        let supplied: Vec<Option<u32>> = order.iter().map(|idx| source[idx.0].global_index).collect();
        let keep_supplied = !supplied.is_empty()
            && supplied.iter().all(Option::is_some)
            && supplied.windows(2).all(|w| w[0] < w[1]);
        if !keep_supplied && supplied.iter().any(Option::is_some) {
            tracing::debug!("supplied global indices are incomplete or out of order, renumbering");
            issues.push(HierarchyIssue::Renumbered);
        }
        let mut global_indices = vec![0u32; source.len()];
        for (position, idx) in order.iter().enumerate() {
            global_indices[idx.0] = match supplied[position] {
                Some(index) if keep_supplied => index,
                _ => position as u32 + 1,
            };
        }

        let mut nodes: Vec<HierarchyNode> = source
            .iter()
            .enumerate()
            .map(|(i, node)| HierarchyNode {
                id: node.id.clone(),
                title: node.title.clone(),
                kind: node.kind,
                level: node.effective_level(),
                global_index: global_indices[i],
                parent: parents[i].map(NodeIdx),
                children: std::mem::take(&mut children[i]),
                path: Vec::new(),
                locations: node.locations.clone(),
            })
            .collect();

        // Parents precede children in reading order, so their paths are ready.
        for idx in &order {
            if let Some(parent) = nodes[idx.0].parent {
                let mut path = nodes[parent.0].path.clone();
                path.push(nodes[parent.0].title.clone());
                nodes[idx.0].path = path;
            }
        }

        let chapters = order
            .iter()
            .copied()
            .filter(|idx| nodes[idx.0].kind == NodeKind::Chapter)
            .collect();

        tracing::debug!(
            nodes = nodes.len(),
            roots = roots.len(),
            issues = issues.len(),
            "built hierarchy"
        );

        Hierarchy {
            nodes,
            roots,
            order,
            chapters,
            by_id,
            issues,
        }
    }
}

/// The nearest ancestor title from a node's path, ignoring a trailing self entry.
fn ancestor_title(node: &StructuralNode) -> Option<&str> {
    let mut path = node.path.as_slice();
    if path.last().is_some_and(|last| *last == node.title) {
        path = &path[..path.len() - 1];
    }
    path.last().map(String::as_str)
}

fn pick_candidate(
    node: &StructuralNode,
    own: usize,
    candidates: &[usize],
    key: String,
    issues: &mut Vec<HierarchyIssue>,
) -> Option<usize> {
    let mut others = candidates.iter().copied().filter(|&c| c != own);
    let first = others.next();
    let remaining = others.count();
    match first {
        None => {
            issues.push(HierarchyIssue::UnresolvedParent {
                node: node.id.clone(),
                parent: key,
            });
            None
        }
        Some(first) => {
            if remaining > 0 {
                // First match in source order wins.
                tracing::warn!(node = %node.id, parent = %key, "ambiguous parent key, using first match");
                issues.push(HierarchyIssue::AmbiguousParent {
                    node: node.id.clone(),
                    key,
                    candidates: remaining + 1,
                });
            }
            Some(first)
        }
    }
}

/// Cut parent links that close a loop, visiting nodes in source order.
fn break_cycles(source: &[StructuralNode], parents: &mut [Option<usize>], issues: &mut Vec<HierarchyIssue>) {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Unvisited,
        OnChain,
        Done,
    }

    let mut marks = vec![Mark::Unvisited; parents.len()];
    let mut chain: Vec<usize> = Vec::new();
    for start in 0..parents.len() {
        let mut current = start;
        loop {
            match marks[current] {
                Mark::Done => break,
                Mark::OnChain => {
                    if let Some(&child) = chain.last() {
                        tracing::warn!(node = %source[child].id, "parent cycle, detaching node");
                        parents[child] = None;
                        issues.push(HierarchyIssue::Cycle {
                            node: source[child].id.clone(),
                        });
                    }
                    break;
                }
                Mark::Unvisited => {
                    marks[current] = Mark::OnChain;
                    chain.push(current);
                    match parents[current] {
                        Some(parent) => current = parent,
                        None => break,
                    }
                }
            }
        }
        for visited in chain.drain(..) {
            marks[visited] = Mark::Done;
        }
    }
}

impl Hierarchy {
    pub fn from_dataset(dataset: &WorkDataset) -> Self {
        HierarchyBuilder::build(dataset.structure())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, idx: NodeIdx) -> Option<&HierarchyNode> {
        self.nodes.get(idx.0)
    }

    /// Node by index. Indices handed out by this hierarchy are always valid.
    pub fn node(&self, idx: NodeIdx) -> &HierarchyNode {
        &self.nodes[idx.0]
    }

    pub fn find(&self, id: &NodeId) -> Option<NodeIdx> {
        self.by_id.get(id).copied()
    }

    /// Top-level nodes in source order.
    pub fn roots(&self) -> &[NodeIdx] {
        &self.roots
    }

    /// Top level for navigation. A lone root with children is skipped so a
    /// single-book work does not ask the reader to pick the book first.
    pub fn navigation_roots(&self) -> &[NodeIdx] {
        match self.roots.as_slice() {
            [only] if !self.nodes[only.0].children.is_empty() => &self.nodes[only.0].children,
            roots => roots,
        }
    }

    pub fn children(&self, idx: NodeIdx) -> &[NodeIdx] {
        self.get(idx).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Ancestors of `idx`, outermost first.
    pub fn ancestors(&self, idx: NodeIdx) -> Vec<NodeIdx> {
        let mut ancestors = Vec::new();
        let mut current = self.get(idx).and_then(|n| n.parent);
        while let Some(parent) = current {
            ancestors.push(parent);
            current = self.nodes[parent.0].parent;
        }
        ancestors.reverse();
        ancestors
    }

    /// All nodes in depth-first reading order.
    pub fn reading_order(&self) -> &[NodeIdx] {
        &self.order
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeIdx, &HierarchyNode)> + '_ {
        self.order.iter().map(move |&idx| (idx, &self.nodes[idx.0]))
    }

    /// Chapter nodes in reading order.
    pub fn chapters(&self) -> &[NodeIdx] {
        &self.chapters
    }

    pub fn first(&self) -> Option<Position> {
        self.order.first().map(|&idx| self.position(idx))
    }

    pub fn last(&self) -> Option<Position> {
        self.order.last().map(|&idx| self.position(idx))
    }

    pub fn issues(&self) -> &[HierarchyIssue] {
        &self.issues
    }

    pub fn position(&self, idx: NodeIdx) -> Position {
        Position {
            node: idx,
            global_index: self.nodes[idx.0].global_index,
        }
    }

    pub fn global_index_of(&self, reference: &NodeRef) -> Option<u32> {
        self.resolve(reference).map(|p| p.global_index)
    }

    /// Resolve a reference exactly. Anything that does not name an existing node is `None`.
    pub fn resolve(&self, reference: &NodeRef) -> Option<Position> {
        let idx = match reference {
            NodeRef::Id(id) => self.find(id)?,
            NodeRef::Index(index) => {
                let slot = self.order_slot(*index)?;
                let idx = self.order[slot];
                if self.nodes[idx.0].global_index != *index {
                    return None;
                }
                idx
            }
            NodeRef::Chapter { chapter } => {
                let n = usize::try_from(*chapter).ok()?.checked_sub(1)?;
                *self.chapters.get(n)?
            }
        };
        Some(self.position(idx))
    }

    /// Resolve a selection, clamping anything out of range instead of failing.
    ///
    /// - an index past the end selects the last node, before the start the first,
    ///   and an index in a numbering gap the nearest node before it;
    /// - a chapter number is clamped to the first or last chapter;
    /// - an unknown id selects the first node.
    ///
    /// Only an empty hierarchy yields `None`.
    pub fn resolve_selection(&self, reference: &NodeRef) -> Option<Position> {
        let first = self.first()?;
        let resolved = match reference {
            NodeRef::Id(id) => self.find(id).map(|idx| self.position(idx)),
            NodeRef::Index(index) => self
                .order_slot(*index)
                .map(|slot| self.position(self.order[slot])),
            NodeRef::Chapter { chapter } => {
                if self.chapters.is_empty() {
                    None
                } else {
                    let n = (*chapter as usize).clamp(1, self.chapters.len());
                    Some(self.position(self.chapters[n - 1]))
                }
            }
        };
        if resolved.is_none() {
            tracing::debug!(selection = %reference, "selection out of range, clamping");
        }
        Some(resolved.unwrap_or_else(|| match reference {
            NodeRef::Chapter { chapter } if *chapter > 1 => self.last().unwrap_or(first),
            _ => first,
        }))
    }

    /// Slot in reading order of the last node whose global index is `<= index`.
    /// Indices below the first node clamp to slot 0; `None` only when empty.
    fn order_slot(&self, index: u32) -> Option<usize> {
        if self.order.is_empty() {
            return None;
        }
        let after = self
            .order
            .partition_point(|idx| self.nodes[idx.0].global_index <= index);
        Some(after.saturating_sub(1))
    }
}
