use super::ViewerState;
use crate::hierarchy::{Hierarchy, NodeIdx};
use book_model::{NodeId, NodeKind};
use serde::Serialize;

/// One row of the navigation tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NavigationEntry {
    pub node: NodeIdx,
    pub id: NodeId,
    pub title: String,
    pub kind: NodeKind,
    pub level: u8,
    pub global_index: u32,
    /// Indentation depth below the navigation roots.
    pub depth: usize,
    pub has_children: bool,
    pub expanded: bool,
    /// The row is the selected node.
    pub selected: bool,
    /// The row is an ancestor of the selected node.
    pub on_selected_path: bool,
}

/// Flatten the tree into rows, descending only into expanded nodes.
pub fn navigation_entries(hierarchy: &Hierarchy, state: &ViewerState) -> Vec<NavigationEntry> {
    let selected = hierarchy.resolve_selection(&state.selection).map(|p| p.node);
    let selected_path = selected.map(|s| hierarchy.ancestors(s)).unwrap_or_default();

    let mut rows = Vec::new();
    let mut stack: Vec<(NodeIdx, usize)> = hierarchy.navigation_roots().iter().rev().map(|&idx| (idx, 0)).collect();
    while let Some((idx, depth)) = stack.pop() {
        let node = hierarchy.node(idx);
        let expanded = state.is_expanded(&node.id);
        rows.push(NavigationEntry {
            node: idx,
            id: node.id.clone(),
            title: node.title.clone(),
            kind: node.kind,
            level: node.level,
            global_index: node.global_index,
            depth,
            has_children: !node.children.is_empty(),
            expanded,
            selected: selected == Some(idx),
            on_selected_path: selected_path.contains(&idx),
        });
        if expanded {
            stack.extend(node.children.iter().rev().map(|&child| (child, depth + 1)));
        }
    }
    rows
}
