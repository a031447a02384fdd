use super::{Hierarchy, HierarchyNode, NodeIdx};
use book_model::NodeKind;
use std::collections::HashSet;

impl Hierarchy {
    /// The node and its ancestors, outermost first.
    pub fn breadcrumb(&self, idx: NodeIdx) -> Vec<&HierarchyNode> {
        let mut crumbs: Vec<&HierarchyNode> = self.ancestors(idx).into_iter().map(|a| self.node(a)).collect();
        if let Some(node) = self.get(idx) {
            crumbs.push(node);
        }
        crumbs
    }

    /// Human-readable location of a node, only as qualified as the work needs.
    ///
    /// Several books: `Book, Part, Chapter` (part omitted when there is none).
    /// One book split into several parts: `Part, Chapter`. Otherwise just the title.
    pub fn display_path(&self, idx: NodeIdx) -> String {
        let crumbs = self.breadcrumb(idx);
        let Some((node, enclosing)) = crumbs.split_last() else {
            return String::new();
        };
        let book = enclosing.iter().rev().find(|n| n.kind == NodeKind::Book);
        let part = enclosing.iter().rev().find(|n| n.kind == NodeKind::Part);

        let mut segments: Vec<&str> = Vec::with_capacity(3);
        if self.distinct_titles(NodeKind::Book) > 1 {
            if let Some(book) = book {
                segments.push(&book.title);
                if let Some(part) = part {
                    segments.push(&part.title);
                }
            }
        } else if self.distinct_titles(NodeKind::Part) > 1 {
            if let Some(part) = part {
                segments.push(&part.title);
            }
        }
        segments.push(&node.title);
        segments.join(", ")
    }

    fn distinct_titles(&self, kind: NodeKind) -> usize {
        self.nodes
            .iter()
            .filter(|n| n.kind == kind)
            .map(|n| n.title.as_str())
            .collect::<HashSet<_>>()
            .len()
    }
}
