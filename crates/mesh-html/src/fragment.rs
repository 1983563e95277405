//! Detached HTML fragments
//!
//! A fragment owns its own arena. Nodes are copied into a live tree with
//! [`mesh_dom::DomTree::import_subtree`].

use mesh_dom::{DomTree, NodeId, Selector};

/// Parsed, detached HTML fragment
#[derive(Debug, Clone)]
pub struct Fragment {
    tree: DomTree,
}

impl Fragment {
    pub(crate) fn new(tree: DomTree) -> Self {
        Self { tree }
    }

    /// Backing tree
    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    /// Top-level nodes
    pub fn roots(&self) -> Vec<NodeId> {
        self.tree.children(self.tree.root()).collect()
    }

    /// Every element in the fragment's light tree, in tree order
    pub fn elements(&self) -> Vec<NodeId> {
        self.tree
            .descendants(self.tree.root())
            .into_iter()
            .filter(|&n| self.tree.is_element(n))
            .collect()
    }

    /// Elements matching `selector` in the fragment's light tree
    pub fn select(&self, selector: &Selector) -> Vec<NodeId> {
        self.tree.select_all(self.tree.root(), selector)
    }

    /// Elements carrying the boolean attribute `attr`
    pub fn flagged(&self, attr: &str) -> Vec<NodeId> {
        self.elements()
            .into_iter()
            .filter(|&n| self.tree.has_attr(n, attr))
            .collect()
    }
}
