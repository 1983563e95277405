//! Document - High-level document API

use crate::shadow::find_in_shadow;
use crate::{DomTree, NodeId};

/// HTML Document
#[derive(Debug, Clone)]
pub struct Document {
    /// The DOM tree
    pub tree: DomTree,
    /// Document URL
    url: String,
}

impl Document {
    /// Wrap an existing tree
    pub fn from_tree(tree: DomTree, url: &str) -> Self {
        Self {
            tree,
            url: url.to_string(),
        }
    }

    /// Create an empty document
    pub fn empty(url: &str) -> Self {
        Self::from_tree(DomTree::new(), url)
    }

    /// Get document URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Get <body> element
    pub fn body(&self) -> Option<NodeId> {
        self.tree
            .descendants(self.tree.root())
            .into_iter()
            .find(|&n| self.tree.tag_name(n) == Some("body"))
    }

    /// Get element by ID in the light tree only (document.getElementById)
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.tree.get_element_by_id(self.tree.root(), id)
    }

    /// Get element by ID anywhere in the shadow forest
    pub fn resolve(&self, id: &str) -> Option<NodeId> {
        find_in_shadow(&self.tree, self.tree.root(), id)
    }

    /// Access the DOM tree
    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    /// Access the DOM tree mutably
    pub fn tree_mut(&mut self) -> &mut DomTree {
        &mut self.tree
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::empty("about:blank")
    }
}
