//! mesh DOM - Document Object Model
//!
//! Arena-allocated DOM tree with first-class shadow roots. Every scope in the
//! shadow forest (the document node and each shadow root) lives in the same
//! arena, so an element anywhere in the page is addressable by [`NodeId`].

mod classlist;
mod document;
mod geometry;
mod node;
mod selector;
pub mod shadow;
mod tree;

pub use classlist::DOMTokenList;
pub use document::Document;
pub use geometry::{DOMRect, ElementGeometry, RectMap};
pub use node::{Attribute, ElementData, Node, NodeData, TextData};
pub use selector::{Compound, Selector};
pub use shadow::{ShadowRootData, ShadowRootMode, find_in_shadow};
pub use tree::{Children, DomTree};

/// Node identifier (index into arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Root node ID
    pub const ROOT: NodeId = NodeId(0);

    /// Sentinel for "no node"
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Check if this refers to a real node
    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::NONE
    }

    /// Raw arena index
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Result type for DOM operations
pub type DomResult<T> = Result<T, DomError>;

/// DOM operation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    #[error("node {0} not found")]
    NotFound(NodeId),

    #[error("hierarchy request error: {0}")]
    HierarchyRequest(&'static str),

    #[error("node {0} is not an element")]
    NotAnElement(NodeId),

    #[error("element {0} already hosts a shadow root")]
    ShadowAlreadyAttached(NodeId),

    #[error("invalid selector: {0}")]
    InvalidSelector(String),
}
