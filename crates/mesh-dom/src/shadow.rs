//! Shadow DOM
//!
//! Shadow root data and the shadow-crossing id resolver.
//!
//! Ordinary id lookup stops at shadow boundaries. [`find_in_shadow`] searches
//! the whole shadow forest below a scope, which is how out-of-band patches
//! find components nested inside other components' shadow trees.

use crate::{DomTree, NodeId};

/// Shadow root mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShadowRootMode {
    #[default]
    Open,
    Closed,
}

impl ShadowRootMode {
    /// Parse a `shadowrootmode` attribute value
    pub fn from_attr(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "open" => Some(Self::Open),
            "closed" => Some(Self::Closed),
            _ => None,
        }
    }

    /// Attribute spelling
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

/// Shadow root
#[derive(Debug, Clone)]
pub struct ShadowRootData {
    pub host: NodeId,
    pub mode: ShadowRootMode,
}

impl ShadowRootData {
    /// Create shadow root data for `host`
    pub fn new(host: NodeId, mode: ShadowRootMode) -> Self {
        Self { host, mode }
    }
}

/// Locate the element carrying `id` anywhere below `scope`, including inside
/// shadow roots nested at any depth.
///
/// A direct lookup in `scope` is tried first; otherwise every element of the
/// scope that hosts a shadow root is searched recursively. Ids are unique
/// across the forest, so the first match is the only match. `None` means the
/// target is currently absent, which callers treat as a normal outcome.
pub fn find_in_shadow(tree: &DomTree, scope: NodeId, id: &str) -> Option<NodeId> {
    if let Some(found) = tree.get_element_by_id(scope, id) {
        return Some(found);
    }

    for node in tree.descendants(scope) {
        if let Some(shadow) = tree.shadow_root(node) {
            if let Some(found) = find_in_shadow(tree, shadow, id) {
                return Some(found);
            }
        }
    }

    None
}
