//! Board components
//!
//! Custom elements declare which drag events they handle by registering
//! handler functions per event type. Connecting a component makes sure its
//! declarative shadow root is attached and hands both to the host library.

use crate::events::{DragEvent, DragEventType};
use crate::{Board, BoardResult};
use mesh_dom::{DomTree, NodeId, ShadowRootMode};
use std::collections::HashMap;

/// Drag event handler bound to a component. Receives the component element
/// as the current target.
pub type DragHandler = fn(&mut Board, NodeId, &mut DragEvent) -> BoardResult<()>;

/// The request/response swap library the board runs under
pub trait HostLibrary {
    /// Scan a newly attached element or shadow root for request attributes
    fn process(&mut self, tree: &DomTree, node: NodeId);
}

/// Host library that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHost;

impl HostLibrary for NoopHost {
    fn process(&mut self, _tree: &DomTree, _node: NodeId) {}
}

/// Events one component handles
#[derive(Debug, Clone, Default)]
pub struct Capabilities {
    handlers: HashMap<DragEventType, DragHandler>,
}

impl Capabilities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, event_type: DragEventType, handler: DragHandler) -> Self {
        self.handlers.insert(event_type, handler);
        self
    }

    pub fn handler(&self, event_type: DragEventType) -> Option<DragHandler> {
        self.handlers.get(&event_type).copied()
    }

    pub fn handles(&self, event_type: DragEventType) -> bool {
        self.handlers.contains_key(&event_type)
    }
}

/// Registered components by tag name
#[derive(Debug, Clone, Default)]
pub struct ComponentRegistry {
    components: HashMap<String, Capabilities>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a component
    pub fn define(&mut self, tag: &str, capabilities: Capabilities) {
        tracing::debug!("Defined component <{}>", tag);
        self.components
            .insert(tag.to_ascii_lowercase(), capabilities);
    }

    pub fn get(&self, tag: &str) -> Option<&Capabilities> {
        self.components.get(tag)
    }

    pub fn is_defined(&self, tag: &str) -> bool {
        self.components.contains_key(tag)
    }

    /// Handler registered on `element`'s component for `event_type`
    pub fn handler_for(
        &self,
        tree: &DomTree,
        element: NodeId,
        event_type: DragEventType,
    ) -> Option<DragHandler> {
        let tag = tree.tag_name(element)?;
        self.components.get(tag)?.handler(event_type)
    }

    /// Connect every registered component in the composed subtree rooted at
    /// `root`, outermost first. Returns the connected elements.
    pub fn connect_subtree(
        &self,
        tree: &mut DomTree,
        root: NodeId,
        host: &mut dyn HostLibrary,
    ) -> BoardResult<Vec<NodeId>> {
        let mut connected = Vec::new();
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            if tree.tag_name(node).is_some_and(|tag| self.is_defined(tag)) {
                connect(tree, node, host)?;
                connected.push(node);
            }

            let mut next: Vec<NodeId> = tree.children(node).collect();
            if let Some(shadow) = tree.shadow_root(node) {
                next.insert(0, shadow);
            }
            stack.extend(next.into_iter().rev());
        }
        Ok(connected)
    }
}

/// Attach a pending declarative shadow root, then process the element and
/// its shadow root. Elements without a shadow root or a pending template
/// keep their light tree.
pub fn connect(tree: &mut DomTree, element: NodeId, host: &mut dyn HostLibrary) -> BoardResult<()> {
    if tree.shadow_root(element).is_none() {
        let pending = tree.element_children(element).into_iter().find_map(|c| {
            if tree.tag_name(c) != Some("template") {
                return None;
            }
            let mode = ShadowRootMode::from_attr(tree.attr(c, "shadowrootmode")?)?;
            Some((c, mode))
        });
        if let Some((template, mode)) = pending {
            let shadow = tree.attach_shadow(element, mode)?;
            for child in tree.children(template).collect::<Vec<_>>() {
                let copy = tree.clone_subtree(child)?;
                tree.append_child(shadow, copy)?;
            }
        }
    }

    host.process(tree, element);
    if let Some(shadow) = tree.shadow_root(element) {
        host.process(tree, shadow);
    }
    Ok(())
}
