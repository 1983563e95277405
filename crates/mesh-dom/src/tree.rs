//! DOM Tree (arena-based allocation)
//!
//! Detached subtrees stay allocated until [`DomTree::release`] frees them;
//! freed slots are reused by later allocations. Shadow roots are arena nodes
//! whose `parent` is NONE and which are linked to their host through
//! [`ShadowRootData::host`].

use crate::classlist::DOMTokenList;
use crate::node::{ElementData, Node, NodeData};
use crate::selector::Selector;
use crate::shadow::{ShadowRootData, ShadowRootMode};
use crate::{DomError, DomResult, NodeId};

/// Arena-based DOM tree
#[derive(Debug, Clone)]
pub struct DomTree {
    nodes: Vec<Option<Node>>,
    free_list: Vec<NodeId>,
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DomTree {
    /// Create a tree holding only the document node
    pub fn new() -> Self {
        Self {
            nodes: vec![Some(Node::document())],
            free_list: Vec::new(),
        }
    }

    /// Document node
    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index()).and_then(Option::as_ref)
    }

    /// Get a mutable node by ID
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Number of live nodes (detached but unreleased ones included)
    pub fn len(&self) -> usize {
        self.nodes.len() - self.free_list.len()
    }

    /// Check if tree holds only the document node
    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }

    /// Allocated slots, live or free
    pub fn capacity(&self) -> usize {
        self.nodes.len()
    }

    fn push(&mut self, node: Node) -> NodeId {
        if let Some(id) = self.free_list.pop() {
            self.nodes[id.index()] = Some(node);
            return id;
        }
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Some(node));
        id
    }

    /// Apply `f` to a node if it is live
    fn update(&mut self, id: NodeId, f: impl FnOnce(&mut Node)) {
        if let Some(node) = self.get_mut(id) {
            f(node);
        }
    }

    fn node(&self, id: NodeId) -> DomResult<&Node> {
        self.get(id).ok_or(DomError::NotFound(id))
    }

    fn node_mut(&mut self, id: NodeId) -> DomResult<&mut Node> {
        self.get_mut(id).ok_or(DomError::NotFound(id))
    }

    // ------------------------------------------------------------------
    // Node creation
    // ------------------------------------------------------------------

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(Node::element(tag))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(Node::text(text.to_string()))
    }

    /// Create a detached comment node
    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.push(Node::comment(text.to_string()))
    }

    /// Create a detached doctype node
    pub fn create_doctype(&mut self, name: &str) -> NodeId {
        self.push(Node::with_data(NodeData::Doctype {
            name: name.to_string(),
        }))
    }

    // ------------------------------------------------------------------
    // Element accessors
    // ------------------------------------------------------------------

    /// Element data for `id`
    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        self.get(id).and_then(Node::as_element)
    }

    /// Mutable element data for `id`
    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        self.get_mut(id).and_then(Node::as_element_mut)
    }

    fn element_or_err(&mut self, id: NodeId) -> DomResult<&mut ElementData> {
        self.node_mut(id)?
            .as_element_mut()
            .ok_or(DomError::NotAnElement(id))
    }

    /// Check if a node is an element
    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    /// Lowercase tag name
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|e| e.name.as_str())
    }

    /// Attribute value
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?.get_attr(name)
    }

    /// Check for attribute presence
    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.attr(id, name).is_some()
    }

    /// Set attribute value
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) -> DomResult<()> {
        self.element_or_err(id)?.set_attr(name, value);
        Ok(())
    }

    /// Remove attribute
    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> DomResult<Option<String>> {
        Ok(self.element_or_err(id)?.remove_attr(name))
    }

    /// The element's `id` attribute
    pub fn element_id(&self, id: NodeId) -> Option<&str> {
        self.element(id)?.id()
    }

    /// Text content of a text node
    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.get(id)?.as_text()
    }

    /// Concatenated text of all descendant text nodes (light tree only)
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for node in self.descendants(id) {
            if let Some(text) = self.text(node) {
                out.push_str(text);
            }
        }
        out
    }

    // ------------------------------------------------------------------
    // Classes
    // ------------------------------------------------------------------

    /// Parsed `class` attribute
    pub fn class_list(&self, id: NodeId) -> DOMTokenList {
        DOMTokenList::from_string(self.attr(id, "class").unwrap_or(""))
    }

    /// Check for a class token
    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.class_list(id).contains(class)
    }

    /// Add a class token
    pub fn add_class(&mut self, id: NodeId, class: &str) -> DomResult<()> {
        let mut list = self.class_list(id);
        list.add(&[class]);
        self.set_attr(id, "class", &list.value())
    }

    /// Remove a class token
    pub fn remove_class(&mut self, id: NodeId, class: &str) -> DomResult<()> {
        if !self.is_element(id) {
            return Err(DomError::NotAnElement(id));
        }
        let mut list = self.class_list(id);
        if !list.contains(class) {
            return Ok(());
        }
        list.remove(&[class]);
        if list.length() == 0 {
            self.remove_attr(id, "class")?;
            Ok(())
        } else {
            self.set_attr(id, "class", &list.value())
        }
    }

    // ------------------------------------------------------------------
    // Structure
    // ------------------------------------------------------------------

    /// Parent node (None for scope roots and detached nodes)
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).map(|n| n.parent).filter(|p| p.is_valid())
    }

    /// Iterate over direct children
    pub fn children(&self, id: NodeId) -> Children<'_> {
        let next = self.get(id).map(|n| n.first_child).unwrap_or(NodeId::NONE);
        Children { tree: self, next }
    }

    /// Direct element children
    pub fn element_children(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id).filter(|&c| self.is_element(c)).collect()
    }

    /// All descendants of `scope` in tree order, excluding `scope` itself.
    ///
    /// Does not enter shadow roots: a shadow tree is a separate scope.
    pub fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(scope).collect();
        stack.reverse();
        while let Some(id) = stack.pop() {
            out.push(id);
            let start = stack.len();
            stack.extend(self.children(id));
            stack[start..].reverse();
        }
        out
    }

    /// Append `child` as the last child of `parent`
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` before `reference` (or append when `None`)
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> DomResult<()> {
        self.node(parent)?;
        if self.node(child)?.is_scope_root() {
            return Err(DomError::HierarchyRequest("scope roots cannot be inserted"));
        }
        if matches!(
            self.node(parent)?.data,
            NodeData::Text(_) | NodeData::Comment(_) | NodeData::Doctype { .. }
        ) {
            return Err(DomError::HierarchyRequest("parent cannot have children"));
        }
        if self.contains(child, parent) {
            return Err(DomError::HierarchyRequest("cannot insert an ancestor"));
        }
        if let Some(r) = reference {
            if self.parent(r) != Some(parent) {
                return Err(DomError::HierarchyRequest("reference is not a child"));
            }
            if r == child {
                return Ok(());
            }
        }

        self.detach(child);

        let prev = match reference {
            Some(r) => self.node(r)?.prev_sibling,
            None => self.node(parent)?.last_child,
        };
        let next = reference.unwrap_or(NodeId::NONE);

        self.update(child, |node| {
            node.parent = parent;
            node.prev_sibling = prev;
            node.next_sibling = next;
        });
        if prev.is_valid() {
            self.update(prev, |n| n.next_sibling = child);
        } else {
            self.update(parent, |n| n.first_child = child);
        }
        if next.is_valid() {
            self.update(next, |n| n.prev_sibling = child);
        } else {
            self.update(parent, |n| n.last_child = child);
        }
        Ok(())
    }

    /// Unlink a node from its parent. No-op for detached nodes.
    pub fn detach(&mut self, id: NodeId) {
        let Some(node) = self.get(id) else {
            return;
        };
        let (parent, prev, next) = (node.parent, node.prev_sibling, node.next_sibling);
        if !parent.is_valid() {
            return;
        }
        if prev.is_valid() {
            self.update(prev, |n| n.next_sibling = next);
        } else {
            self.update(parent, |n| n.first_child = next);
        }
        if next.is_valid() {
            self.update(next, |n| n.prev_sibling = prev);
        } else {
            self.update(parent, |n| n.last_child = prev);
        }
        self.update(id, |node| {
            node.parent = NodeId::NONE;
            node.prev_sibling = NodeId::NONE;
            node.next_sibling = NodeId::NONE;
        });
    }

    /// Put `replacement` where `old` is and detach `old`
    pub fn replace_node(&mut self, old: NodeId, replacement: NodeId) -> DomResult<()> {
        let parent = self
            .parent(old)
            .ok_or(DomError::HierarchyRequest("replaced node has no parent"))?;
        self.insert_before(parent, replacement, Some(old))?;
        self.detach(old);
        Ok(())
    }

    /// Remove every child of `id`
    pub fn clear_children(&mut self, id: NodeId) {
        let children: Vec<NodeId> = self.children(id).collect();
        for child in children {
            self.detach(child);
        }
    }

    /// Free a detached node and everything under it, shadow trees included.
    /// Returns the freed ids; their slots are handed out again by later
    /// allocations, so callers must drop any copies they hold.
    pub fn release(&mut self, id: NodeId) -> DomResult<Vec<NodeId>> {
        if self.node(id)?.is_scope_root() {
            return Err(DomError::HierarchyRequest("scope roots cannot be released"));
        }
        if self.is_connected(id) {
            return Err(DomError::HierarchyRequest("connected nodes cannot be released"));
        }
        self.detach(id);

        let mut freed = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            stack.extend(self.children(current));
            stack.extend(self.shadow_root(current));
            if let Some(slot) = self.nodes.get_mut(current.index()) {
                if slot.take().is_some() {
                    self.free_list.push(current);
                    freed.push(current);
                }
            }
        }
        tracing::trace!("Released {} node(s) under {}", freed.len(), id);
        Ok(freed)
    }

    // ------------------------------------------------------------------
    // Shadow forest
    // ------------------------------------------------------------------

    /// Attach a new, empty shadow root to `host`
    pub fn attach_shadow(&mut self, host: NodeId, mode: ShadowRootMode) -> DomResult<NodeId> {
        let elem = self.element_or_err(host)?;
        if elem.shadow_root.is_some() {
            return Err(DomError::ShadowAlreadyAttached(host));
        }
        let shadow = self.push(Node::shadow_root(ShadowRootData::new(host, mode)));
        if let Some(elem) = self.element_mut(host) {
            elem.shadow_root = Some(shadow);
        }
        tracing::trace!("Attached shadow root {} to {}", shadow, host);
        Ok(shadow)
    }

    /// Shadow root hosted by `host`
    pub fn shadow_root(&self, host: NodeId) -> Option<NodeId> {
        self.element(host)?.shadow_root
    }

    /// Host of a shadow root
    pub fn shadow_host(&self, shadow: NodeId) -> Option<NodeId> {
        self.get(shadow)?.as_shadow_root().map(|s| s.host)
    }

    /// Check if a node is a shadow root
    pub fn is_shadow_root(&self, id: NodeId) -> bool {
        self.shadow_host(id).is_some()
    }

    /// Root of the scope containing `id` (document, shadow root, or the
    /// topmost ancestor of a detached subtree)
    pub fn root_node(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        current
    }

    /// Parent in the composed tree: shadow roots continue to their host
    pub fn composed_parent(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id).or_else(|| self.shadow_host(id))
    }

    /// Inclusive containment within one scope (does not cross shadow roots)
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Inclusive containment across shadow boundaries
    pub fn contains_composed(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.composed_parent(id);
        }
        false
    }

    /// Check if a node is reachable from the document through the shadow forest
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.get(id).is_some() && self.contains_composed(self.root(), id)
    }

    // ------------------------------------------------------------------
    // Queries (scope-local)
    // ------------------------------------------------------------------

    /// First element with the given `id` attribute in `scope`
    pub fn get_element_by_id(&self, scope: NodeId, id: &str) -> Option<NodeId> {
        self.descendants(scope)
            .into_iter()
            .find(|&n| self.element_id(n) == Some(id))
    }

    /// All elements in `scope` matching a parsed selector
    pub fn select_all(&self, scope: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|&n| selector.matches(self, n))
            .collect()
    }

    /// querySelectorAll restricted to `scope`
    pub fn query_selector_all(&self, scope: NodeId, selector: &str) -> DomResult<Vec<NodeId>> {
        let selector = Selector::parse(selector)?;
        Ok(self.select_all(scope, &selector))
    }

    /// querySelector restricted to `scope`
    pub fn query_selector(&self, scope: NodeId, selector: &str) -> DomResult<Option<NodeId>> {
        let selector = Selector::parse(selector)?;
        Ok(self
            .descendants(scope)
            .into_iter()
            .find(|&n| selector.matches(self, n)))
    }

    // ------------------------------------------------------------------
    // Cloning
    // ------------------------------------------------------------------

    /// Deep-copy a subtree of `source` into this arena, shadow roots
    /// included. The copy is detached.
    pub fn import_subtree(&mut self, source: &DomTree, node: NodeId) -> DomResult<NodeId> {
        let copy = source.node(node)?.unlinked_copy();
        let new_id = self.push(copy);

        if let Some(shadow) = source.shadow_root(node) {
            let new_shadow = self.attach_shadow(new_id, source.shadow_mode(shadow))?;
            for child in source.children(shadow).collect::<Vec<_>>() {
                let c = self.import_subtree(source, child)?;
                self.append_child(new_shadow, c)?;
            }
        }

        for child in source.children(node).collect::<Vec<_>>() {
            let c = self.import_subtree(source, child)?;
            self.append_child(new_id, c)?;
        }
        Ok(new_id)
    }

    /// Deep clone within this arena (cloneNode(true)); the clone is detached
    pub fn clone_subtree(&mut self, node: NodeId) -> DomResult<NodeId> {
        let copy = self.node(node)?.unlinked_copy();
        let new_id = self.push(copy);

        if let Some(shadow) = self.shadow_root(node) {
            let new_shadow = self.attach_shadow(new_id, self.shadow_mode(shadow))?;
            for child in self.children(shadow).collect::<Vec<_>>() {
                let c = self.clone_subtree(child)?;
                self.append_child(new_shadow, c)?;
            }
        }

        for child in self.children(node).collect::<Vec<_>>() {
            let c = self.clone_subtree(child)?;
            self.append_child(new_id, c)?;
        }
        Ok(new_id)
    }

    fn shadow_mode(&self, shadow: NodeId) -> ShadowRootMode {
        self.get(shadow)
            .and_then(Node::as_shadow_root)
            .map(|s| s.mode)
            .unwrap_or_default()
    }
}

/// Iterator over the children of a node
pub struct Children<'a> {
    tree: &'a DomTree,
    next: NodeId,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        if !self.next.is_valid() {
            return None;
        }
        let current = self.next;
        self.next = self
            .tree
            .get(current)
            .map(|n| n.next_sibling)
            .unwrap_or(NodeId::NONE);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(tree: &DomTree, parent: NodeId) -> Vec<NodeId> {
        tree.children(parent).collect()
    }

    #[test]
    fn test_insert_before_and_detach() {
        let mut tree = DomTree::new();
        let ul = tree.create_element("ul");
        let a = tree.create_element("li");
        let b = tree.create_element("li");
        let c = tree.create_element("li");
        tree.append_child(tree.root(), ul).unwrap();
        tree.append_child(ul, a).unwrap();
        tree.append_child(ul, c).unwrap();
        tree.insert_before(ul, b, Some(c)).unwrap();
        assert_eq!(list(&tree, ul), vec![a, b, c]);

        tree.detach(b);
        assert_eq!(list(&tree, ul), vec![a, c]);
        assert!(tree.parent(b).is_none());

        // Re-inserting moves rather than duplicates
        tree.append_child(ul, a).unwrap();
        assert_eq!(list(&tree, ul), vec![c, a]);
    }

    #[test]
    fn test_cannot_insert_ancestor() {
        let mut tree = DomTree::new();
        let outer = tree.create_element("div");
        let inner = tree.create_element("div");
        tree.append_child(outer, inner).unwrap();
        assert!(matches!(
            tree.append_child(inner, outer),
            Err(DomError::HierarchyRequest(_))
        ));
    }

    #[test]
    fn test_shadow_root_is_separate_scope() {
        let mut tree = DomTree::new();
        let host = tree.create_element("mesh-column");
        tree.append_child(tree.root(), host).unwrap();
        let shadow = tree.attach_shadow(host, ShadowRootMode::Open).unwrap();
        let inner = tree.create_element("mesh-card");
        tree.append_child(shadow, inner).unwrap();

        assert!(!tree.descendants(tree.root()).contains(&inner));
        assert_eq!(tree.root_node(inner), shadow);
        assert_eq!(tree.composed_parent(shadow), Some(host));
        assert!(!tree.contains(host, inner));
        assert!(tree.contains_composed(host, inner));
        assert!(tree.is_connected(inner));
        assert!(matches!(
            tree.attach_shadow(host, ShadowRootMode::Open),
            Err(DomError::ShadowAlreadyAttached(_))
        ));
    }

    #[test]
    fn test_class_toggling() {
        let mut tree = DomTree::new();
        let card = tree.create_element("mesh-card");
        tree.add_class(card, "dragging").unwrap();
        tree.add_class(card, "dragging").unwrap();
        assert_eq!(tree.attr(card, "class"), Some("dragging"));
        tree.remove_class(card, "dragging").unwrap();
        assert!(!tree.has_attr(card, "class"));
    }

    #[test]
    fn test_import_subtree_copies_shadow() {
        let mut src = DomTree::new();
        let host = src.create_element("mesh-card");
        src.set_attr(host, "id", "card-1").unwrap();
        let shadow = src.attach_shadow(host, ShadowRootMode::Open).unwrap();
        let title = src.create_element("h3");
        let text = src.create_text("Build app");
        src.append_child(shadow, title).unwrap();
        src.append_child(title, text).unwrap();

        let mut dst = DomTree::new();
        let copy = dst.import_subtree(&src, host).unwrap();
        assert_eq!(dst.element_id(copy), Some("card-1"));
        let copied_shadow = dst.shadow_root(copy).unwrap();
        assert_eq!(dst.shadow_host(copied_shadow), Some(copy));
        assert_eq!(dst.text_content(copied_shadow), "Build app");
    }

    #[test]
    fn test_release_frees_detached_subtree() {
        let mut tree = DomTree::new();
        let column = tree.create_element("mesh-column");
        tree.append_child(tree.root(), column).unwrap();
        let card = tree.create_element("mesh-card");
        tree.append_child(column, card).unwrap();
        let shadow = tree.attach_shadow(card, ShadowRootMode::Open).unwrap();
        let title = tree.create_text("Old");
        tree.append_child(shadow, title).unwrap();
        assert_eq!(tree.len(), 5);

        // Still attached to the document
        assert!(matches!(tree.release(card), Err(DomError::HierarchyRequest(_))));

        tree.detach(card);
        let mut freed = tree.release(card).unwrap();
        freed.sort();
        assert_eq!(freed, vec![card, shadow, title]);
        assert_eq!(tree.len(), 2);
        assert!(tree.get(card).is_none());
        assert!(tree.children(column).next().is_none());

        // Freed slots are handed out again
        let capacity = tree.capacity();
        let a = tree.create_element("mesh-card");
        let b = tree.create_element("mesh-card");
        let c = tree.create_element("mesh-card");
        assert_eq!(tree.capacity(), capacity);
        assert!(freed.contains(&a) && freed.contains(&b) && freed.contains(&c));
        assert_eq!(tree.len(), 5);
    }

    #[test]
    fn test_release_refuses_scope_roots() {
        let mut tree = DomTree::new();
        let root = tree.root();
        assert!(tree.release(root).is_err());
        let host = tree.create_element("mesh-card");
        let shadow = tree.attach_shadow(host, ShadowRootMode::Open).unwrap();
        assert!(tree.release(shadow).is_err());
    }

    #[test]
    fn test_clone_subtree_allocates_only_the_copy() {
        let mut tree = DomTree::new();
        let column = tree.create_element("mesh-column");
        tree.append_child(tree.root(), column).unwrap();
        let card = tree.create_element("mesh-card");
        tree.append_child(column, card).unwrap();
        let shadow = tree.attach_shadow(card, ShadowRootMode::Open).unwrap();
        let title = tree.create_element("h3");
        tree.append_child(shadow, title).unwrap();
        let before = tree.len();

        let ghost = tree.clone_subtree(card).unwrap();
        assert_eq!(tree.len(), before + 3);
        assert!(!tree.is_connected(ghost));
        let ghost_shadow = tree.shadow_root(ghost).unwrap();
        assert_ne!(ghost_shadow, shadow);
        assert_eq!(tree.element_children(ghost_shadow).len(), 1);

        tree.release(ghost).unwrap();
        assert_eq!(tree.len(), before);
    }
}
