//! Drop indicator
//!
//! Shows where a dragged item would land. One indicator element per
//! container, kept in the same scope as the container's items.

use crate::drag::DropScan;
use crate::events::{DragEvent, DropEffect};
use crate::{BoardConfig, BoardResult};
use mesh_dom::{Document, DomTree, ElementGeometry, NodeId, Selector};
use std::collections::HashMap;

/// Drop indicator and drag-over highlighting for containers
#[derive(Debug, Clone)]
pub struct DropIndicatorController {
    items: Selector,
    dragging_class: String,
    drag_over_class: String,
    indicator_class: String,
    /// container -> indicator element
    indicators: HashMap<NodeId, NodeId>,
}

impl DropIndicatorController {
    pub fn new(config: &BoardConfig) -> BoardResult<Self> {
        Ok(Self {
            items: Selector::parse(&config.item_selector)?,
            dragging_class: config.dragging_class.clone(),
            drag_over_class: config.drag_over_class.clone(),
            indicator_class: config.indicator_class.clone(),
            indicators: HashMap::new(),
        })
    }

    /// Indicator currently shown for `container`
    pub fn indicator(&self, container: NodeId) -> Option<NodeId> {
        self.indicators.get(&container).copied()
    }

    /// Number of containers currently showing an indicator
    pub fn active(&self) -> usize {
        self.indicators.len()
    }

    pub fn on_drag_enter(
        &mut self,
        doc: &mut Document,
        container: NodeId,
        event: &DragEvent,
        geometry: &dyn ElementGeometry,
    ) -> BoardResult<()> {
        doc.tree_mut().add_class(container, &self.drag_over_class)?;
        self.place(doc.tree_mut(), container, event.client_y, geometry)
    }

    pub fn on_drag_over(
        &mut self,
        doc: &mut Document,
        container: NodeId,
        event: &mut DragEvent,
        geometry: &dyn ElementGeometry,
    ) -> BoardResult<()> {
        event.prevent_default();
        event.data_transfer.drop_effect = DropEffect::Move;
        self.place(doc.tree_mut(), container, event.client_y, geometry)
    }

    /// Leaving only counts when the pointer moves outside the container,
    /// including its shadow tree
    pub fn on_drag_leave(
        &mut self,
        doc: &mut Document,
        container: NodeId,
        event: &DragEvent,
    ) -> BoardResult<()> {
        if let Some(related) = event.related_target {
            if doc.tree().contains_composed(container, related) {
                return Ok(());
            }
        }
        self.clear(doc, container)
    }

    pub fn on_drop(&mut self, doc: &mut Document, container: NodeId) -> BoardResult<()> {
        self.clear(doc, container)
    }

    fn clear(&mut self, doc: &mut Document, container: NodeId) -> BoardResult<()> {
        let tree = doc.tree_mut();
        tree.remove_class(container, &self.drag_over_class)?;
        if let Some(indicator) = self.indicators.remove(&container) {
            self.discard(tree, indicator)?;
        }
        Ok(())
    }

    /// Remove and free an indicator element
    fn discard(&self, tree: &mut DomTree, indicator: NodeId) -> BoardResult<()> {
        if !tree.has_class(indicator, &self.indicator_class) {
            return Ok(());
        }
        tree.detach(indicator);
        tree.release(indicator)?;
        Ok(())
    }

    /// Drop indicators whose container or element was freed from the arena
    pub fn forget(&mut self, released: &[NodeId]) {
        if released.is_empty() {
            return;
        }
        self.indicators.retain(|container, indicator| {
            !released.contains(container) && !released.contains(indicator)
        });
    }

    /// Move (creating if needed) the container's indicator to the
    /// insertion point for pointer `y`
    fn place(
        &mut self,
        tree: &mut DomTree,
        container: NodeId,
        y: f64,
        geometry: &dyn ElementGeometry,
    ) -> BoardResult<()> {
        let indicator = self.ensure(tree, container)?;
        let scan = DropScan::scan(tree, container, &self.items, &self.dragging_class, geometry, y);

        match scan.anchor_node() {
            Some(anchor) => {
                let parent = tree.parent(anchor).unwrap_or(container);
                tree.insert_before(parent, indicator, Some(anchor))?;
            }
            None => {
                let parent = scan
                    .items
                    .last()
                    .and_then(|&last| tree.parent(last))
                    .unwrap_or(scan.scope);
                tree.append_child(parent, indicator)?;
            }
        }
        Ok(())
    }

    fn ensure(&mut self, tree: &mut DomTree, container: NodeId) -> BoardResult<NodeId> {
        // The container's content may have been replaced under us
        if let Some(&existing) = self.indicators.get(&container) {
            if tree.contains_composed(container, existing) {
                return Ok(existing);
            }
            self.discard(tree, existing)?;
        }
        let indicator = tree.create_element("div");
        tree.set_attr(indicator, "class", &self.indicator_class)?;
        self.indicators.insert(container, indicator);
        Ok(indicator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::DragEventType;
    use mesh_dom::{DOMRect, RectMap, ShadowRootMode};

    fn setup() -> (Document, NodeId, Vec<NodeId>, RectMap) {
        let mut tree = DomTree::new();
        let root = tree.root();
        let column = tree.create_element("mesh-column");
        tree.set_attr(column, "id", "A").unwrap();
        tree.append_child(root, column).unwrap();
        let shadow = tree.attach_shadow(column, ShadowRootMode::Open).unwrap();
        let list = tree.create_element("div");
        tree.append_child(shadow, list).unwrap();

        let mut rects = RectMap::new();
        let mut cards = Vec::new();
        for i in 0..2 {
            let card = tree.create_element("mesh-card");
            tree.append_child(list, card).unwrap();
            rects.insert(card, DOMRect::from_xywh(0.0, i as f64 * 100.0, 200.0, 100.0));
            cards.push(card);
        }
        (Document::from_tree(tree, "about:blank"), column, cards, rects)
    }

    fn event(kind: DragEventType, y: f64) -> DragEvent {
        DragEvent::new(kind, NodeId::ROOT).at(0.0, y)
    }

    fn indicators_in(doc: &Document, column: NodeId) -> usize {
        let shadow = doc.tree().shadow_root(column).unwrap();
        doc.tree()
            .query_selector_all(shadow, ".drop-indicator")
            .unwrap()
            .len()
    }

    #[test]
    fn test_enter_creates_single_indicator() {
        let (mut doc, column, cards, rects) = setup();
        let mut ctrl = DropIndicatorController::new(&BoardConfig::default()).unwrap();

        ctrl.on_drag_enter(&mut doc, column, &event(DragEventType::DragEnter, 20.0), &rects)
            .unwrap();
        ctrl.on_drag_enter(&mut doc, column, &event(DragEventType::DragEnter, 20.0), &rects)
            .unwrap();

        assert_eq!(indicators_in(&doc, column), 1);
        assert!(doc.tree().has_class(column, "drag-over"));
        let indicator = ctrl.indicator(column).unwrap();
        let list = doc.tree().parent(cards[0]).unwrap();
        assert_eq!(doc.tree().children(list).next(), Some(indicator));
    }

    #[test]
    fn test_over_repositions() {
        let (mut doc, column, cards, rects) = setup();
        let mut ctrl = DropIndicatorController::new(&BoardConfig::default()).unwrap();
        ctrl.on_drag_enter(&mut doc, column, &event(DragEventType::DragEnter, 20.0), &rects)
            .unwrap();

        let mut over = event(DragEventType::DragOver, 120.0);
        ctrl.on_drag_over(&mut doc, column, &mut over, &rects).unwrap();
        assert!(over.default_prevented());
        assert_eq!(over.data_transfer.drop_effect, DropEffect::Move);

        let list = doc.tree().parent(cards[0]).unwrap();
        let order: Vec<NodeId> = doc.tree().children(list).collect();
        let indicator = ctrl.indicator(column).unwrap();
        assert_eq!(order, vec![cards[0], indicator, cards[1]]);

        let mut over = event(DragEventType::DragOver, 900.0);
        ctrl.on_drag_over(&mut doc, column, &mut over, &rects).unwrap();
        let order: Vec<NodeId> = doc.tree().children(list).collect();
        assert_eq!(order, vec![cards[0], cards[1], indicator]);
        assert_eq!(indicators_in(&doc, column), 1);
    }

    #[test]
    fn test_leave_into_shadow_child_keeps_indicator() {
        let (mut doc, column, cards, rects) = setup();
        let mut ctrl = DropIndicatorController::new(&BoardConfig::default()).unwrap();
        ctrl.on_drag_enter(&mut doc, column, &event(DragEventType::DragEnter, 20.0), &rects)
            .unwrap();

        let leave = event(DragEventType::DragLeave, 20.0).with_related_target(cards[1]);
        ctrl.on_drag_leave(&mut doc, column, &leave).unwrap();
        assert_eq!(indicators_in(&doc, column), 1);
        assert!(doc.tree().has_class(column, "drag-over"));
    }

    #[test]
    fn test_leave_outside_removes_indicator() {
        let (mut doc, column, _cards, rects) = setup();
        let body = doc.tree().root();
        let mut ctrl = DropIndicatorController::new(&BoardConfig::default()).unwrap();
        ctrl.on_drag_enter(&mut doc, column, &event(DragEventType::DragEnter, 20.0), &rects)
            .unwrap();

        let leave = event(DragEventType::DragLeave, 20.0).with_related_target(body);
        ctrl.on_drag_leave(&mut doc, column, &leave).unwrap();
        assert_eq!(indicators_in(&doc, column), 0);
        assert!(!doc.tree().has_class(column, "drag-over"));
        assert_eq!(ctrl.active(), 0);
    }

    #[test]
    fn test_drop_removes_indicator() {
        let (mut doc, column, _cards, rects) = setup();
        let mut ctrl = DropIndicatorController::new(&BoardConfig::default()).unwrap();
        ctrl.on_drag_enter(&mut doc, column, &event(DragEventType::DragEnter, 20.0), &rects)
            .unwrap();
        ctrl.on_drop(&mut doc, column).unwrap();
        assert_eq!(indicators_in(&doc, column), 0);
        assert!(ctrl.indicator(column).is_none());
    }
}
