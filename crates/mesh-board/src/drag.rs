//! Drag reordering
//!
//! Items are dragged between containers. The drop computes an insertion
//! index from the pointer's vertical position and queues a move command;
//! the board itself is never reordered locally, the server's pushed update
//! is the only source of new order.

use crate::events::{DragEffectAllowed, DragEvent};
use crate::{BoardConfig, BoardError, BoardResult};
use mesh_dom::{Document, DomTree, ElementGeometry, NodeId, Selector};
use serde::{Serialize, Serializer};

/// Insertion point among a container's items
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropPosition {
    /// Insert before the item at this index
    Index(usize),
    /// Append after every item
    End,
}

impl Serialize for DropPosition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DropPosition::Index(i) => serializer.serialize_u64(*i as u64),
            DropPosition::End => serializer.serialize_str("end"),
        }
    }
}

/// Request to move an item, sent fire-and-forget
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveCommand {
    #[serde(rename = "itemID")]
    pub item_id: String,
    #[serde(rename = "containerID")]
    pub container_id: String,
    pub position: DropPosition,
}

#[derive(Debug, Serialize)]
struct MoveValues<'a> {
    action: &'static str,
    #[serde(flatten)]
    command: &'a MoveCommand,
}

/// Request body of a move: `{"values":{"action":"move",...}}`
#[derive(Debug, Serialize)]
pub struct MoveEnvelope<'a> {
    values: MoveValues<'a>,
}

impl MoveCommand {
    pub fn envelope(&self) -> MoveEnvelope<'_> {
        MoveEnvelope {
            values: MoveValues {
                action: "move",
                command: self,
            },
        }
    }
}

/// Result of scanning a container against the pointer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropScan {
    /// Scope the items were taken from
    pub scope: NodeId,
    /// Candidate items in tree order, the dragged item excluded
    pub items: Vec<NodeId>,
    /// Index of the first item whose midpoint lies below the pointer
    pub anchor: Option<usize>,
}

impl DropScan {
    /// Scan `container`'s items for the insertion point at pointer `y`.
    ///
    /// Items are looked up in the container's shadow tree. A container
    /// without one, or whose shadow tree holds no items, is scanned in its
    /// light tree instead.
    pub fn scan(
        tree: &DomTree,
        container: NodeId,
        items: &Selector,
        dragging_class: &str,
        geometry: &dyn ElementGeometry,
        y: f64,
    ) -> Self {
        let candidates = |scope: NodeId| -> Vec<NodeId> {
            tree.select_all(scope, items)
                .into_iter()
                .filter(|&n| !tree.has_class(n, dragging_class))
                .collect()
        };

        let shadow = tree.shadow_root(container);
        let mut scope = shadow.unwrap_or(container);
        let mut found = candidates(scope);
        if found.is_empty() && shadow.is_some() {
            let light = candidates(container);
            if !light.is_empty() {
                scope = container;
                found = light;
            }
        }

        // Strict comparison: a pointer exactly on a midpoint goes below it
        let anchor = found.iter().position(|&item| {
            geometry
                .bounding_client_rect(item)
                .is_some_and(|rect| y < rect.mid_y())
        });

        Self {
            scope,
            items: found,
            anchor,
        }
    }

    pub fn position(&self) -> DropPosition {
        self.anchor.map_or(DropPosition::End, DropPosition::Index)
    }

    /// Item the insertion goes before
    pub fn anchor_node(&self) -> Option<NodeId> {
        self.anchor.map(|i| self.items[i])
    }
}

/// Drag-and-drop reorder protocol for items and containers
#[derive(Debug, Clone)]
pub struct DragReorderController {
    items: Selector,
    dragging_class: String,
    /// Drag image of the drag in progress
    ghost: Option<NodeId>,
    outbox: Vec<MoveCommand>,
}

impl DragReorderController {
    pub fn new(config: &BoardConfig) -> BoardResult<Self> {
        Ok(Self {
            items: Selector::parse(&config.item_selector)?,
            dragging_class: config.dragging_class.clone(),
            ghost: None,
            outbox: Vec::new(),
        })
    }

    pub fn item_selector(&self) -> &Selector {
        &self.items
    }

    pub fn dragging_class(&self) -> &str {
        &self.dragging_class
    }

    /// Item identity: `data-id`, falling back to `id`
    pub fn item_id<'a>(&self, tree: &'a DomTree, item: NodeId) -> Option<&'a str> {
        tree.attr(item, "data-id")
            .filter(|id| !id.is_empty())
            .or_else(|| tree.element_id(item).filter(|id| !id.is_empty()))
    }

    /// Drag image of the drag in progress
    pub fn ghost(&self) -> Option<NodeId> {
        self.ghost
    }

    /// An item starts being dragged
    pub fn on_drag_start(
        &mut self,
        doc: &mut Document,
        item: NodeId,
        event: &mut DragEvent,
        geometry: &dyn ElementGeometry,
    ) -> BoardResult<()> {
        let Some(id) = self.item_id(doc.tree(), item).map(str::to_string) else {
            tracing::error!("Drag started on item {} without an id", item);
            return Err(BoardError::MissingId(item));
        };

        // A drag that never saw its end leaves its image behind
        self.release_ghost(doc.tree_mut())?;
        let ghost = self.create_drag_image(doc.tree_mut(), item, geometry)?;
        self.ghost = Some(ghost);
        event.data_transfer.set_drag_image(ghost, 0.0, 0.0);
        event.data_transfer.set_data("text/plain", &id);
        event.data_transfer.effect_allowed = DragEffectAllowed::Move;
        doc.tree_mut().add_class(item, &self.dragging_class)?;

        tracing::debug!("Drag start: {}", id);
        Ok(())
    }

    /// Detached clone of the item, styled off-screen and tilted
    fn create_drag_image(
        &self,
        tree: &mut DomTree,
        item: NodeId,
        geometry: &dyn ElementGeometry,
    ) -> BoardResult<NodeId> {
        let ghost = tree.clone_subtree(item)?;
        let mut style = String::from("position: absolute; top: -1000px; left: -1000px;");
        if let Some(rect) = geometry.bounding_client_rect(item) {
            style.push_str(&format!(
                " width: {}px; height: {}px;",
                rect.width, rect.height
            ));
        }
        style.push_str(
            " transform: rotate(5deg) scale(1.05) translate(-50%, -50%); opacity: 1; \
             box-shadow: none; z-index: 9999; pointer-events: none;",
        );
        tree.set_attr(ghost, "style", &style)?;
        Ok(ghost)
    }

    /// An item was dropped on `container`. Queues and returns the move.
    pub fn on_drop(
        &mut self,
        doc: &Document,
        container: NodeId,
        event: &mut DragEvent,
        geometry: &dyn ElementGeometry,
    ) -> BoardResult<MoveCommand> {
        event.prevent_default();

        let item_id = event.data_transfer.get_data("text/plain");
        if item_id.is_empty() {
            tracing::error!("Drop on {} without an item id", container);
            return Err(BoardError::MissingPayload);
        }
        let tree = doc.tree();
        let Some(container_id) = tree.element_id(container).filter(|id| !id.is_empty()) else {
            tracing::error!("Drop on container {} without an id", container);
            return Err(BoardError::MissingId(container));
        };

        let scan = DropScan::scan(
            tree,
            container,
            &self.items,
            &self.dragging_class,
            geometry,
            event.client_y,
        );
        let command = MoveCommand {
            item_id,
            container_id: container_id.to_string(),
            position: scan.position(),
        };
        tracing::info!(
            "Move {} to {} at {:?}",
            command.item_id,
            command.container_id,
            command.position
        );
        self.outbox.push(command.clone());
        Ok(command)
    }

    /// The drag finished, dropped or not
    pub fn on_drag_end(&mut self, doc: &mut Document, item: NodeId) -> BoardResult<()> {
        self.release_ghost(doc.tree_mut())?;
        doc.tree_mut().remove_class(item, &self.dragging_class)?;
        Ok(())
    }

    fn release_ghost(&mut self, tree: &mut DomTree) -> BoardResult<()> {
        if let Some(ghost) = self.ghost.take() {
            tree.release(ghost)?;
        }
        Ok(())
    }

    /// Drain queued move commands
    pub fn take_commands(&mut self) -> Vec<MoveCommand> {
        std::mem::take(&mut self.outbox)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::DragEventType;
    use mesh_dom::{DOMRect, RectMap, ShadowRootMode};

    struct Column {
        doc: Document,
        column: NodeId,
        x: NodeId,
        y: NodeId,
        rects: RectMap,
    }

    /// Column "A" with items X (0..100) and Y (100..200) in its shadow tree
    fn column() -> Column {
        let mut tree = DomTree::new();
        let root = tree.root();
        let column = tree.create_element("mesh-column");
        tree.set_attr(column, "id", "A").unwrap();
        tree.append_child(root, column).unwrap();
        let shadow = tree.attach_shadow(column, ShadowRootMode::Open).unwrap();

        let mut rects = RectMap::new();
        let mut items = Vec::new();
        for (i, id) in ["X", "Y"].iter().enumerate() {
            let card = tree.create_element("mesh-card");
            tree.set_attr(card, "data-id", id).unwrap();
            tree.append_child(shadow, card).unwrap();
            rects.insert(card, DOMRect::from_xywh(0.0, i as f64 * 100.0, 200.0, 100.0));
            items.push(card);
        }

        Column {
            doc: Document::from_tree(tree, "about:blank"),
            column,
            x: items[0],
            y: items[1],
            rects,
        }
    }

    fn drop_at(y: f64, item: &str) -> DragEvent {
        let mut event = DragEvent::new(DragEventType::Drop, NodeId::ROOT).at(10.0, y);
        event.data_transfer.set_data("text/plain", item);
        event
    }

    fn controller() -> DragReorderController {
        DragReorderController::new(&BoardConfig::default()).unwrap()
    }

    #[test]
    fn test_drop_above_second_midpoint() {
        let c = column();
        let mut ctrl = controller();
        let command = ctrl
            .on_drop(&c.doc, c.column, &mut drop_at(120.0, "Z"), &c.rects)
            .unwrap();
        assert_eq!(
            command,
            MoveCommand {
                item_id: "Z".to_string(),
                container_id: "A".to_string(),
                position: DropPosition::Index(1),
            }
        );
        assert_eq!(ctrl.take_commands(), vec![command]);
        assert!(ctrl.take_commands().is_empty());
    }

    #[test]
    fn test_midpoint_tie_goes_below() {
        let c = column();
        let mut ctrl = controller();
        // Exactly on X's midpoint: before the lower item
        let command = ctrl
            .on_drop(&c.doc, c.column, &mut drop_at(50.0, "Z"), &c.rects)
            .unwrap();
        assert_eq!(command.position, DropPosition::Index(1));
        // On the shared boundary: also before the lower item
        let command = ctrl
            .on_drop(&c.doc, c.column, &mut drop_at(100.0, "Z"), &c.rects)
            .unwrap();
        assert_eq!(command.position, DropPosition::Index(1));
    }

    #[test]
    fn test_drop_below_last_is_end() {
        let c = column();
        let mut ctrl = controller();
        let command = ctrl
            .on_drop(&c.doc, c.column, &mut drop_at(500.0, "Z"), &c.rects)
            .unwrap();
        assert_eq!(command.position, DropPosition::End);
    }

    #[test]
    fn test_dragged_item_is_skipped() {
        let mut c = column();
        c.doc.tree_mut().add_class(c.x, "dragging").unwrap();
        let mut ctrl = controller();
        // Above Y's midpoint: Y is now index 0
        let command = ctrl
            .on_drop(&c.doc, c.column, &mut drop_at(120.0, "X"), &c.rects)
            .unwrap();
        assert_eq!(command.position, DropPosition::Index(0));
    }

    #[test]
    fn test_drop_without_payload_errors() {
        let c = column();
        let mut ctrl = controller();
        let mut event = DragEvent::new(DragEventType::Drop, c.column).at(0.0, 10.0);
        let result = ctrl.on_drop(&c.doc, c.column, &mut event, &c.rects);
        assert!(matches!(result, Err(BoardError::MissingPayload)));
        assert!(event.default_prevented());
        assert!(ctrl.take_commands().is_empty());
    }

    #[test]
    fn test_drop_on_container_without_id_errors() {
        let mut c = column();
        c.doc.tree_mut().remove_attr(c.column, "id").unwrap();
        let mut ctrl = controller();
        let result = ctrl.on_drop(&c.doc, c.column, &mut drop_at(10.0, "Z"), &c.rects);
        assert!(matches!(result, Err(BoardError::MissingId(_))));
    }

    #[test]
    fn test_drag_start_and_end() {
        let mut c = column();
        let mut ctrl = controller();
        let mut event = DragEvent::new(DragEventType::DragStart, c.y);
        ctrl.on_drag_start(&mut c.doc, c.y, &mut event, &c.rects).unwrap();

        assert!(c.doc.tree().has_class(c.y, "dragging"));
        assert_eq!(event.data_transfer.get_data("text/plain"), "Y");
        assert_eq!(event.data_transfer.effect_allowed, DragEffectAllowed::Move);

        let (ghost, _, _) = event.data_transfer.drag_image().unwrap();
        assert!(!c.doc.tree().is_connected(ghost));
        let style = c.doc.tree().attr(ghost, "style").unwrap();
        assert!(style.contains("rotate(5deg)"));
        assert!(style.contains("width: 200px"));

        ctrl.on_drag_end(&mut c.doc, c.y).unwrap();
        assert!(!c.doc.tree().has_class(c.y, "dragging"));
        assert!(c.doc.tree().get(ghost).is_none());
        assert!(ctrl.ghost().is_none());
        // Unconditional: ending again is harmless
        ctrl.on_drag_end(&mut c.doc, c.y).unwrap();
    }

    #[test]
    fn test_repeated_drags_reuse_the_arena() {
        let mut c = column();
        let mut ctrl = controller();
        let before = c.doc.tree().len();
        for _ in 0..100 {
            let mut start = DragEvent::new(DragEventType::DragStart, c.x);
            ctrl.on_drag_start(&mut c.doc, c.x, &mut start, &c.rects).unwrap();
            ctrl.on_drag_end(&mut c.doc, c.x).unwrap();
        }
        assert_eq!(c.doc.tree().len(), before);

        // A second start without an end replaces the first image
        let mut start = DragEvent::new(DragEventType::DragStart, c.x);
        ctrl.on_drag_start(&mut c.doc, c.x, &mut start, &c.rects).unwrap();
        let mut start = DragEvent::new(DragEventType::DragStart, c.y);
        ctrl.on_drag_start(&mut c.doc, c.y, &mut start, &c.rects).unwrap();
        assert_eq!(c.doc.tree().len(), before + 1);
    }

    #[test]
    fn test_item_id_falls_back_to_id() {
        let mut tree = DomTree::new();
        let card = tree.create_element("mesh-card");
        tree.set_attr(card, "id", "card-9").unwrap();
        assert_eq!(controller().item_id(&tree, card), Some("card-9"));
        tree.set_attr(card, "data-id", "9").unwrap();
        assert_eq!(controller().item_id(&tree, card), Some("9"));
    }

    #[test]
    fn test_light_tree_container() {
        let mut tree = DomTree::new();
        let root = tree.root();
        let column = tree.create_element("mesh-column");
        tree.set_attr(column, "id", "B").unwrap();
        tree.append_child(root, column).unwrap();
        let card = tree.create_element("mesh-card");
        tree.append_child(column, card).unwrap();
        let mut rects = RectMap::new();
        rects.insert(card, DOMRect::from_xywh(0.0, 0.0, 100.0, 40.0));

        let scan = DropScan::scan(
            &tree,
            column,
            controller().item_selector(),
            "dragging",
            &rects,
            5.0,
        );
        assert_eq!(scan.position(), DropPosition::Index(0));
        assert_eq!(scan.anchor_node(), Some(card));
        assert_eq!(scan.scope, column);
    }

    #[test]
    fn test_empty_shadow_falls_back_to_light_tree() {
        let mut tree = DomTree::new();
        let root = tree.root();
        let column = tree.create_element("mesh-column");
        tree.append_child(root, column).unwrap();
        tree.attach_shadow(column, ShadowRootMode::Open).unwrap();
        let card = tree.create_element("mesh-card");
        tree.append_child(column, card).unwrap();
        let mut rects = RectMap::new();
        rects.insert(card, DOMRect::from_xywh(0.0, 0.0, 100.0, 40.0));

        let scan = DropScan::scan(
            &tree,
            column,
            controller().item_selector(),
            "dragging",
            &rects,
            5.0,
        );
        assert_eq!(scan.scope, column);
        assert_eq!(scan.position(), DropPosition::Index(0));
    }

    #[test]
    fn test_move_body() {
        let command = MoveCommand {
            item_id: "3".to_string(),
            container_id: "column-2".to_string(),
            position: DropPosition::Index(1),
        };
        assert_eq!(
            serde_json::to_string(&command.envelope()).unwrap(),
            r#"{"values":{"action":"move","itemID":"3","containerID":"column-2","position":1}}"#
        );

        let end = MoveCommand {
            position: DropPosition::End,
            ..command
        };
        let body = serde_json::to_string(&end.envelope()).unwrap();
        assert!(body.ends_with(r#""position":"end"}}"#));
    }
}
