//! Board
//!
//! Owns the live document and routes drag events, swaps and pushed updates
//! to the controllers.

use crate::component::{Capabilities, ComponentRegistry, HostLibrary, NoopHost};
use crate::drag::{DragReorderController, MoveCommand};
use crate::events::{DragEvent, DragEventType};
use crate::indicator::DropIndicatorController;
use crate::mover::MoveDispatcher;
use crate::oob::{OobApplier, OobPayload, UpdateReport};
use crate::swap::{SwapDecision, SwapInterceptor};
use crate::{BoardConfig, BoardResult};
use mesh_dom::{Document, ElementGeometry, NodeId, RectMap};

/// Live board
pub struct Board {
    document: Document,
    config: BoardConfig,
    registry: ComponentRegistry,
    host: Box<dyn HostLibrary>,
    geometry: Box<dyn ElementGeometry>,
    swap: SwapInterceptor,
    drag: DragReorderController,
    indicator: DropIndicatorController,
    oob: OobApplier,
}

impl Board {
    pub fn new(document: Document, config: BoardConfig) -> BoardResult<Self> {
        Ok(Self {
            registry: Self::default_components(&config),
            drag: DragReorderController::new(&config)?,
            indicator: DropIndicatorController::new(&config)?,
            oob: OobApplier::new(&config.oob_attribute),
            swap: SwapInterceptor::new(),
            host: Box::new(NoopHost),
            geometry: Box::new(RectMap::new()),
            document,
            config,
        })
    }

    pub fn with_host(mut self, host: impl HostLibrary + 'static) -> Self {
        self.host = Box::new(host);
        self
    }

    pub fn with_geometry(mut self, geometry: impl ElementGeometry + 'static) -> Self {
        self.geometry = Box::new(geometry);
        self
    }

    /// Replace the layout source (after a relayout)
    pub fn set_geometry(&mut self, geometry: impl ElementGeometry + 'static) {
        self.geometry = Box::new(geometry);
    }

    /// Items handle drag start/end; containers handle enter/over/leave/drop
    pub fn default_components(config: &BoardConfig) -> ComponentRegistry {
        let mut registry = ComponentRegistry::new();
        registry.define(
            &config.item_selector,
            Capabilities::new()
                .on(DragEventType::DragStart, item_drag_start)
                .on(DragEventType::DragEnd, item_drag_end),
        );
        registry.define(
            &config.container_selector,
            Capabilities::new()
                .on(DragEventType::DragEnter, container_drag_enter)
                .on(DragEventType::DragOver, container_drag_over)
                .on(DragEventType::DragLeave, container_drag_leave)
                .on(DragEventType::Drop, container_drop),
        );
        registry
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ComponentRegistry {
        &mut self.registry
    }

    pub fn indicator(&self) -> &DropIndicatorController {
        &self.indicator
    }

    pub fn drag(&self) -> &DragReorderController {
        &self.drag
    }

    /// Element with `id` anywhere in the shadow forest
    pub fn resolve(&self, id: &str) -> Option<NodeId> {
        self.document.resolve(id)
    }

    /// Connect every component in the document
    pub fn connect(&mut self) -> BoardResult<Vec<NodeId>> {
        let root = self.document.tree().root();
        let connected =
            self.registry
                .connect_subtree(self.document.tree_mut(), root, self.host.as_mut())?;
        tracing::info!("Connected {} component(s)", connected.len());
        Ok(connected)
    }

    /// Before-swap hook for request/response swaps
    pub fn before_swap(&self, decision: &mut SwapDecision) -> bool {
        self.swap.before_swap(self.document.tree(), decision)
    }

    /// Apply a pushed payload and connect the swapped-in components
    pub fn apply_payload(&mut self, payload: &OobPayload) -> UpdateReport {
        let report = self.oob.apply(&mut self.document, payload);
        self.indicator.forget(&report.released);
        for &node in &report.inserted {
            if let Err(e) =
                self.registry
                    .connect_subtree(self.document.tree_mut(), node, self.host.as_mut())
            {
                tracing::error!("Failed to connect swapped element {}: {}", node, e);
            }
        }
        report
    }

    /// Target, then its ancestors across shadow boundaries
    pub fn composed_path(&self, target: NodeId) -> Vec<NodeId> {
        let tree = self.document.tree();
        let mut path = Vec::new();
        let mut current = Some(target);
        while let Some(node) = current {
            path.push(node);
            current = tree.composed_parent(node);
        }
        path
    }

    /// Dispatch a drag event along its composed path. A failing handler
    /// aborts the dispatch.
    pub fn dispatch(&mut self, event: &mut DragEvent) -> BoardResult<()> {
        for node in self.composed_path(event.target) {
            let handler = self
                .registry
                .handler_for(self.document.tree(), node, event.event_type);
            if let Some(handler) = handler {
                if let Err(e) = handler(self, node, event) {
                    tracing::error!("{} handler on {} failed: {}", event.event_type.as_str(), node, e);
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    /// Drain move commands queued by drops
    pub fn take_move_commands(&mut self) -> Vec<MoveCommand> {
        self.drag.take_commands()
    }

    /// Send queued moves without waiting for responses
    pub fn send_moves(&mut self, dispatcher: &MoveDispatcher) -> usize {
        let commands = self.take_move_commands();
        let count = commands.len();
        for command in commands {
            dispatcher.send(command);
        }
        count
    }
}

fn item_drag_start(board: &mut Board, item: NodeId, event: &mut DragEvent) -> BoardResult<()> {
    board
        .drag
        .on_drag_start(&mut board.document, item, event, board.geometry.as_ref())
}

fn item_drag_end(board: &mut Board, item: NodeId, _event: &mut DragEvent) -> BoardResult<()> {
    board.drag.on_drag_end(&mut board.document, item)
}

fn container_drag_enter(
    board: &mut Board,
    container: NodeId,
    event: &mut DragEvent,
) -> BoardResult<()> {
    board
        .indicator
        .on_drag_enter(&mut board.document, container, event, board.geometry.as_ref())
}

fn container_drag_over(
    board: &mut Board,
    container: NodeId,
    event: &mut DragEvent,
) -> BoardResult<()> {
    board
        .indicator
        .on_drag_over(&mut board.document, container, event, board.geometry.as_ref())
}

fn container_drag_leave(
    board: &mut Board,
    container: NodeId,
    event: &mut DragEvent,
) -> BoardResult<()> {
    board.indicator.on_drag_leave(&mut board.document, container, event)
}

fn container_drop(board: &mut Board, container: NodeId, event: &mut DragEvent) -> BoardResult<()> {
    board.indicator.on_drop(&mut board.document, container)?;
    board
        .drag
        .on_drop(&board.document, container, event, board.geometry.as_ref())?;
    Ok(())
}
