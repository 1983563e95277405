//! Drag and Drop events
//!
//! HTML5 drag-and-drop event model, dispatched through the composed tree by
//! [`crate::Board::dispatch`].

use mesh_dom::NodeId;
use std::collections::HashMap;

/// Drag operation type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragEffectAllowed {
    None,
    Copy,
    Link,
    Move,
    All,
    #[default]
    Uninitialized,
}

/// Current drop effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DropEffect {
    #[default]
    None,
    Copy,
    Link,
    Move,
}

/// Data transfer object
#[derive(Debug, Clone, Default)]
pub struct DataTransfer {
    /// Data by MIME type
    data: HashMap<String, String>,
    /// Detached element rendered under the pointer, with its offset
    drag_image: Option<(NodeId, f64, f64)>,
    /// Allowed effect
    pub effect_allowed: DragEffectAllowed,
    /// Drop effect
    pub drop_effect: DropEffect,
}

impl DataTransfer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set data for a type
    pub fn set_data(&mut self, format: &str, data: &str) {
        self.data.insert(format.to_string(), data.to_string());
    }

    /// Get data for a type
    pub fn get_data(&self, format: &str) -> String {
        self.data.get(format).cloned().unwrap_or_default()
    }

    /// Clear all data
    pub fn clear_data(&mut self) {
        self.data.clear();
    }

    /// Get available types
    pub fn types(&self) -> Vec<&str> {
        self.data.keys().map(|s| s.as_str()).collect()
    }

    pub fn set_drag_image(&mut self, image: NodeId, x: f64, y: f64) {
        self.drag_image = Some((image, x, y));
    }

    pub fn drag_image(&self) -> Option<(NodeId, f64, f64)> {
        self.drag_image
    }
}

/// Drag event types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DragEventType {
    DragStart,
    DragEnter,
    DragOver,
    DragLeave,
    Drop,
    DragEnd,
}

impl DragEventType {
    /// DOM event name
    pub fn as_str(&self) -> &'static str {
        match self {
            DragEventType::DragStart => "dragstart",
            DragEventType::DragEnter => "dragenter",
            DragEventType::DragOver => "dragover",
            DragEventType::DragLeave => "dragleave",
            DragEventType::Drop => "drop",
            DragEventType::DragEnd => "dragend",
        }
    }
}

/// Drag event
#[derive(Debug, Clone)]
pub struct DragEvent {
    pub event_type: DragEventType,
    /// Innermost element under the pointer
    pub target: NodeId,
    /// Element the pointer came from (enter) or is moving to (leave)
    pub related_target: Option<NodeId>,
    pub client_x: f64,
    pub client_y: f64,
    pub data_transfer: DataTransfer,
    default_prevented: bool,
}

impl DragEvent {
    pub fn new(event_type: DragEventType, target: NodeId) -> Self {
        Self {
            event_type,
            target,
            related_target: None,
            client_x: 0.0,
            client_y: 0.0,
            data_transfer: DataTransfer::new(),
            default_prevented: false,
        }
    }

    /// Pointer position
    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.client_x = x;
        self.client_y = y;
        self
    }

    pub fn with_related_target(mut self, related: NodeId) -> Self {
        self.related_target = Some(related);
        self
    }

    pub fn with_data_transfer(mut self, data_transfer: DataTransfer) -> Self {
        self.data_transfer = data_transfer;
        self
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}
