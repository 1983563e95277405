//! Geometry APIs
//!
//! DOMRect and the bounding-box source used by drag position computation.

use crate::NodeId;
use std::collections::HashMap;

/// DOMRect - rectangle geometry
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DOMRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl DOMRect {
    /// Create with dimensions
    pub fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Top edge (same as y)
    pub fn top(&self) -> f64 {
        self.y
    }

    /// Bottom edge
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Right edge
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Vertical midpoint
    pub fn mid_y(&self) -> f64 {
        self.top() + self.height / 2.0
    }

    /// Check if point is inside
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.x && x <= self.right() && y >= self.y && y <= self.bottom()
    }
}

/// Source of element bounding boxes (getBoundingClientRect)
pub trait ElementGeometry {
    /// Bounding client rect of `node`, if it is laid out
    fn bounding_client_rect(&self, node: NodeId) -> Option<DOMRect>;
}

/// Fixed rect table, used when layout is computed elsewhere
pub type RectMap = HashMap<NodeId, DOMRect>;

impl ElementGeometry for RectMap {
    fn bounding_client_rect(&self, node: NodeId) -> Option<DOMRect> {
        self.get(&node).copied()
    }
}
