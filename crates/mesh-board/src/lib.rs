//! mesh Board
//!
//! The client core of the shadow-DOM kanban board: custom-element components,
//! the swap-target correction hook, out-of-band patching from the push stream
//! and the drag-and-drop reorder protocol.

pub mod board;
pub mod component;
pub mod config;
pub mod drag;
pub mod events;
pub mod indicator;
pub mod mover;
pub mod oob;
pub mod push;
pub mod swap;

pub use board::Board;
pub use component::{Capabilities, ComponentRegistry, DragHandler, HostLibrary, NoopHost};
pub use config::BoardConfig;
pub use drag::{DragReorderController, DropPosition, DropScan, MoveCommand, MoveEnvelope};
pub use events::{DataTransfer, DragEffectAllowed, DragEvent, DragEventType, DropEffect};
pub use indicator::DropIndicatorController;
pub use mover::MoveDispatcher;
pub use oob::{OobApplier, OobBatch, OobPayload, UpdateReport};
pub use push::PushStreamClient;
pub use swap::{SwapDecision, SwapInterceptor, SwapStyle};

use mesh_dom::{DomError, NodeId};

/// Board operation errors
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error("DOM error: {0}")]
    Dom(#[from] DomError),

    #[error("parse error: {0}")]
    Parse(#[from] mesh_html::ParseError),

    #[error("network error: {0}")]
    Net(#[from] mesh_net::NetError),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("element {0} has no id")]
    MissingId(NodeId),

    #[error("drop carried no item id")]
    MissingPayload,
}

/// Result type for board operations
pub type BoardResult<T> = Result<T, BoardError>;
