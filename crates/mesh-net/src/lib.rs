//! mesh Networking
//!
//! Server-sent event parsing, the reconnecting event-source state machine,
//! and fire-and-forget HTTP requests.

pub mod event_source;
pub mod loader;
pub mod sse;
mod stream;

pub use event_source::{Connection, ConnectionState, Connector, EventSource, StreamSignal};
pub use loader::{Method, Request, ResourceLoader};
pub use sse::{SseEvent, SseParser};
pub use stream::{DEFAULT_IDLE_TIMEOUT, HttpConnector, HttpEventStream};
pub use url::Url;

/// HTTP Response
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Response {
    /// Check if response is OK (2xx)
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Network error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NetError {
    #[error("HTTP error: {status}")]
    HttpError { status: u16 },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Stream closed by server")]
    StreamClosed,
}

impl From<reqwest::Error> for NetError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => NetError::HttpError {
                status: status.as_u16(),
            },
            None => NetError::Network(e.to_string()),
        }
    }
}

impl From<url::ParseError> for NetError {
    fn from(e: url::ParseError) -> Self {
        NetError::InvalidUrl(e.to_string())
    }
}
