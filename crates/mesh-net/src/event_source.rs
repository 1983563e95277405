//! EventSource
//!
//! Reconnecting server-sent event stream. The lifecycle is a small state
//! machine driven by explicit instants, so reconnect timing can be stepped
//! without a runtime. [`EventSource::next_event`] drives it on smol timers.

use crate::{NetError, SseEvent};
use std::future::Future;
use std::time::{Duration, Instant};

/// Connection lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// Something an open stream reports
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamSignal {
    Open,
    Event(SseEvent),
    Error(NetError),
}

/// Opens stream connections
pub trait Connector {
    type Connection: Connection;

    fn open(&mut self, url: &str) -> Result<Self::Connection, NetError>;
}

/// A single live stream connection
pub trait Connection {
    /// Stop delivering signals and release the transport
    fn close(&mut self);

    /// Next signal, or `None` once the transport has ended
    fn next_signal(&mut self) -> impl Future<Output = Option<StreamSignal>> + '_;
}

/// Reconnecting event source
pub struct EventSource<C: Connector> {
    url: String,
    connector: C,
    connection: Option<C::Connection>,
    state: ConnectionState,
    reconnect_delay: Duration,
    reconnect_at: Option<Instant>,
    closed: bool,
    attempts: u64,
}

impl<C: Connector> EventSource<C> {
    /// Create an event source and open the first connection
    pub fn new(url: &str, connector: C, reconnect_delay: Duration) -> Self {
        let mut source = Self {
            url: url.to_string(),
            connector,
            connection: None,
            state: ConnectionState::Disconnected,
            reconnect_delay,
            reconnect_at: None,
            closed: false,
            attempts: 0,
        };
        source.connect(Instant::now());
        source
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Number of connection attempts made so far
    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    /// When the pending reconnect fires
    pub fn reconnect_at(&self) -> Option<Instant> {
        self.reconnect_at
    }

    pub fn reconnect_delay(&self) -> Duration {
        self.reconnect_delay
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    fn connect(&mut self, now: Instant) {
        if let Some(mut old) = self.connection.take() {
            old.close();
        }
        self.reconnect_at = None;
        self.attempts += 1;
        self.state = ConnectionState::Connecting;
        tracing::debug!("Connecting to {} (attempt {})", self.url, self.attempts);

        match self.connector.open(&self.url) {
            Ok(connection) => self.connection = Some(connection),
            Err(e) => {
                tracing::warn!("Failed to open {}: {}", self.url, e);
                self.on_error(now);
            }
        }
    }

    /// The transport reported it is open
    pub fn on_open(&mut self) {
        if self.closed {
            return;
        }
        if self.state != ConnectionState::Connected {
            tracing::info!("Connected to {}", self.url);
        }
        self.state = ConnectionState::Connected;
    }

    /// The transport failed. Drops the connection and schedules one reconnect.
    pub fn on_error(&mut self, now: Instant) {
        if self.closed {
            return;
        }
        if let Some(mut connection) = self.connection.take() {
            connection.close();
        }
        self.state = ConnectionState::Disconnected;
        if self.reconnect_at.is_none() {
            tracing::info!(
                "Disconnected from {}, reconnecting in {:?}",
                self.url,
                self.reconnect_delay
            );
            self.reconnect_at = Some(now + self.reconnect_delay);
        }
    }

    /// Reconnect if the pending timer has elapsed. Returns true when a new
    /// connection attempt was made.
    pub fn poll_reconnect(&mut self, now: Instant) -> bool {
        if self.closed {
            return false;
        }
        match self.reconnect_at {
            Some(at) if now >= at => {
                self.connect(now);
                true
            }
            _ => false,
        }
    }

    /// Close permanently; pending reconnects are cancelled
    pub fn close(&mut self) {
        if let Some(mut connection) = self.connection.take() {
            connection.close();
        }
        self.closed = true;
        self.reconnect_at = None;
        self.state = ConnectionState::Disconnected;
    }

    /// Wait for the next event, handling open/error/reconnect along the way.
    /// Returns `None` once closed.
    pub async fn next_event(&mut self) -> Option<SseEvent> {
        loop {
            if self.closed {
                return None;
            }

            if let Some(at) = self.reconnect_at {
                smol::Timer::at(at).await;
                self.poll_reconnect(Instant::now());
                continue;
            }

            let signal = match self.connection.as_mut() {
                Some(connection) => connection.next_signal().await,
                None => {
                    self.on_error(Instant::now());
                    continue;
                }
            };

            match signal {
                Some(StreamSignal::Open) => self.on_open(),
                Some(StreamSignal::Event(event)) => {
                    self.on_open();
                    return Some(event);
                }
                Some(StreamSignal::Error(e)) => {
                    tracing::warn!("Stream error on {}: {}", self.url, e);
                    self.on_error(Instant::now());
                }
                None => self.on_error(Instant::now()),
            }
        }
    }
}

impl<C: Connector> Drop for EventSource<C> {
    fn drop(&mut self) {
        if let Some(mut connection) = self.connection.take() {
            connection.close();
        }
    }
}
