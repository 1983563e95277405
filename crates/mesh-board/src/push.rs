//! Push stream client
//!
//! Keeps the board in sync with the server: every stream event is decoded
//! as an out-of-band payload and applied to the board.

use crate::oob::{OobPayload, UpdateReport};
use crate::{Board, BoardConfig, BoardResult};
use mesh_net::{Connector, ConnectionState, EventSource, HttpConnector, SseEvent};
use std::time::Instant;

/// Reconnecting OOB update stream
pub struct PushStreamClient<C: Connector> {
    source: EventSource<C>,
}

impl PushStreamClient<HttpConnector> {
    /// Connect over HTTP to the configured stream
    pub fn http(config: &BoardConfig) -> BoardResult<Self> {
        Self::connect(config, HttpConnector::new()?)
    }
}

impl<C: Connector> PushStreamClient<C> {
    /// Open the stream immediately
    pub fn connect(config: &BoardConfig, connector: C) -> BoardResult<Self> {
        let url = config.stream_url()?;
        tracing::info!("Opening push stream {}", url);
        Ok(Self {
            source: EventSource::new(url.as_str(), connector, config.reconnect_delay),
        })
    }

    pub fn state(&self) -> ConnectionState {
        self.source.state()
    }

    pub fn source(&self) -> &EventSource<C> {
        &self.source
    }

    pub fn on_open(&mut self) {
        self.source.on_open();
    }

    pub fn on_error(&mut self, now: Instant) {
        self.source.on_error(now);
    }

    pub fn poll_reconnect(&mut self, now: Instant) -> bool {
        self.source.poll_reconnect(now)
    }

    /// Stop permanently
    pub fn close(&mut self) {
        tracing::info!("Closing push stream {}", self.source.url());
        self.source.close();
    }

    /// Decode and apply one stream event
    pub fn handle_event(&self, board: &mut Board, event: &SseEvent) -> UpdateReport {
        let payload = OobPayload::decode(event);
        board.apply_payload(&payload)
    }

    /// Wait for and apply the next event. `None` once closed.
    pub async fn next_update(&mut self, board: &mut Board) -> Option<UpdateReport> {
        let event = self.source.next_event().await?;
        Some(self.handle_event(board, &event))
    }

    /// Apply updates until the stream is closed
    pub async fn run(&mut self, board: &mut Board) {
        while let Some(report) = self.next_update(board).await {
            if !report.is_empty() {
                tracing::info!(
                    "Applied {} update(s), {} missing, {} malformed",
                    report.applied.len(),
                    report.missing.len(),
                    report.malformed
                );
            }
        }
    }
}
