//! HTTP event-stream transport
//!
//! Each connection reads the response body on smol's blocking pool and
//! forwards parsed signals over a channel. Every read is bounded by an idle
//! timeout, so a closed connection's reader wakes up, sees the cancellation
//! and drops the response.

use crate::event_source::{Connection, Connector, StreamSignal};
use crate::{NetError, SseParser};
use std::future::Future;
use std::io::{BufRead, BufReader};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Longest silence tolerated on an open stream
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Opens `text/event-stream` connections with reqwest
#[derive(Debug, Clone)]
pub struct HttpConnector {
    client: reqwest::blocking::Client,
    idle_timeout: Duration,
}

impl HttpConnector {
    pub fn new() -> Result<Self, NetError> {
        Self::with_idle_timeout(DEFAULT_IDLE_TIMEOUT)
    }

    /// A stream that stays silent for `idle_timeout` fails with a network
    /// error, which lets the event source reconnect
    pub fn with_idle_timeout(idle_timeout: Duration) -> Result<Self, NetError> {
        // The blocking client applies this to each read, not to the whole body
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("mesh/", env!("CARGO_PKG_VERSION")))
            .timeout(idle_timeout)
            .build()?;
        Ok(Self {
            client,
            idle_timeout,
        })
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }
}

impl Connector for HttpConnector {
    type Connection = HttpEventStream;

    fn open(&mut self, url: &str) -> Result<HttpEventStream, NetError> {
        let url = url::Url::parse(url)?;
        let (tx, rx) = smol::channel::unbounded();
        let cancelled = Arc::new(AtomicBool::new(false));

        let client = self.client.clone();
        let flag = cancelled.clone();
        let task = smol::unblock(move || read_stream(&client, url, &tx, &flag));

        Ok(HttpEventStream {
            signals: rx,
            cancelled,
            task: Some(task),
        })
    }
}

/// One live event-stream connection
#[derive(Debug)]
pub struct HttpEventStream {
    signals: smol::channel::Receiver<StreamSignal>,
    cancelled: Arc<AtomicBool>,
    task: Option<smol::Task<()>>,
}

impl Connection for HttpEventStream {
    fn close(&mut self) {
        self.cancelled.store(true, Ordering::Relaxed);
        self.signals.close();
        if let Some(task) = self.task.take() {
            task.detach();
        }
    }

    fn next_signal(&mut self) -> impl Future<Output = Option<StreamSignal>> + '_ {
        async move { self.signals.recv().await.ok() }
    }
}

fn read_stream(
    client: &reqwest::blocking::Client,
    url: url::Url,
    tx: &smol::channel::Sender<StreamSignal>,
    cancelled: &AtomicBool,
) {
    let response = client
        .get(url)
        .header("Accept", "text/event-stream")
        .header("Cache-Control", "no-cache")
        .send();

    let response = match response {
        Ok(r) if r.status().is_success() => r,
        Ok(r) => {
            let status = r.status().as_u16();
            let _ = tx.send_blocking(StreamSignal::Error(NetError::HttpError { status }));
            return;
        }
        Err(e) => {
            let _ = tx.send_blocking(StreamSignal::Error(e.into()));
            return;
        }
    };

    if tx.send_blocking(StreamSignal::Open).is_err() {
        return;
    }

    let mut parser = SseParser::new();
    for line in BufReader::new(response).lines() {
        if cancelled.load(Ordering::Relaxed) {
            tracing::debug!("Event stream closed by the client");
            return;
        }
        match line {
            Ok(line) => {
                if let Some(event) = parser.feed_line(&line) {
                    if tx.send_blocking(StreamSignal::Event(event)).is_err() {
                        return;
                    }
                }
            }
            Err(e) => {
                tracing::warn!("Event stream read failed: {}", e);
                let _ = tx.send_blocking(StreamSignal::Error(NetError::Network(e.to_string())));
                return;
            }
        }
    }

    if !cancelled.load(Ordering::Relaxed) {
        let _ = tx.send_blocking(StreamSignal::Error(NetError::StreamClosed));
    }
}
