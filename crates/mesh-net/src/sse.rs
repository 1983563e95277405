//! Server-Sent Events (SSE)
//!
//! Line-oriented `text/event-stream` parsing. The parser is fed raw chunks
//! as they arrive and yields completed events.

/// SSE message event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    pub event_type: String,
    pub data: String,
    pub last_event_id: String,
}

impl Default for SseEvent {
    fn default() -> Self {
        Self {
            event_type: "message".to_string(),
            data: String::new(),
            last_event_id: String::new(),
        }
    }
}

impl SseEvent {
    /// Event with the given name and payload
    pub fn named(event_type: &str, data: &str) -> Self {
        Self {
            event_type: event_type.to_string(),
            data: data.to_string(),
            ..Default::default()
        }
    }

    /// Unnamed (`message`) event
    pub fn message(data: &str) -> Self {
        Self::named("message", data)
    }
}

/// Incremental `text/event-stream` parser
#[derive(Debug, Default)]
pub struct SseParser {
    current: SseEvent,
    has_data: bool,
    last_event_id: String,
    retry_ms: Option<u64>,
    buffer: String,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconnection time requested by the server, if any
    pub fn retry_ms(&self) -> Option<u64> {
        self.retry_ms
    }

    /// Feed a raw chunk; partial trailing lines are buffered
    pub fn feed(&mut self, chunk: &str) -> Vec<SseEvent> {
        self.buffer.push_str(chunk);
        let mut events = Vec::new();
        while let Some(pos) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=pos).collect();
            let line = line.trim_end_matches('\n');
            if let Some(event) = self.feed_line(line) {
                events.push(event);
            }
        }
        events
    }

    /// Feed one complete line (without its terminator)
    pub fn feed_line(&mut self, line: &str) -> Option<SseEvent> {
        let line = line.trim_end_matches('\r');

        if line.is_empty() {
            return self.dispatch();
        }

        if line.starts_with(':') {
            // Comment / keep-alive
            return None;
        }

        let (field, value) = match line.find(':') {
            Some(colon) => {
                let value = &line[colon + 1..];
                (&line[..colon], value.strip_prefix(' ').unwrap_or(value))
            }
            None => (line, ""),
        };

        match field {
            "event" => self.current.event_type = value.to_string(),
            "data" => {
                if self.has_data {
                    self.current.data.push('\n');
                }
                self.current.data.push_str(value);
                self.has_data = true;
            }
            "id" => {
                if !value.contains('\0') {
                    self.last_event_id = value.to_string();
                }
            }
            "retry" => {
                if let Ok(ms) = value.parse() {
                    self.retry_ms = Some(ms);
                }
            }
            _ => {}
        }

        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let mut event = std::mem::take(&mut self.current);
        let has_data = std::mem::replace(&mut self.has_data, false);
        if !has_data {
            return None;
        }
        if event.event_type.is_empty() {
            event.event_type = "message".to_string();
        }
        event.last_event_id = self.last_event_id.clone();
        Some(event)
    }
}
