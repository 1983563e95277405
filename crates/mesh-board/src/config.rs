//! Board configuration

use std::time::Duration;

/// Board client configuration
#[derive(Debug, Clone)]
pub struct BoardConfig {
    /// Server origin, e.g. `http://localhost:8080/`
    pub base_url: String,
    /// Push stream path, joined onto `base_url`
    pub stream_path: String,
    /// Move command path, joined onto `base_url`
    pub move_path: String,
    /// Fixed delay before reconnecting a failed stream
    pub reconnect_delay: Duration,
    /// Attribute flagging out-of-band elements in pushed fragments
    pub oob_attribute: String,
    /// Draggable item component
    pub item_selector: String,
    /// Drop target component
    pub container_selector: String,
    pub dragging_class: String,
    pub drag_over_class: String,
    pub indicator_class: String,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/".to_string(),
            stream_path: "/sse?stream=oob-updates".to_string(),
            move_path: "/card".to_string(),
            reconnect_delay: Duration::from_secs(5),
            oob_attribute: "mesh-swap-oob".to_string(),
            item_selector: "mesh-card".to_string(),
            container_selector: "mesh-column".to_string(),
            dragging_class: "dragging".to_string(),
            drag_over_class: "drag-over".to_string(),
            indicator_class: "drop-indicator".to_string(),
        }
    }
}

impl BoardConfig {
    /// Defaults, overridden by `MESH_BASE_URL` and `MESH_RECONNECT_SECS`
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(base) = std::env::var("MESH_BASE_URL") {
            config.base_url = base;
        }
        if let Some(secs) = std::env::var("MESH_RECONNECT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            config.reconnect_delay = Duration::from_secs(secs);
        }
        config
    }

    /// Set the server origin
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }

    /// Absolute push stream URL
    pub fn stream_url(&self) -> Result<url::Url, url::ParseError> {
        url::Url::parse(&self.base_url)?.join(&self.stream_path)
    }

    /// Absolute move command URL
    pub fn move_url(&self) -> Result<url::Url, url::ParseError> {
        url::Url::parse(&self.base_url)?.join(&self.move_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BoardConfig::default();
        assert_eq!(config.reconnect_delay, Duration::from_secs(5));
        assert_eq!(config.oob_attribute, "mesh-swap-oob");
    }

    #[test]
    fn test_urls_join_onto_origin() {
        let config = BoardConfig::default().with_base_url("http://board.local:9000/app/");
        assert_eq!(
            config.stream_url().unwrap().as_str(),
            "http://board.local:9000/sse?stream=oob-updates"
        );
        assert_eq!(config.move_url().unwrap().as_str(), "http://board.local:9000/card");
    }

    #[test]
    fn test_bad_base_url() {
        let config = BoardConfig::default().with_base_url("not a url");
        assert!(config.stream_url().is_err());
    }
}
