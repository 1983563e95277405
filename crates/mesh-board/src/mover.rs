//! Move command transport
//!
//! Moves are sent without waiting: the response body is ignored and the
//! server's pushed update carries the new order. Failures are logged only.

use crate::drag::MoveCommand;
use crate::{BoardConfig, BoardResult};
use mesh_net::{Request, ResourceLoader};

/// Sends move commands to the board server
#[derive(Debug, Clone)]
pub struct MoveDispatcher {
    loader: ResourceLoader,
    url: String,
}

impl MoveDispatcher {
    pub fn new(config: &BoardConfig) -> BoardResult<Self> {
        Ok(Self {
            loader: ResourceLoader::new()?,
            url: config.move_url()?.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// HTTP request for `command`
    pub fn request(&self, command: &MoveCommand) -> BoardResult<Request> {
        Ok(Request::put(&self.url).with_json(&command.envelope())?)
    }

    /// Send `command` in the background
    pub fn send(&self, command: MoveCommand) {
        let request = match self.request(&command) {
            Ok(request) => request,
            Err(e) => {
                tracing::error!("Could not encode move of {}: {}", command.item_id, e);
                return;
            }
        };
        let loader = self.loader.clone();
        smol::spawn(async move {
            match loader.request(request).await {
                Ok(_) => tracing::debug!("Move of {} accepted", command.item_id),
                Err(e) => tracing::error!("Move of {} failed: {}", command.item_id, e),
            }
        })
        .detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drag::DropPosition;
    use mesh_net::Method;

    #[test]
    fn test_move_request() {
        let config = BoardConfig::default().with_base_url("http://localhost:8080/");
        let dispatcher = MoveDispatcher::new(&config).unwrap();
        let request = dispatcher
            .request(&MoveCommand {
                item_id: "Z".to_string(),
                container_id: "A".to_string(),
                position: DropPosition::Index(1),
            })
            .unwrap();

        assert_eq!(request.method, Method::Put);
        assert_eq!(request.url, "http://localhost:8080/card");
        assert_eq!(
            request.headers.get("Content-Type").map(String::as_str),
            Some("application/json")
        );
        let body: serde_json::Value = serde_json::from_slice(&request.body.unwrap()).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"values": {"action": "move", "itemID": "Z", "containerID": "A", "position": 1}})
        );
    }
}
