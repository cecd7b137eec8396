use crate::libraries::inbox::{EventHandler, WebsocketEvent};
use crate::libraries::outbound::WebsocketPublisher;
use crate::libraries::EmptyResult;
use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info};
use serde_json::{json, Value};
use std::sync::Arc;

/// Logs the lifecycle of every connection
pub struct ConnectionLogHandler;

#[async_trait]
impl EventHandler for ConnectionLogHandler {
    async fn handle(&self, event: &WebsocketEvent) -> EmptyResult {
        match event {
            WebsocketEvent::ConnectionEstablished(connection) => info!(
                "Connection {} established for {} ({} subjects)",
                connection.connection_id,
                connection.user_id,
                connection.subjects.len()
            ),
            WebsocketEvent::ConnectionClosed(connection) => info!(
                "Connection {} closed for {}",
                connection.connection_id, connection.user_id
            ),
            WebsocketEvent::MessageReceived { connection, .. } => debug!(
                "Message received on connection {}",
                connection.connection_id
            ),
        }

        Ok(())
    }
}

/// Relays well-formed chat messages back out to the sender's audience
///
/// A chat message is a decoded payload with type `chat` and a non-empty text
/// after trimming. Everything else passes through silently, flooding the
/// stream with garbage must not take the consumer down.
pub struct ChatRelayHandler {
    publisher: Arc<WebsocketPublisher>,
}

impl ChatRelayHandler {
    pub fn new(publisher: Arc<WebsocketPublisher>) -> Self {
        Self { publisher }
    }

    fn chat_text(message: &Value) -> Option<&str> {
        if message.get("type").and_then(Value::as_str) != Some("chat") {
            return None;
        }

        let text = message.get("text").and_then(Value::as_str)?.trim();

        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[async_trait]
impl EventHandler for ChatRelayHandler {
    async fn handle(&self, event: &WebsocketEvent) -> EmptyResult {
        let (connection, message) = match event {
            WebsocketEvent::MessageReceived {
                connection,
                message: Some(message),
                ..
            } => (connection, message),
            _ => return Ok(()),
        };

        let text = match Self::chat_text(message) {
            Some(text) => text,
            None => return Ok(()),
        };

        let payload = json!({
            "type": "chat",
            "user": format!("user:{}", connection.user_id),
            "text": text,
            "ts": Utc::now().timestamp(),
        });

        let targets: Vec<String> = self
            .publisher
            .subject_keys()
            .resolve(&connection.subjects, &connection.user_id)
            .into_iter()
            .collect();

        self.publisher.send(&targets, &payload).await
    }
}
