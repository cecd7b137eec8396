use super::{DynamicPublisher, PayloadPublisher, SubjectKeyResolver};
use crate::libraries::EmptyResult;
use serde_json::Value;

/// Entry point for sending payloads towards websocket connections
///
/// Bundles the transport with the subject key resolver so that application
/// code addresses users and subjects instead of transport-level routing keys.
pub struct WebsocketPublisher {
    transport: DynamicPublisher,
    subjects: SubjectKeyResolver,
}

impl WebsocketPublisher {
    pub fn new(transport: DynamicPublisher, subjects: SubjectKeyResolver) -> Self {
        Self {
            transport,
            subjects,
        }
    }

    pub fn subject_keys(&self) -> &SubjectKeyResolver {
        &self.subjects
    }

    /// Sends the payload verbatim to the given target keys
    ///
    /// An empty target set is a successful no-op, nothing reaches the
    /// transport.
    pub async fn send(&self, targets: &[String], payload: &Value) -> EmptyResult {
        if targets.is_empty() {
            return Ok(());
        }

        self.transport.publish(targets, payload).await
    }
}
