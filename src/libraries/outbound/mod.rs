//! Outbound delivery of websocket payloads
//!
//! Application code hands a payload and a set of opaque target keys to the
//! [`WebsocketPublisher`]; where those end up depends on the deployment mode
//! and the selected transport, resolved once at startup into a
//! [`DynamicPublisher`].

mod broker;
mod dynamic;
mod http;
mod publisher;
mod stream;
mod subject;
mod websocket;

pub use broker::BrokerPublisher;
pub use dynamic::{DeploymentMode, DynamicPublisher, ModeParseError, TransportKind, TransportParseError};
pub use http::{HttpPublishError, HttpPublisher};
pub use publisher::PayloadPublisher;
pub use stream::StreamPublisher;
pub use subject::{SubjectKeyConfig, SubjectKeyError, SubjectKeyResolver};
pub use websocket::WebsocketPublisher;

#[cfg(test)]
pub(crate) mod testing {
    use super::PayloadPublisher;
    use crate::libraries::EmptyResult;
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::{Arc, Mutex};

    /// Publisher double capturing every call for later assertions
    #[derive(Clone, Default)]
    pub struct RecordingPublisher {
        pub calls: Arc<Mutex<Vec<(Vec<String>, Value)>>>,
    }

    #[async_trait]
    impl PayloadPublisher for RecordingPublisher {
        async fn publish(&self, targets: &[String], payload: &Value) -> EmptyResult {
            self.calls
                .lock()
                .unwrap()
                .push((targets.to_vec(), payload.clone()));
            Ok(())
        }
    }

    /// Publisher double that rejects every call
    pub struct FailingPublisher;

    #[async_trait]
    impl PayloadPublisher for FailingPublisher {
        async fn publish(&self, _targets: &[String], _payload: &Value) -> EmptyResult {
            Err("scripted publish failure".into())
        }
    }
}
