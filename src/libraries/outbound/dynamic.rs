use super::PayloadPublisher;
use crate::libraries::EmptyResult;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Role this instance plays in the overall deployment
///
/// A terminator runs next to an application that consumes payloads over HTTP,
/// a core instance feeds downstream relays through a shared stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentMode {
    Terminator,
    Core,
}

#[derive(Debug, Error)]
#[error("'{0}' is not a deployment mode (expected terminator or core)")]
pub struct ModeParseError(String);

impl FromStr for DeploymentMode {
    type Err = ModeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "terminator" => Ok(DeploymentMode::Terminator),
            "core" => Ok(DeploymentMode::Core),
            other => Err(ModeParseError(other.to_string())),
        }
    }
}

/// Concrete transport carrying outbound payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Http,
    RedisStream,
    RabbitMq,
}

impl TransportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportKind::Http => "http",
            TransportKind::RedisStream => "redis_stream",
            TransportKind::RabbitMq => "rabbitmq",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("'{0}' is not a transport (expected http, redis_stream or rabbitmq)")]
pub struct TransportParseError(String);

impl FromStr for TransportKind {
    type Err = TransportParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "http" | "webhook" => Ok(TransportKind::Http),
            "redis_stream" | "stream" => Ok(TransportKind::RedisStream),
            "rabbitmq" | "amqp" => Ok(TransportKind::RabbitMq),
            other => Err(TransportParseError(other.to_string())),
        }
    }
}

/// Transport selected once at startup, fixed for the process lifetime
///
/// There is deliberately no fallback chain: a payload goes through exactly one
/// transport and a delivery failure surfaces to the caller instead of being
/// silently rerouted.
pub struct DynamicPublisher {
    kind: TransportKind,
    transport: Box<dyn PayloadPublisher + Send + Sync>,
}

impl DynamicPublisher {
    /// Picks the transport kind from the deployment mode and an optional override
    pub fn select_kind(mode: DeploymentMode, configured: Option<TransportKind>) -> TransportKind {
        match configured {
            Some(kind) => kind,
            None => match mode {
                DeploymentMode::Terminator => TransportKind::Http,
                DeploymentMode::Core => TransportKind::RedisStream,
            },
        }
    }

    pub fn new(kind: TransportKind, transport: Box<dyn PayloadPublisher + Send + Sync>) -> Self {
        Self { kind, transport }
    }

    pub fn kind(&self) -> TransportKind {
        self.kind
    }
}

#[async_trait]
impl PayloadPublisher for DynamicPublisher {
    async fn publish(&self, targets: &[String], payload: &Value) -> EmptyResult {
        self.transport.publish(targets, payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{FailingPublisher, RecordingPublisher};
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn terminators_default_to_http() {
        assert_eq!(
            DynamicPublisher::select_kind(DeploymentMode::Terminator, None),
            TransportKind::Http
        );
    }

    #[test]
    fn core_instances_default_to_the_stream() {
        assert_eq!(
            DynamicPublisher::select_kind(DeploymentMode::Core, None),
            TransportKind::RedisStream
        );
    }

    #[test]
    fn explicit_transport_wins_over_the_mode_default() {
        assert_eq!(
            DynamicPublisher::select_kind(DeploymentMode::Core, Some(TransportKind::RabbitMq)),
            TransportKind::RabbitMq
        );
    }

    #[test]
    fn parses_transport_aliases() {
        assert_eq!("webhook".parse::<TransportKind>().unwrap(), TransportKind::Http);
        assert_eq!("stream".parse::<TransportKind>().unwrap(), TransportKind::RedisStream);
        assert_eq!("amqp".parse::<TransportKind>().unwrap(), TransportKind::RabbitMq);
        assert!("carrier-pigeon".parse::<TransportKind>().is_err());
    }

    #[test]
    fn parses_deployment_modes() {
        assert_eq!("terminator".parse::<DeploymentMode>().unwrap(), DeploymentMode::Terminator);
        assert_eq!("core".parse::<DeploymentMode>().unwrap(), DeploymentMode::Core);
        assert!("edge".parse::<DeploymentMode>().is_err());
    }

    #[tokio::test]
    async fn delegates_to_the_selected_transport_exactly_once() {
        let recorder = RecordingPublisher::default();
        let publisher =
            DynamicPublisher::new(TransportKind::Http, Box::new(recorder.clone()));

        let targets = vec!["user:u1".to_string()];
        publisher.publish(&targets, &json!({"hello": "world"})).await.unwrap();

        let calls = recorder.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, targets);
        assert_eq!(calls[0].1, json!({"hello": "world"}));
    }

    #[tokio::test]
    async fn transport_failures_surface_to_the_caller() {
        let publisher =
            DynamicPublisher::new(TransportKind::Http, Box::new(FailingPublisher));

        let result = publisher.publish(&["user:u1".to_string()], &json!({})).await;

        assert!(result.is_err());
    }
}
