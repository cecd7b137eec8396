use super::PayloadPublisher;
use crate::libraries::tracing::TokenPropagator;
use crate::libraries::{BoxedError, EmptyResult};
use async_trait::async_trait;
use opentelemetry::Context;
use redis::aio::MultiplexedConnection;
use redis::streams::StreamMaxlen;
use redis::AsyncCommands;
use serde_json::{json, Value};

/// [`PayloadPublisher`] appending payloads to a shared downstream stream
///
/// Used by core instances to fan payloads out to the relay tier. The stream is
/// capped to a rolling window so that a stalled relay never grows it without
/// bound.
pub struct StreamPublisher {
    connection: MultiplexedConnection,
    stream: String,
    limit: usize,
    trace_field: String,
}

impl StreamPublisher {
    pub async fn connect(
        client: &redis::Client,
        stream: String,
        limit: usize,
        trace_field: String,
    ) -> Result<Self, BoxedError> {
        Ok(Self {
            connection: client.get_multiplexed_tokio_connection().await?,
            stream,
            limit,
            trace_field,
        })
    }
}

#[async_trait]
impl PayloadPublisher for StreamPublisher {
    async fn publish(&self, targets: &[String], payload: &Value) -> EmptyResult {
        let mut envelope = json!({
            "targets": targets,
            "payload": payload,
        });

        if let Some(token) = TokenPropagator::serialize(&Context::current(), &self.trace_field) {
            envelope[&self.trace_field] = Value::String(token);
        }

        let serialized = envelope.to_string();
        let mut connection = self.connection.clone();

        connection
            .xadd_maxlen::<_, _, _, _, ()>(
                &self.stream,
                StreamMaxlen::Approx(self.limit),
                "*",
                &[("data", serialized.as_bytes())],
            )
            .await?;

        Ok(())
    }
}
