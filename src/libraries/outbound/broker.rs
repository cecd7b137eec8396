use super::PayloadPublisher;
use crate::libraries::tracing::TokenPropagator;
use crate::libraries::{BoxedError, EmptyResult};
use async_trait::async_trait;
use lapin::options::{BasicPublishOptions, ExchangeDeclareOptions};
use lapin::types::{AMQPValue, FieldTable, ShortString};
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties, ExchangeKind};
use opentelemetry::Context;
use serde_json::Value;

/// [`PayloadPublisher`] routing payloads through an AMQP topic exchange
///
/// Each target key becomes the routing key of one message, so a payload
/// addressed at multiple targets is published once per target. Broker
/// confirmation is awaited per message.
pub struct BrokerPublisher {
    // Held so the channel outlives its connection.
    _connection: Connection,
    channel: Channel,
    exchange: String,
    trace_field: String,
}

impl BrokerPublisher {
    pub async fn connect(
        url: &str,
        exchange: String,
        trace_field: String,
    ) -> Result<Self, BoxedError> {
        let connection = Connection::connect(url, ConnectionProperties::default()).await?;
        let channel = connection.create_channel().await?;

        channel
            .exchange_declare(
                &exchange,
                ExchangeKind::Topic,
                ExchangeDeclareOptions {
                    durable: true,
                    ..ExchangeDeclareOptions::default()
                },
                FieldTable::default(),
            )
            .await?;

        Ok(Self {
            _connection: connection,
            channel,
            exchange,
            trace_field,
        })
    }

    fn properties(&self) -> BasicProperties {
        let mut headers = FieldTable::default();

        if let Some(token) = TokenPropagator::serialize(&Context::current(), &self.trace_field) {
            headers.insert(
                ShortString::from(self.trace_field.clone()),
                AMQPValue::LongString(token.into()),
            );
        }

        BasicProperties::default()
            .with_content_type(ShortString::from("application/json"))
            .with_headers(headers)
    }
}

#[async_trait]
impl PayloadPublisher for BrokerPublisher {
    async fn publish(&self, targets: &[String], payload: &Value) -> EmptyResult {
        let body = serde_json::to_vec(payload)?;

        for target in targets {
            self.channel
                .basic_publish(
                    &self.exchange,
                    target,
                    BasicPublishOptions::default(),
                    &body,
                    self.properties(),
                )
                .await?
                .await?;
        }

        Ok(())
    }
}
