//! Inbox consumer service
//!
//! Tails the gateway event streams, decodes the entries into typed events and
//! dispatches them to the registered handlers. Outbound payloads produced by
//! the handlers leave through the transport matching the deployment mode.

use crate::libraries::helpers::{parse_seconds, split_into_two};
use crate::libraries::inbox::{
    ConsumerOptions, EventKind, HandlerRegistry, InboxConsumer, RedisStreamReader,
};
use crate::libraries::outbound::{
    BrokerPublisher, DeploymentMode, DynamicPublisher, HttpPublisher, PayloadPublisher,
    StreamPublisher, SubjectKeyConfig, SubjectKeyResolver, TransportKind, WebsocketPublisher,
};
use crate::libraries::tracing::{self, constants::service};
use crate::services::SharedOptions;
use anyhow::Context as AnyhowContext;
use hyper::Uri;
use log::{info, warn};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use structopt::StructOpt;
use tokio::sync::watch;

mod handlers;

use handlers::{ChatRelayHandler, ConnectionLogHandler};

#[derive(Debug, StructOpt, Clone)]
pub struct Options {
    /// Stream the gateways append inbound websocket events to
    #[structopt(long, env = "WS_REDIS_INBOX_STREAM", default_value = "ws.inbox")]
    inbox_stream: String,

    /// Stream carrying connection lifecycle events
    #[structopt(long, env = "WS_REDIS_EVENTS_STREAM", default_value = "ws.events")]
    events_stream: String,

    /// Transport the gateways publish lifecycle events through
    #[structopt(long, env = "WS_EVENTS_TYPE")]
    events_type: Option<TransportKind>,

    /// Deployment mode of this instance
    #[structopt(long, env = "WS_MODE", default_value = "terminator")]
    mode: DeploymentMode,

    /// Outbound transport, overrides the mode default
    #[structopt(long, env = "WS_TRANSPORT")]
    transport: Option<TransportKind>,

    /// Field name carrying the trace propagation token
    #[structopt(long, env = "WS_TRACE_FIELD", default_value = "traceparent")]
    trace_field: String,

    /// Endpoint outbound payloads are POSTed to when using the http transport
    #[structopt(long, env = "WS_HTTP_ENDPOINT", default_value = "http://localhost:8089/publish")]
    http_endpoint: Uri,

    /// Stream outbound payloads are appended to when using the stream transport
    #[structopt(long, env = "WS_OUTBOUND_STREAM", default_value = "ws.out")]
    outbound_stream: String,

    /// Approximate length cap of the outbound stream
    #[structopt(long, env = "WS_OUTBOUND_STREAM_LIMIT", default_value = "1000")]
    outbound_stream_limit: usize,

    /// AMQP broker url for the rabbitmq transport
    #[structopt(long, env = "AMQP_URL", default_value = "amqp://127.0.0.1:5672/%2f")]
    broker_url: String,

    /// Topic exchange outbound payloads are routed through
    #[structopt(long, env = "WS_BROKER_EXCHANGE", default_value = "ws.events")]
    broker_exchange: String,

    /// Template for the per-user routing key
    #[structopt(long, env = "WS_USER_KEY_TEMPLATE", default_value = "user:{user}")]
    user_key_template: String,

    /// Prefix for subject routing keys without an override
    #[structopt(long, env = "WS_SUBJECT_KEY_PREFIX", default_value = "subject:")]
    subject_key_prefix: String,

    /// Per-subject routing key override in the form subject=template
    #[structopt(long = "subject-key")]
    subject_keys: Vec<String>,

    /// Upper bound in seconds for one blocking stream read
    #[structopt(long, default_value = "5", parse(try_from_str = parse_seconds))]
    block: Duration,

    /// Maximum entries fetched per stream and read
    #[structopt(long, default_value = "10")]
    batch_size: usize,

    /// Pause in seconds after a failed read or batch
    #[structopt(long, default_value = "1", parse(try_from_str = parse_seconds))]
    backoff: Duration,
}

fn subject_key_config(options: &Options) -> SubjectKeyConfig {
    let mut overrides = HashMap::new();

    for raw in &options.subject_keys {
        match split_into_two(raw, "=") {
            Some((subject, template)) => {
                overrides.insert(subject, template);
            }
            None => warn!("Ignoring malformed subject key override '{}'", raw),
        }
    }

    SubjectKeyConfig {
        user_template: options.user_key_template.clone(),
        subject_prefix: options.subject_key_prefix.clone(),
        overrides,
    }
}

async fn build_transport(
    options: &Options,
    client: &redis::Client,
) -> anyhow::Result<DynamicPublisher> {
    let kind = DynamicPublisher::select_kind(options.mode, options.transport);

    let transport: Box<dyn PayloadPublisher + Send + Sync> = match kind {
        TransportKind::Http => Box::new(
            HttpPublisher::new(options.http_endpoint.clone(), &options.trace_field)
                .context("invalid trace field for the http transport")?,
        ),
        TransportKind::RedisStream => Box::new(
            StreamPublisher::connect(
                client,
                options.outbound_stream.clone(),
                options.outbound_stream_limit,
                options.trace_field.clone(),
            )
            .await
            .map_err(|e| anyhow::anyhow!("unable to connect the stream transport: {}", e))?,
        ),
        TransportKind::RabbitMq => Box::new(
            BrokerPublisher::connect(
                &options.broker_url,
                options.broker_exchange.clone(),
                options.trace_field.clone(),
            )
            .await
            .map_err(|e| anyhow::anyhow!("unable to connect the broker transport: {}", e))?,
        ),
    };

    let publisher = DynamicPublisher::new(kind, transport);
    info!("Outbound transport: {}", publisher.kind());

    Ok(publisher)
}

pub async fn run(shared_options: SharedOptions, options: Options) -> anyhow::Result<()> {
    tracing::init(&shared_options.trace_endpoint, service::CONSUMER, None)
        .context("unable to initialize tracing")?;

    let client = redis::Client::open(shared_options.redis.as_str())
        .context("unable to parse the redis url")?;

    let transport = build_transport(&options, &client).await?;
    let subjects = SubjectKeyResolver::new(subject_key_config(&options))
        .context("invalid subject key configuration")?;
    let publisher = Arc::new(WebsocketPublisher::new(transport, subjects));

    let mut registry = HandlerRegistry::new();
    let connection_log = Arc::new(ConnectionLogHandler);
    registry.register(EventKind::ConnectionEstablished, connection_log.clone());
    registry.register(EventKind::ConnectionClosed, connection_log.clone());
    registry.register(EventKind::MessageReceived, connection_log);
    registry.register(
        EventKind::MessageReceived,
        Arc::new(ChatRelayHandler::new(publisher)),
    );

    let consumer = InboxConsumer::new(
        RedisStreamReader::new(client),
        registry,
        ConsumerOptions {
            inbox_stream: options.inbox_stream,
            events_stream: options.events_stream,
            events_kind: options.events_type,
            trace_field: options.trace_field,
            block: options.block,
            batch_size: options.batch_size,
            backoff: options.backoff,
        },
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            shutdown_tx.send(true).ok();
        }
    });

    consumer.run(shutdown_rx).await?;

    Ok(())
}
