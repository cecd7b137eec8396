use super::{decode, resolve_cursors, HandlerRegistry, StreamBatch, StreamCursor, StreamReader};
use crate::libraries::outbound::TransportKind;
use crate::libraries::tracing::{constants::trace, ConsumeScope};
use crate::libraries::EmptyResult;
use log::{error, info};
use opentelemetry::trace::FutureExt;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::sleep;

/// Fatal startup errors of the [`InboxConsumer`]
#[derive(Debug, Error)]
pub enum ConsumerError {
    /// Neither an inbox nor an events stream survived configuration resolution
    #[error("no inbox streams could be resolved from the configuration")]
    NoResolvableStreams,
}

/// Runtime configuration of the [`InboxConsumer`]
#[derive(Debug, Clone)]
pub struct ConsumerOptions {
    /// Primary inbox stream written by the gateways
    pub inbox_stream: String,
    /// Secondary lifecycle events stream, merged in when it is stream-backed
    pub events_stream: String,
    /// Transport kind the gateways publish lifecycle events through
    pub events_kind: Option<TransportKind>,
    /// Field name carrying the trace propagation token
    pub trace_field: String,
    /// Upper bound for one blocking read
    pub block: Duration,
    /// Maximum entries fetched per stream and read
    pub batch_size: usize,
    /// Pause after a failed read or batch before polling again
    pub backoff: Duration,
}

impl Default for ConsumerOptions {
    fn default() -> Self {
        Self {
            inbox_stream: "ws.inbox".to_string(),
            events_stream: "ws.events".to_string(),
            events_kind: None,
            trace_field: "traceparent".to_string(),
            block: Duration::from_secs(5),
            batch_size: 10,
            backoff: Duration::from_secs(1),
        }
    }
}

/// Resolves the set of streams the consumer reads from
///
/// The inbox stream is always included. The events stream joins in when the
/// gateways actually publish their lifecycle events onto a stream (an unset
/// kind defaults to stream-backed) and its name is distinct and non-empty.
pub fn resolve_streams(
    inbox: &str,
    events: &str,
    events_kind: Option<TransportKind>,
) -> Vec<String> {
    let mut streams = Vec::new();

    if !inbox.is_empty() {
        streams.push(inbox.to_owned());
    }

    let events_on_stream = matches!(events_kind, None | Some(TransportKind::RedisStream));
    if events_on_stream && !events.is_empty() && events != inbox {
        streams.push(events.to_owned());
    }

    streams
}

/// Single-worker fan-in consumer over a set of gateway event streams
///
/// Runs a strictly sequential poll / drain / backoff loop: one blocking read at
/// a time, entries processed in arrival order, handlers dispatched synchronously
/// on the same worker. Nothing else mutates the per-stream cursors, which makes
/// their advancement exact.
pub struct InboxConsumer<R: StreamReader> {
    reader: R,
    registry: HandlerRegistry,
    options: ConsumerOptions,
}

impl<R> InboxConsumer<R>
where
    R: StreamReader + Send,
{
    pub fn new(reader: R, registry: HandlerRegistry, options: ConsumerOptions) -> Self {
        Self {
            reader,
            registry,
            options,
        }
    }

    /// Runs the consume loop until the shutdown signal fires
    ///
    /// Never returns under normal operation. The only fatal condition is an
    /// empty resolved stream set, checked before the loop is entered. All other
    /// failures are logged and absorbed by backing off and re-polling from the
    /// last successfully advanced cursors.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> Result<(), ConsumerError> {
        let streams = resolve_streams(
            &self.options.inbox_stream,
            &self.options.events_stream,
            self.options.events_kind,
        );

        if streams.is_empty() {
            return Err(ConsumerError::NoResolvableStreams);
        }

        let mut cursors = resolve_cursors(&mut self.reader, &streams).await;
        info!("Inbox consumer started (cursors: {:?})", cursors);

        loop {
            let block = self.options.block;
            let batch_size = self.options.batch_size;

            tokio::select! {
                _ = shutdown.changed() => {
                    info!("Shutdown signal received, terminating the inbox consumer");
                    return Ok(());
                }
                result = self.reader.read(&cursors, block, batch_size) => {
                    let failure = match result {
                        Ok(batches) => self.drain(batches, &mut cursors).await.err(),
                        Err(e) => Some(e),
                    };

                    if let Some(error) = failure {
                        error!("Failed to consume batch: {}", error);
                        sleep(self.options.backoff).await;
                    }
                }
            }
        }
    }

    /// Processes one read result, advancing cursors entry by entry
    ///
    /// The cursor advances past every entry regardless of whether it decoded to
    /// an event, except when dispatch itself fails: the error propagates, the
    /// failing entry keeps its old cursor and the rest of the batch is
    /// abandoned. Earlier advancements in the same batch stick, so the next
    /// read retries exactly the failing entry and everything after it.
    async fn drain(
        &self,
        batches: Vec<StreamBatch>,
        cursors: &mut [StreamCursor],
    ) -> EmptyResult {
        for batch in batches {
            let index = match cursors.iter().position(|c| c.stream() == batch.stream) {
                Some(index) => index,
                None => continue,
            };

            for entry in batch.entries {
                if let Some(decoded) = decode(&entry.fields, &self.options.trace_field) {
                    let connection = decoded.event.connection();
                    let attributes = vec![
                        trace::EVENT_TYPE.string(decoded.event.kind().wire_name()),
                        trace::CONNECTION_ID.string(connection.connection_id.clone()),
                        trace::USER_ID.string(connection.user_id.clone()),
                    ];

                    let scope = ConsumeScope::start(
                        "ws.inbox.consume",
                        attributes,
                        decoded.trace_token.as_deref(),
                        &self.options.trace_field,
                    );

                    let dispatch = self
                        .registry
                        .dispatch(&decoded.event)
                        .with_context(scope.context());

                    if let Err(error) = dispatch.await {
                        scope.record_failure(error.as_ref());
                        return Err(error);
                    }
                }

                cursors[index].advance(entry.id);
            }
        }

        Ok(())
    }
}
