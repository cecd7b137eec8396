use super::normalize::parse_read_reply;
use super::StreamCursor;
use crate::libraries::BoxedError;
use async_trait::async_trait;
use redis::streams::{StreamRangeReply, StreamReadOptions};
use redis::{aio::Connection, AsyncCommands, Client, Value};
use std::collections::HashMap;
use std::time::Duration;

/// Entry read from a stream, immediately normalized into a field mapping
#[derive(Debug, Clone, PartialEq)]
pub struct RawEntry {
    /// Opaque, monotonically increasing entry id
    pub id: String,
    /// Canonical key-indexed field mapping
    pub fields: HashMap<String, String>,
}

/// Entries returned for one stream by a single multi-stream read
#[derive(Debug, Clone, PartialEq)]
pub struct StreamBatch {
    pub stream: String,
    pub entries: Vec<RawEntry>,
}

/// Read access to a set of append-only streams
///
/// Implementations are used by exactly one consumer worker at a time, hence the
/// `&mut self` receivers. Errors are transient from the consumer's point of
/// view, the next call is expected to retry against a fresh connection.
#[async_trait]
pub trait StreamReader {
    /// Id of the most recent entry on the stream, `None` when it is empty
    async fn latest_entry_id(&mut self, stream: &str) -> Result<Option<String>, BoxedError>;

    /// One blocking multi-stream read across all given cursors
    ///
    /// Returns only entries positioned strictly after each cursor. A timeout
    /// with no new entries is not an error and yields an empty batch list.
    async fn read(
        &mut self,
        cursors: &[StreamCursor],
        block: Duration,
        count: usize,
    ) -> Result<Vec<StreamBatch>, BoxedError>;
}

/// [`StreamReader`] implementation using [Redis Streams](https://redis.io/topics/streams-intro)
///
/// Holds one owned connection for the blocking `XREAD` command. The connection
/// is dropped after any command failure and re-established lazily on the next
/// call.
pub struct RedisStreamReader {
    client: Client,
    connection: Option<Connection>,
}

impl RedisStreamReader {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            connection: None,
        }
    }

    async fn take_connection(&mut self) -> Result<Connection, BoxedError> {
        match self.connection.take() {
            Some(connection) => Ok(connection),
            None => Ok(self.client.get_async_connection().await?),
        }
    }
}

#[async_trait]
impl StreamReader for RedisStreamReader {
    async fn latest_entry_id(&mut self, stream: &str) -> Result<Option<String>, BoxedError> {
        let mut connection = self.take_connection().await?;

        match connection
            .xrevrange_count::<_, _, _, _, StreamRangeReply>(stream, "+", "-", 1usize)
            .await
        {
            Ok(reply) => {
                self.connection = Some(connection);
                Ok(reply.ids.into_iter().next().map(|entry| entry.id))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn read(
        &mut self,
        cursors: &[StreamCursor],
        block: Duration,
        count: usize,
    ) -> Result<Vec<StreamBatch>, BoxedError> {
        let keys: Vec<&str> = cursors.iter().map(StreamCursor::stream).collect();
        let ids: Vec<&str> = cursors.iter().map(StreamCursor::position).collect();

        let options = StreamReadOptions::default()
            .count(count)
            .block(block.as_millis() as usize);

        let mut connection = self.take_connection().await?;

        match connection
            .xread_options::<_, _, Value>(&keys, &ids, &options)
            .await
        {
            Ok(reply) => {
                self.connection = Some(connection);
                Ok(parse_read_reply(reply))
            }
            Err(e) => Err(e.into()),
        }
    }
}
