use super::StreamReader;
use log::warn;

/// Position marker before the first entry of any stream
pub const BEGINNING_OF_TIME: &str = "0-0";

/// Read position into one stream
///
/// Owned exclusively by the running consumer and never persisted. Positions
/// only move forward: the consumer advances them in entry arrival order, one
/// entry at a time.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamCursor {
    stream: String,
    position: String,
}

impl StreamCursor {
    pub fn new(stream: String, position: String) -> Self {
        Self { stream, position }
    }

    pub fn stream(&self) -> &str {
        &self.stream
    }

    pub fn position(&self) -> &str {
        &self.position
    }

    /// Moves the cursor to the given entry id
    ///
    /// Subsequent reads return only entries strictly after it.
    pub fn advance(&mut self, id: String) {
        self.position = id;
    }
}

/// Determines the starting read position for each stream
///
/// Each stream starts directly behind its most recent entry so that a restart
/// does not replay an unbounded historical backlog. Entries produced between a
/// previous run and this snapshot are knowingly skipped. An empty stream or a
/// failing lookup falls back to the beginning-of-time sentinel.
pub async fn resolve_cursors<R>(reader: &mut R, streams: &[String]) -> Vec<StreamCursor>
where
    R: StreamReader + ?Sized,
{
    let mut cursors = Vec::with_capacity(streams.len());

    for stream in streams {
        let position = match reader.latest_entry_id(stream).await {
            Ok(Some(id)) => id,
            Ok(None) => BEGINNING_OF_TIME.to_string(),
            Err(e) => {
                warn!(
                    "Failed to resolve the latest entry of {}, starting from the beginning: {}",
                    stream, e
                );
                BEGINNING_OF_TIME.to_string()
            }
        };

        cursors.push(StreamCursor::new(stream.clone(), position));
    }

    cursors
}

#[cfg(test)]
mod tests {
    use super::super::testing::ScriptedReader;
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn starts_behind_the_most_recent_entry() {
        let mut reader = ScriptedReader::with_latest(&[("ws.inbox", "1692-4")]);

        let cursors = resolve_cursors(&mut reader, &["ws.inbox".to_string()]).await;

        assert_eq!(cursors, vec![StreamCursor::new("ws.inbox".into(), "1692-4".into())]);
    }

    #[tokio::test]
    async fn empty_stream_starts_at_the_beginning() {
        let mut reader = ScriptedReader::default();

        let cursors = resolve_cursors(&mut reader, &["ws.events".to_string()]).await;

        assert_eq!(cursors[0].position(), BEGINNING_OF_TIME);
    }

    #[tokio::test]
    async fn lookup_failure_starts_at_the_beginning() {
        let mut reader = ScriptedReader::with_latest(&[("ws.inbox", "1692-4")]);
        reader.failing_streams.push("ws.inbox".to_string());

        let cursors = resolve_cursors(&mut reader, &["ws.inbox".to_string()]).await;

        assert_eq!(cursors[0].position(), BEGINNING_OF_TIME);
    }
}
