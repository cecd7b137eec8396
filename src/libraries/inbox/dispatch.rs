use super::{EventKind, WebsocketEvent};
use crate::libraries::EmptyResult;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Entity which reacts to dispatched [`WebsocketEvents`](WebsocketEvent)
///
/// Handlers run synchronously on the consumer worker, one after the other. A
/// failing handler aborts the current batch and causes the entry to be
/// redelivered, so implementations must tolerate at-least-once semantics.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &WebsocketEvent) -> EmptyResult;
}

/// Registry of handlers keyed by event variant
///
/// Handlers are invoked sequentially in registration order. The first error
/// aborts the dispatch and propagates to the caller.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<EventKind, Vec<Arc<dyn EventHandler>>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for one event variant
    pub fn register(&mut self, kind: EventKind, handler: Arc<dyn EventHandler>) {
        self.handlers.entry(kind).or_default().push(handler);
    }

    /// Dispatches an event to all handlers registered for its variant
    pub async fn dispatch(&self, event: &WebsocketEvent) -> EmptyResult {
        if let Some(handlers) = self.handlers.get(&event.kind()) {
            for handler in handlers {
                handler.handle(event).await?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libraries::inbox::ConnectionDetails;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;
    use std::sync::Mutex;

    struct TraceHandler {
        label: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    #[async_trait]
    impl EventHandler for TraceHandler {
        async fn handle(&self, _event: &WebsocketEvent) -> EmptyResult {
            self.log.lock().unwrap().push(self.label);
            Ok(())
        }
    }

    fn connection() -> ConnectionDetails {
        ConnectionDetails {
            connection_id: "c1".into(),
            user_id: "u1".into(),
            subjects: HashSet::new(),
            connected_at: 0,
        }
    }

    #[tokio::test]
    async fn dispatches_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = HandlerRegistry::new();

        for label in ["first", "second", "third"].iter().copied() {
            registry.register(
                EventKind::ConnectionEstablished,
                Arc::new(TraceHandler {
                    label,
                    log: log.clone(),
                }),
            );
        }

        registry
            .dispatch(&WebsocketEvent::ConnectionEstablished(connection()))
            .await
            .unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn only_reaches_handlers_of_the_matching_variant() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = HandlerRegistry::new();

        registry.register(
            EventKind::ConnectionClosed,
            Arc::new(TraceHandler {
                label: "closed",
                log: log.clone(),
            }),
        );

        registry
            .dispatch(&WebsocketEvent::ConnectionEstablished(connection()))
            .await
            .unwrap();

        assert!(log.lock().unwrap().is_empty());
    }
}
