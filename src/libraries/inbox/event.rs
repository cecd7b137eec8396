use serde_json::Value;
use std::collections::HashSet;

/// Connection metadata shared by every event variant
///
/// Invariant: `connection_id` and `user_id` are non-empty, the
/// [decoder](super::decode) discards entries that would violate this.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionDetails {
    /// Opaque identifier of the gateway connection
    pub connection_id: String,
    /// Opaque identifier of the authenticated user
    pub user_id: String,
    /// Subjects the connection subscribed to, order irrelevant
    pub subjects: HashSet<String>,
    /// Unix timestamp of connection establishment (0 when unknown)
    pub connected_at: i64,
}

/// Typed domain event decoded from one stream entry
///
/// Instances live only for the duration of one dispatch call and are discarded
/// after all handlers return.
#[derive(Debug, Clone, PartialEq)]
pub enum WebsocketEvent {
    /// A client connected to one of the gateways
    ConnectionEstablished(ConnectionDetails),
    /// A client disconnected
    ConnectionClosed(ConnectionDetails),
    /// A client sent a message through its connection
    MessageReceived {
        /// Connection the message arrived on
        connection: ConnectionDetails,
        /// Parsed message payload, `None` when the gateway could not parse it
        message: Option<Value>,
        /// Raw message text as received on the wire
        raw: String,
    },
}

impl WebsocketEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            WebsocketEvent::ConnectionEstablished(_) => EventKind::ConnectionEstablished,
            WebsocketEvent::ConnectionClosed(_) => EventKind::ConnectionClosed,
            WebsocketEvent::MessageReceived { .. } => EventKind::MessageReceived,
        }
    }

    pub fn connection(&self) -> &ConnectionDetails {
        match self {
            WebsocketEvent::ConnectionEstablished(connection) => connection,
            WebsocketEvent::ConnectionClosed(connection) => connection,
            WebsocketEvent::MessageReceived { connection, .. } => connection,
        }
    }
}

/// Discriminator for [`WebsocketEvent`] variants, used to key handler registrations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ConnectionEstablished,
    ConnectionClosed,
    MessageReceived,
}

impl EventKind {
    /// Name of the variant as it appears in the `type` field on the wire
    pub fn wire_name(&self) -> &'static str {
        match self {
            EventKind::ConnectionEstablished => "connected",
            EventKind::ConnectionClosed => "disconnected",
            EventKind::MessageReceived => "message_received",
        }
    }
}
