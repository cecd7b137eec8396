//! Resumable fan-in consumer for gateway event streams
//!
//! WebSocket gateway processes append connection lifecycle and message events to
//! one or more append-only streams. The structures in this module read those
//! streams from a freshly derived position, normalize the heterogeneous entry
//! encodings into one field mapping, decode the mapping into a typed
//! [`WebsocketEvent`] and dispatch it synchronously to a registry of handlers.
//!
//! Cursors are owned by the running consumer and never persisted. A restart
//! re-derives its starting position from the most recent entry per stream, so
//! history written while the consumer was down is deliberately skipped.

mod consumer;
mod cursor;
mod decode;
mod dispatch;
mod event;
mod normalize;
mod reader;

pub use consumer::*;
pub use cursor::*;
pub use decode::*;
pub use dispatch::*;
pub use event::*;
pub use normalize::*;
pub use reader::*;
