//! Tracing module
//!
//! This module contains all the tools necessary to enable tracing in conformance with OpenTelemetry,
//! including the bridge that carries a trace context token across the stream transport boundary.

pub mod constants;
mod init;
mod propagation;

pub use init::init;
pub use propagation::{ConsumeScope, TokenPropagator};

use opentelemetry::global::{self, BoxedTracer};

pub fn global_tracer() -> BoxedTracer {
    global::tracer("wsrelay/main")
}
