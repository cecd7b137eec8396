use super::global_tracer;
use opentelemetry::{
    global,
    trace::{SpanBuilder, SpanKind, StatusCode, TraceContextExt, Tracer},
    Context, KeyValue,
};
use std::collections::HashMap;
use std::error::Error;

/// Carries a trace context across process boundaries as a single opaque token
///
/// The token lives under a configurable field name (usually the W3C `traceparent`
/// header name) inside whatever envelope the transport uses. Extraction of a
/// missing or malformed token silently yields an empty context so that consumers
/// start a fresh root span instead of failing.
pub struct TokenPropagator;

impl TokenPropagator {
    pub fn serialize(context: &Context, field: &str) -> Option<String> {
        let mut carrier = HashMap::new();

        global::get_text_map_propagator(|propagator| {
            propagator.inject_context(context, &mut carrier)
        });

        carrier.remove(&field.to_lowercase())
    }

    pub fn deserialize(token: &str, field: &str) -> Context {
        let mut carrier = HashMap::new();
        carrier.insert(field.to_lowercase(), token.to_owned());

        global::get_text_map_propagator(|propagator| propagator.extract(&carrier))
    }
}

/// Span guard wrapped around the decode + dispatch section of one stream entry
///
/// The underlying span ends when the scope is dropped, which guarantees closure
/// on every exit path of the enclosing dispatch, including handler failures.
/// Dispatch must run under [`context`](ConsumeScope::context) so that outbound
/// publishers can serialize the consume span into their own wire format.
pub struct ConsumeScope {
    context: Context,
}

impl ConsumeScope {
    /// Starts a consumer span, parented to the inbound token when one is present
    pub fn start(
        name: &'static str,
        attributes: Vec<KeyValue>,
        token: Option<&str>,
        field: &str,
    ) -> Self {
        let mut builder = SpanBuilder::from_name(name.to_string())
            .with_kind(SpanKind::Consumer)
            .with_attributes(attributes);

        if let Some(token) = token {
            builder = builder.with_parent_context(TokenPropagator::deserialize(token, field));
        }

        Self {
            context: Context::current_with_span(global_tracer().build(builder)),
        }
    }

    /// Context carrying the consume span, to attach to the dispatch future
    pub fn context(&self) -> Context {
        self.context.clone()
    }

    /// Marks the span as failed before it is closed
    pub fn record_failure(&self, error: &(dyn Error + 'static)) {
        self.context
            .span()
            .set_status(StatusCode::Error, error.to_string());
    }
}
