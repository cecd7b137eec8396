use super::PayloadPublisher;
use crate::libraries::tracing::TokenPropagator;
use crate::libraries::EmptyResult;
use async_trait::async_trait;
use hyper::client::HttpConnector;
use hyper::header::{HeaderName, CONTENT_TYPE};
use hyper::{Body, Client, Method, Request, StatusCode, Uri};
use opentelemetry::Context;
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpPublishError {
    #[error("endpoint answered with unexpected status {0}")]
    UnexpectedStatus(StatusCode),
}

/// [`PayloadPublisher`] that POSTs payloads to a sidecar application endpoint
///
/// Each call becomes one request with a JSON body containing the targets and
/// the payload. The active trace context travels along as a request header
/// named after the configured trace field.
pub struct HttpPublisher {
    client: Client<HttpConnector>,
    endpoint: Uri,
    trace_header: HeaderName,
    trace_field: String,
}

impl HttpPublisher {
    pub fn new(endpoint: Uri, trace_field: &str) -> Result<Self, hyper::header::InvalidHeaderName> {
        Ok(Self {
            client: Client::new(),
            endpoint,
            trace_header: HeaderName::from_bytes(trace_field.as_bytes())?,
            trace_field: trace_field.to_owned(),
        })
    }
}

#[async_trait]
impl PayloadPublisher for HttpPublisher {
    async fn publish(&self, targets: &[String], payload: &Value) -> EmptyResult {
        let body = json!({
            "targets": targets,
            "payload": payload,
        });

        let mut request = Request::builder()
            .method(Method::POST)
            .uri(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json");

        if let Some(token) = TokenPropagator::serialize(&Context::current(), &self.trace_field) {
            request = request.header(self.trace_header.clone(), token);
        }

        let response = self
            .client
            .request(request.body(Body::from(body.to_string()))?)
            .await?;

        if !response.status().is_success() {
            return Err(HttpPublishError::UnexpectedStatus(response.status()).into());
        }

        Ok(())
    }
}
