use crate::libraries::EmptyResult;
use async_trait::async_trait;
use serde_json::Value;

/// Transport seam for delivering one payload to a set of target keys
///
/// Implementations deliver the payload exactly once per call and do not retry;
/// retrying is the caller's decision. Target keys are opaque routing strings,
/// their interpretation belongs to whoever sits on the other end of the
/// transport.
#[async_trait]
pub trait PayloadPublisher {
    async fn publish(&self, targets: &[String], payload: &Value) -> EmptyResult;
}
