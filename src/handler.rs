//! Lambda-proxy style request/response boundary for the remote pipeline.

use serde::{Deserialize, Serialize};
use tracing::error;

use crate::normalize::ResponseEnvelope;
use crate::pipeline::RemotePipeline;

/// Incoming proxy event. Only the fields the pipeline reads are modelled;
/// everything else in the event is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LambdaEvent {
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub is_base64_encoded: bool,
}

impl LambdaEvent {
    pub fn with_body(body: impl Into<String>) -> Self {
        Self {
            body: Some(body.into()),
            is_base64_encoded: false,
        }
    }
}

/// Outgoing proxy response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LambdaResponse {
    pub status_code: u16,
    pub body: String,
}

impl From<&ResponseEnvelope> for LambdaResponse {
    fn from(envelope: &ResponseEnvelope) -> Self {
        let (status_code, body) = match envelope.to_body() {
            Ok(body) => (envelope.status_code(), body),
            Err(e) => {
                error!(error = %e, "failed to serialize response body");
                (500, r#"{"data":[],"message":"internal error"}"#.to_string())
            }
        };
        Self { status_code, body }
    }
}

/// Handle one event; never fails, every outcome becomes a response
pub fn handle_event(pipeline: &RemotePipeline, event: &LambdaEvent) -> LambdaResponse {
    LambdaResponse::from(&pipeline.handle(event))
}

/// Handle a raw event document as received from the runtime.
///
/// A document that is not an event object is treated as an event without
/// a body.
pub fn handle_raw_event(pipeline: &RemotePipeline, raw: &str) -> LambdaResponse {
    let event = serde_json::from_str::<LambdaEvent>(raw).unwrap_or_default();
    handle_event(pipeline, &event)
}
