use anyhow::Context;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::detection::{DecodeTarget, DetectError, Detector};
use crate::models::{Geometry, RawDetection};

/// Operation header the JSON 1.1 protocol dispatches on
pub const TARGET_HEADER: &str = "X-Amz-Target";
pub const DETECT_TEXT_TARGET: &str = "RekognitionService.DetectText";
pub const JSON_CONTENT_TYPE: &str = "application/x-amz-json-1.1";

/// Client for a hosted text/barcode recognition service.
///
/// The service reads the image from object storage, so only staged targets
/// are accepted. Requests and responses follow the DetectText JSON shape.
#[derive(Debug, Clone)]
pub struct RecognitionClient {
    endpoint: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct DetectTextRequest<'a> {
    #[serde(rename = "Image")]
    image: ImageRef<'a>,
}

#[derive(Debug, Serialize)]
struct ImageRef<'a> {
    #[serde(rename = "S3Object")]
    s3_object: S3Object<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct S3Object<'a> {
    bucket: &'a str,
    name: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DetectTextResponse {
    #[serde(default)]
    text_detections: Vec<TextDetection>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TextDetection {
    #[serde(default)]
    detected_text: String,
    #[serde(rename = "Type", default)]
    kind: String,
    #[serde(default)]
    id: Option<u32>,
    #[serde(default)]
    parent_id: Option<u32>,
    #[serde(default)]
    confidence: Option<f32>,
    #[serde(default)]
    geometry: Option<Geometry>,
}

impl From<TextDetection> for RawDetection {
    fn from(d: TextDetection) -> Self {
        RawDetection {
            text: d.detected_text,
            kind: d.kind,
            id: d.id,
            parent_id: d.parent_id,
            confidence: d.confidence,
            bbox: d.geometry.as_ref().map(|g| g.bounding_box),
            polygon: d.geometry.map(|g| g.polygon).unwrap_or_default(),
        }
    }
}

impl RecognitionClient {
    pub fn new(endpoint: impl Into<String>, timeout: Option<Duration>) -> anyhow::Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            endpoint: endpoint.into(),
            client: builder.build().context("Failed to build recognition HTTP client")?,
        })
    }
}

impl Detector for RecognitionClient {
    fn detect(&self, target: DecodeTarget<'_>) -> Result<Vec<RawDetection>, DetectError> {
        let DecodeTarget::Staged(object) = target else {
            return Err(DetectError::UnsupportedTarget {
                detector: self.name().to_string(),
                target: target.describe(),
            });
        };

        let request = DetectTextRequest {
            image: ImageRef {
                s3_object: S3Object {
                    bucket: &object.bucket,
                    name: &object.key,
                },
            },
        };

        let payload = serde_json::to_vec(&request).map_err(|e| DetectError::Backend(e.into()))?;
        let response: DetectTextResponse = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .header(TARGET_HEADER, DETECT_TEXT_TARGET)
            .body(payload)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.json())
            .map_err(|e| DetectError::Backend(e.into()))?;

        debug!(
            %object,
            detections = response.text_detections.len(),
            "recognition service responded"
        );
        Ok(response.text_detections.into_iter().map(RawDetection::from).collect())
    }

    fn name(&self) -> &str {
        "Recognition Service"
    }
}
