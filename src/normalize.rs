use serde::Serialize;

use crate::error::ScanError;
use crate::models::{ArtifactType, DetectionResult, Geometry, RawDetection};

/// How raw detections are filtered during normalization
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizePolicy {
    /// Drop records whose payload is empty
    pub skip_empty: bool,
}

/// Map raw detections onto [`DetectionResult`]s, preserving order and duplicates
pub fn normalize(raw: Vec<RawDetection>, policy: NormalizePolicy) -> Vec<DetectionResult> {
    raw.into_iter()
        .filter(|r| !(policy.skip_empty && r.text.is_empty()))
        .map(|r| DetectionResult {
            kind: ArtifactType::from_tag(&r.kind),
            detected_text: r.text,
            id: r.id,
            parent_id: r.parent_id,
            confidence: r.confidence,
            geometry: Geometry::from_parts(r.bbox, r.polygon),
        })
        .collect()
}

/// Uniform outcome of one invocation
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseEnvelope {
    Success { data: Vec<DetectionResult> },
    Error { code: u16, message: String },
}

#[derive(Serialize)]
struct SuccessBody<'a> {
    data: &'a [DetectionResult],
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    data: [DetectionResult; 0],
    message: &'a str,
}

impl ResponseEnvelope {
    pub fn success(data: Vec<DetectionResult>) -> Self {
        Self::Success { data }
    }

    pub fn error(err: &ScanError) -> Self {
        Self::Error {
            code: err.status_code(),
            message: err.to_string(),
        }
    }

    pub fn from_result(result: Result<Vec<DetectionResult>, ScanError>) -> Self {
        match result {
            Ok(data) => Self::success(data),
            Err(err) => Self::error(&err),
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::Success { .. } => 200,
            Self::Error { code, .. } => *code,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn data(&self) -> &[DetectionResult] {
        match self {
            Self::Success { data } => data,
            Self::Error { .. } => &[],
        }
    }

    /// JSON body: `{"data": [...]}` or `{"data": [], "message": "..."}`
    pub fn to_body(&self) -> serde_json::Result<String> {
        match self {
            Self::Success { data } => serde_json::to_string(&SuccessBody { data }),
            Self::Error { message, .. } => serde_json::to_string(&ErrorBody { data: [], message }),
        }
    }
}
