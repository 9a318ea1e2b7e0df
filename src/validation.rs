//! Request checks that run before any staging or decoding.
//!
//! Checks run in a fixed order and stop at the first failure: body present,
//! body is a JSON object, image field present, image field is base64.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Map, Value};

use crate::error::{ScanError, ScanResult};
use crate::handler::LambdaEvent;
use crate::models::{ImageInput, ImageSource};

/// Request field carrying the base64 image
pub const IMAGE_FIELD: &str = "img";

/// Validate an incoming event and decode its image payload
pub fn validate_event(event: &LambdaEvent) -> ScanResult<ImageInput> {
    let body = event.body.as_deref().ok_or(ScanError::MissingBody)?;
    let document = parse_body(body, event.is_base64_encoded)?;
    let encoded = document
        .get(IMAGE_FIELD)
        .ok_or(ScanError::MissingField { field: IMAGE_FIELD })?;
    let bytes = decode_image_field(encoded)?;
    Ok(ImageInput::new(ImageSource::Base64, bytes))
}

/// Parse the request body into a JSON object.
///
/// Gateways that pass binary bodies through set `isBase64Encoded`; such
/// bodies are unwrapped before parsing.
pub fn parse_body(body: &str, is_base64_encoded: bool) -> ScanResult<Map<String, Value>> {
    let raw = if is_base64_encoded {
        STANDARD
            .decode(strip_whitespace(body))
            .map_err(|_| ScanError::InvalidFormat(None))?
    } else {
        body.as_bytes().to_vec()
    };

    match serde_json::from_slice::<Value>(&raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ScanError::InvalidFormat(None)),
        Err(e) => Err(ScanError::InvalidFormat(Some(e))),
    }
}

/// Decode the image field's value as standard base64.
///
/// ASCII whitespace is ignored and a leading `data:<mime>;base64,` prefix is
/// accepted. Non-string values are an encoding error.
pub fn decode_image_field(value: &Value) -> ScanResult<Vec<u8>> {
    let Value::String(encoded) = value else {
        return Err(ScanError::InvalidEncoding(None));
    };
    let payload = strip_data_url(encoded);
    STANDARD
        .decode(strip_whitespace(payload))
        .map_err(|e| ScanError::InvalidEncoding(Some(e)))
}

fn strip_data_url(value: &str) -> &str {
    let trimmed = value.trim_start();
    if let Some(rest) = trimmed.strip_prefix("data:") {
        if let Some((header, payload)) = rest.split_once(',') {
            if header.ends_with(";base64") {
                return payload;
            }
        }
    }
    value
}

fn strip_whitespace(value: &str) -> String {
    value.chars().filter(|c| !c.is_ascii_whitespace()).collect()
}
