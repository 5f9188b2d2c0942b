//! 响应校验与错误归类。
//!
//! Response validation and error classification.

use crate::types::{QueryResponse, ServiceStatus};
use crate::{Error, ErrorContext, Result};

/// Validate a successful `/query` body.
///
/// The body must be a JSON object whose `answer` is a string. Optional fields that
/// are present but malformed are rejected as well rather than silently dropped.
pub(crate) fn validate_query_response(body: &[u8]) -> Result<QueryResponse> {
    let json: serde_json::Value = serde_json::from_slice(body).map_err(|e| {
        Error::validation_with_context(
            format!("Response is not valid JSON: {}", e),
            ErrorContext::new().with_source("response_validator"),
        )
    })?;

    match json.get("answer") {
        Some(serde_json::Value::String(_)) => {}
        Some(other) => {
            return Err(Error::validation_with_context(
                "Response field 'answer' must be a string",
                ErrorContext::new()
                    .with_field_path("response.answer")
                    .with_details(format!("got {}", json_type_name(other)))
                    .with_source("response_validator"),
            ))
        }
        None => {
            return Err(Error::validation_with_context(
                "Response is missing required field 'answer'",
                ErrorContext::new()
                    .with_field_path("response.answer")
                    .with_source("response_validator"),
            ))
        }
    }

    serde_json::from_value(json).map_err(|e| {
        Error::validation_with_context(
            format!("Malformed response: {}", e),
            ErrorContext::new().with_source("response_validator"),
        )
    })
}

pub(crate) fn validate_status_response(body: &[u8]) -> Result<ServiceStatus> {
    serde_json::from_slice(body).map_err(|e| {
        Error::validation_with_context(
            format!("Malformed status response: {}", e),
            ErrorContext::new()
                .with_field_path("status")
                .with_source("response_validator"),
        )
    })
}

/// Re-expose known client errors unchanged; wrap anything else as [`Error::ChatService`]
/// with the original value kept as the error source.
pub fn classify_error(err: anyhow::Error) -> Error {
    match err.downcast::<Error>() {
        Ok(known) => known,
        Err(other) => Error::ChatService {
            message: other.to_string(),
            source: Some(other.into()),
        },
    }
}

fn json_type_name(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
