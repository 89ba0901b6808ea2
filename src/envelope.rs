/// Response envelope parsing
///
/// The REST API answers either with an envelope
/// `{ "success": bool, "data": ..., "message": "..." }` or with the bare
/// payload. Every response body goes through one of the two functions
/// below instead of being shape-checked at each call site.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ApiError;

/// Extract a single payload.
///
/// * `{"success": false, ...}` is a rejection carrying `message`
/// * an object with a non-null `data` field yields that field
/// * anything else is taken as the payload itself
pub fn normalize<T: DeserializeOwned>(body: Value) -> Result<T, ApiError> {
    let payload = unwrap_envelope(body)?;
    serde_json::from_value(payload).map_err(ApiError::from)
}

/// Extract a list payload from `{"data": [...]}` or a bare array.
pub fn normalize_list<T: DeserializeOwned>(body: Value) -> Result<Vec<T>, ApiError> {
    match unwrap_envelope(body)? {
        Value::Array(items) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(ApiError::from))
            .collect(),
        other => Err(ApiError::Decode(format!(
            "expected a list, got {}",
            value_kind(&other)
        ))),
    }
}

/// The `message` field of an envelope, if present.
pub fn message(body: &Value) -> Option<String> {
    body.get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

/// Whether the envelope explicitly reports failure.
pub fn is_rejected(body: &Value) -> bool {
    body.get("success").and_then(Value::as_bool) == Some(false)
}

fn unwrap_envelope(body: Value) -> Result<Value, ApiError> {
    if is_rejected(&body) {
        return Err(ApiError::Rejected(message(&body)));
    }

    match body {
        Value::Object(mut fields) => match fields.remove("data") {
            Some(data) if !data.is_null() => Ok(data),
            Some(_) => Err(ApiError::Decode("envelope has no data".to_string())),
            None => Ok(Value::Object(fields)),
        },
        other => Ok(other),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
