//! Inbound patient payload coercion and validation.
//!
//! The relay accepts `input_value` either as a pre-serialised string or as a
//! structured object. Structured values are re-serialised to a string before
//! forwarding (coercion, not rejection). The forwarded string must be a
//! syntactically valid JSON object; the relay does not validate medical
//! semantics.

use serde_json::Value;

use crate::{RelayError, RelayResult};

/// Coerce the inbound `input_value` into the forwarded payload string.
///
/// Strings pass through unchanged; any other JSON value is re-serialised.
///
/// # Errors
///
/// Returns [`RelayError::Internal`] only if re-serialisation fails, which
/// cannot happen for values that were just deserialised.
pub fn coerce_input_value(value: &Value) -> RelayResult<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        other => serde_json::to_string(other)
            .map_err(|e| RelayError::Internal(format!("failed to re-serialise input_value: {e}"))),
    }
}

/// Validate that a payload string is a syntactically valid JSON object.
///
/// Uses `serde_path_to_error` so the failing path lands in the error message
/// and can be surfaced in the response's `details` field.
///
/// # Errors
///
/// Returns [`RelayError::BadRequest`] when the payload is not valid JSON or
/// is valid JSON but not an object.
pub fn validate_patient_payload(payload: &str) -> RelayResult<()> {
    let deserializer = &mut serde_json::Deserializer::from_str(payload);

    let value: Value = serde_path_to_error::deserialize(deserializer).map_err(|err| {
        let path = err.path().to_string();
        let path = if path.is_empty() { "<root>" } else { &path };
        RelayError::BadRequest(format!(
            "patient payload is not valid JSON at {path}: {}",
            err.into_inner()
        ))
    })?;

    if !value.is_object() {
        return Err(RelayError::BadRequest(
            "patient payload must be a JSON object".into(),
        ));
    }

    Ok(())
}
