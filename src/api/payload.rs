//! Decoding of engine payload strings on the façade side.

use serde_json::{Value, json};

/// Parse an engine payload. Empty or malformed payloads become an explicit
/// error object instead of failing the request handler.
pub fn decode(payload: &str) -> Value {
    if payload.trim().is_empty() {
        return json!({ "status": "error", "error": "empty response from engine" });
    }

    match serde_json::from_str::<Value>(payload) {
        Ok(value) if value.is_object() => value,
        _ => json!({ "status": "error", "error": "invalid json response", "raw": payload }),
    }
}

/// Top-level `error` key or `"status": "error"`
pub fn is_error_payload(value: &Value) -> bool {
    value.get("error").is_some()
        || value.get("status").and_then(Value::as_str) == Some("error")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_payload() {
        let value = decode("");
        assert_eq!(value["error"], "empty response from engine");
        assert!(is_error_payload(&value));
    }

    #[test]
    fn test_malformed_payload_keeps_raw_text() {
        let value = decode("{\"status\": ");
        assert_eq!(value["status"], "error");
        assert_eq!(value["error"], "invalid json response");
        assert_eq!(value["raw"], "{\"status\": ");

        // Valid JSON that is not an object is not a payload either
        assert_eq!(decode("[1, 2]")["error"], "invalid json response");
    }

    #[test]
    fn test_error_detection() {
        assert!(is_error_payload(&json!({"error": "engine runtime is not initialized"})));
        assert!(is_error_payload(&json!({"status": "error", "error": "x"})));
        assert!(!is_error_payload(&json!({"status": "partial", "items": [{"error": "x"}]})));
        assert!(!is_error_payload(&json!({"queue_depth": 0, "items": []})));
    }
}
