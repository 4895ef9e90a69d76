//! Request body acquisition.

use meridian_core::Payload;
use serde_json::Value;

/// Reads the payload and parses it as JSON.
///
/// Acquisition never fails the request: an empty body, a body that is not
/// valid JSON, or a transport error while reading all produce `null`. A
/// route that needs a body declares a body validator that rejects `null`.
pub async fn acquire_body(payload: &Payload) -> Value {
    let bytes = match payload.read().await {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::debug!(error = %err, "request body could not be read");
            return Value::Null;
        }
    };

    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }

    match serde_json::from_slice(&bytes) {
        Ok(value) => value,
        Err(err) => {
            tracing::debug!(error = %err, len = bytes.len(), "request body is not JSON");
            Value::Null
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_json_body_is_parsed() {
        let payload = Payload::from_bytes(r#"{"name":"widget","tags":["a"]}"#);
        assert_eq!(
            acquire_body(&payload).await,
            json!({ "name": "widget", "tags": ["a"] })
        );
    }

    #[tokio::test]
    async fn test_empty_body_is_null() {
        assert!(acquire_body(&Payload::empty()).await.is_null());
        assert!(acquire_body(&Payload::from_bytes(" \n")).await.is_null());
    }

    #[tokio::test]
    async fn test_malformed_body_is_null() {
        let payload = Payload::from_bytes("{\"name\":");
        assert!(acquire_body(&payload).await.is_null());
    }

    #[tokio::test]
    async fn test_scalar_body_is_kept() {
        assert_eq!(acquire_body(&Payload::from_bytes("42")).await, json!(42));
    }
}
