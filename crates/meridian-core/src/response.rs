//! Response sink.
//!
//! Middleware, handlers and response modifiers all write into the same
//! [`ResponseSink`]. Once [`finalize`](ResponseSink::finalize) has been
//! called the response is frozen: later writes are dropped and logged, so a
//! request can never produce two responses.

use bytes::{Bytes, BytesMut};
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::{HeaderMap, Response, StatusCode};
use http_body_util::Full;
use serde::Serialize;
use serde_json::Value;

/// `content-type` used for JSON envelopes.
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Mutable response under construction.
///
/// # Example
///
/// ```
/// use meridian_core::ResponseSink;
/// use http::StatusCode;
/// use serde_json::json;
///
/// let mut sink = ResponseSink::new();
/// sink.json_value(StatusCode::CREATED, &json!({ "id": 1 }));
/// assert!(sink.is_finalized());
///
/// // Ignored: the response is already finalized.
/// sink.set_status(StatusCode::INTERNAL_SERVER_ERROR);
///
/// let response = sink.into_response();
/// assert_eq!(response.status(), StatusCode::CREATED);
/// ```
#[derive(Debug, Default)]
pub struct ResponseSink {
    status: StatusCode,
    headers: HeaderMap,
    body: BytesMut,
    finalized: bool,
}

impl ResponseSink {
    /// Creates an empty 200 response.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the status code.
    pub fn set_status(&mut self, status: StatusCode) {
        if self.guard("set_status") {
            self.status = status;
        }
    }

    /// Sets a header, replacing previous values with the same name.
    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        if self.guard("set_header") {
            self.headers.insert(name, value);
        }
    }

    /// Adds a header value without replacing existing ones.
    pub fn append_header(&mut self, name: HeaderName, value: HeaderValue) {
        if self.guard("append_header") {
            self.headers.append(name, value);
        }
    }

    /// Appends bytes to the body.
    pub fn write_body(&mut self, chunk: impl AsRef<[u8]>) {
        if self.guard("write_body") {
            self.body.extend_from_slice(chunk.as_ref());
        }
    }

    /// Writes `value` as a JSON response with `status` and finalizes.
    pub fn json_value(&mut self, status: StatusCode, value: &Value) {
        if !self.guard("json") {
            return;
        }
        self.status = status;
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_JSON));
        self.body.clear();
        self.body.extend_from_slice(value.to_string().as_bytes());
        self.finalized = true;
    }

    /// Serializes `value` as a JSON response with `status` and finalizes.
    pub fn json<T: Serialize>(&mut self, status: StatusCode, value: &T) -> Result<(), serde_json::Error> {
        let value = serde_json::to_value(value)?;
        self.json_value(status, &value);
        Ok(())
    }

    /// Marks the response complete. Calling it again has no effect.
    pub fn finalize(&mut self) {
        self.finalized = true;
    }

    /// Returns true once the response has been finalized.
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Returns the current status.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the current headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the body written so far.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Converts the sink into an HTTP response.
    pub fn into_response(self) -> Response<Full<Bytes>> {
        let mut response = Response::new(Full::new(self.body.freeze()));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }

    fn guard(&self, operation: &'static str) -> bool {
        if self.finalized {
            tracing::warn!(operation, "write to finalized response ignored");
            false
        } else {
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let sink = ResponseSink::new();
        assert_eq!(sink.status(), StatusCode::OK);
        assert!(sink.headers().is_empty());
        assert!(sink.body().is_empty());
        assert!(!sink.is_finalized());
    }

    #[test]
    fn test_manual_writes() {
        let mut sink = ResponseSink::new();
        sink.set_status(StatusCode::ACCEPTED);
        sink.set_header(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        sink.append_header(HeaderName::from_static("x-tag"), HeaderValue::from_static("a"));
        sink.append_header(HeaderName::from_static("x-tag"), HeaderValue::from_static("b"));
        sink.write_body("hello ");
        sink.write_body(b"world");
        sink.finalize();
        sink.finalize();

        assert_eq!(sink.status(), StatusCode::ACCEPTED);
        assert_eq!(sink.headers().get_all("x-tag").iter().count(), 2);
        assert_eq!(sink.body(), b"hello world");
    }

    #[test]
    fn test_writes_after_finalize_are_ignored() {
        let mut sink = ResponseSink::new();
        sink.json_value(StatusCode::OK, &json!({ "first": true }));

        sink.set_status(StatusCode::BAD_REQUEST);
        sink.set_header(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        sink.write_body("second");
        sink.json_value(StatusCode::NOT_FOUND, &json!({ "second": true }));

        assert_eq!(sink.status(), StatusCode::OK);
        assert_eq!(sink.headers()[CONTENT_TYPE], CONTENT_TYPE_JSON);
        assert_eq!(sink.body(), br#"{"first":true}"#);
    }

    #[tokio::test]
    async fn test_into_response() {
        #[derive(Serialize)]
        struct Reply {
            ok: bool,
        }

        let mut sink = ResponseSink::new();
        sink.json(StatusCode::CREATED, &Reply { ok: true }).unwrap();
        let response = sink.into_response();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[CONTENT_TYPE], CONTENT_TYPE_JSON);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], br#"{"ok":true}"#);
    }
}
