//! Response modifiers.
//!
//! Every response the dispatcher writes on its own goes through one of four
//! replaceable functions:
//!
//! | Modifier | Called when | Default status | Default body |
//! |----------|-------------|----------------|--------------|
//! | `success` | a handler or middleware produced a value | 200 | `{"code":0,"message":"Success","data":…}` |
//! | `error` | a handler or middleware failed | error status | `{"code":status,"message":…,"error":…}` |
//! | `invalid_request` | a validator rejected a field | 400 | `{"code":400,"message":"Invalid request","errors":[…]}` |
//! | `not_found` | no route matched | 404 | `{"code":404,"message":"Not found"}` |
//!
//! A modifier writes into the [`ResponseSink`]; the dispatcher finalizes
//! afterwards whether or not the modifier did.

use std::fmt;
use std::sync::Arc;

use http::StatusCode;
use meridian_core::{HandlerError, Issue, RequestContext, ResponseSink, ValidationError};
use serde::Serialize;
use serde_json::Value;

/// Writes a successful result.
pub type SuccessModifier = Arc<dyn Fn(&RequestContext, &mut ResponseSink, Value) + Send + Sync>;

/// Writes a failure.
pub type ErrorModifier =
    Arc<dyn Fn(&RequestContext, &mut ResponseSink, &HandlerError) + Send + Sync>;

/// Writes a validation rejection.
pub type InvalidRequestModifier =
    Arc<dyn Fn(&RequestContext, &mut ResponseSink, &ValidationError) + Send + Sync>;

/// Writes a routing miss.
pub type NotFoundModifier = Arc<dyn Fn(&RequestContext, &mut ResponseSink) + Send + Sync>;

/// The JSON envelope written by the default modifiers.
#[derive(Debug, Serialize)]
struct Envelope<'a> {
    code: u16,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<&'a [Issue]>,
}

impl<'a> Envelope<'a> {
    fn new(code: u16, message: &'a str) -> Self {
        Self {
            code,
            message,
            data: None,
            error: None,
            errors: None,
        }
    }

    fn write(&self, sink: &mut ResponseSink, status: StatusCode) {
        if let Err(err) = sink.json(status, self) {
            tracing::error!(error = %err, "failed to serialize response envelope");
            sink.set_status(StatusCode::INTERNAL_SERVER_ERROR);
        }
    }
}

/// The four response modifiers of a dispatcher.
///
/// # Example
///
/// ```
/// use meridian_server::Modifiers;
/// use http::StatusCode;
/// use serde_json::json;
///
/// let modifiers = Modifiers::default().with_not_found(|_ctx, sink| {
///     sink.json_value(StatusCode::NOT_FOUND, &json!({ "error": "no such page" }));
/// });
/// # let _ = modifiers;
/// ```
#[derive(Clone)]
pub struct Modifiers {
    pub(crate) success: SuccessModifier,
    pub(crate) error: ErrorModifier,
    pub(crate) invalid_request: InvalidRequestModifier,
    pub(crate) not_found: NotFoundModifier,
}

impl Modifiers {
    /// Replaces the success modifier.
    #[must_use]
    pub fn with_success<F>(mut self, f: F) -> Self
    where
        F: Fn(&RequestContext, &mut ResponseSink, Value) + Send + Sync + 'static,
    {
        self.success = Arc::new(f);
        self
    }

    /// Replaces the error modifier.
    #[must_use]
    pub fn with_error<F>(mut self, f: F) -> Self
    where
        F: Fn(&RequestContext, &mut ResponseSink, &HandlerError) + Send + Sync + 'static,
    {
        self.error = Arc::new(f);
        self
    }

    /// Replaces the invalid-request modifier.
    #[must_use]
    pub fn with_invalid_request<F>(mut self, f: F) -> Self
    where
        F: Fn(&RequestContext, &mut ResponseSink, &ValidationError) + Send + Sync + 'static,
    {
        self.invalid_request = Arc::new(f);
        self
    }

    /// Replaces the not-found modifier.
    #[must_use]
    pub fn with_not_found<F>(mut self, f: F) -> Self
    where
        F: Fn(&RequestContext, &mut ResponseSink) + Send + Sync + 'static,
    {
        self.not_found = Arc::new(f);
        self
    }

    /// Runs the success modifier.
    pub fn success(&self, ctx: &RequestContext, sink: &mut ResponseSink, data: Value) {
        (self.success)(ctx, sink, data);
    }

    /// Runs the error modifier.
    pub fn error(&self, ctx: &RequestContext, sink: &mut ResponseSink, error: &HandlerError) {
        (self.error)(ctx, sink, error);
    }

    /// Runs the invalid-request modifier.
    pub fn invalid_request(
        &self,
        ctx: &RequestContext,
        sink: &mut ResponseSink,
        error: &ValidationError,
    ) {
        (self.invalid_request)(ctx, sink, error);
    }

    /// Runs the not-found modifier.
    pub fn not_found(&self, ctx: &RequestContext, sink: &mut ResponseSink) {
        (self.not_found)(ctx, sink);
    }
}

impl Default for Modifiers {
    fn default() -> Self {
        Self {
            success: Arc::new(default_success),
            error: Arc::new(default_error),
            invalid_request: Arc::new(default_invalid_request),
            not_found: Arc::new(default_not_found),
        }
    }
}

impl fmt::Debug for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Modifiers").finish_non_exhaustive()
    }
}

/// Writes `{"code":0,"message":"Success","data":…}` with status 200.
pub fn default_success(_ctx: &RequestContext, sink: &mut ResponseSink, data: Value) {
    let mut envelope = Envelope::new(0, "Success");
    envelope.data = Some(data);
    envelope.write(sink, StatusCode::OK);
}

/// Writes `{"code":status,"message":…}` with the error's status.
///
/// Structured errors add their data under `error`. Internal errors only
/// expose a generic message.
pub fn default_error(_ctx: &RequestContext, sink: &mut ResponseSink, error: &HandlerError) {
    let status = error.status_code();
    let mut envelope = Envelope::new(status.as_u16(), error.public_message());
    envelope.error = error.data();
    envelope.write(sink, status);
}

/// Writes `{"code":400,"message":"Invalid request","errors":[…]}` with status 400.
pub fn default_invalid_request(
    _ctx: &RequestContext,
    sink: &mut ResponseSink,
    error: &ValidationError,
) {
    let mut envelope = Envelope::new(400, "Invalid request");
    envelope.errors = Some(&error.issues);
    envelope.write(sink, StatusCode::BAD_REQUEST);
}

/// Writes `{"code":404,"message":"Not found"}` with status 404.
pub fn default_not_found(_ctx: &RequestContext, sink: &mut ResponseSink) {
    Envelope::new(404, "Not found").write(sink, StatusCode::NOT_FOUND);
}
