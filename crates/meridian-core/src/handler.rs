//! Route handler trait and closure adapters.

use std::future::Future;
use std::pin::Pin;

use serde::Serialize;
use serde_json::Value;

use crate::context::RequestContext;
use crate::error::{HandlerError, HandlerResult};
use crate::response::ResponseSink;

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The terminal step of a route.
///
/// A handler receives the fully validated context and the response sink.
/// Returning `Ok(Some(value))` produces a success envelope around `value`;
/// returning `Ok(None)` leaves the response to whatever the handler wrote
/// into the sink.
///
/// Most handlers are written as closures through [`handler_fn`] or
/// [`raw_handler`]; implement the trait directly for stateful handlers.
pub trait Handler: Send + Sync + 'static {
    /// Handles the request.
    fn call<'a>(
        &'a self,
        ctx: &'a RequestContext,
        sink: &'a mut ResponseSink,
    ) -> BoxFuture<'a, HandlerResult>;
}

/// Handler built from an async closure returning serializable data.
///
/// Created by [`handler_fn`].
pub struct FnHandler<F> {
    func: F,
}

impl<F, Fut, T> Handler for FnHandler<F>
where
    F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, HandlerError>> + Send + 'static,
    T: Serialize,
{
    fn call<'a>(
        &'a self,
        ctx: &'a RequestContext,
        _sink: &'a mut ResponseSink,
    ) -> BoxFuture<'a, HandlerResult> {
        let fut = (self.func)(ctx.clone());
        Box::pin(async move {
            let output = fut.await?;
            match serde_json::to_value(output)? {
                Value::Null => Ok(None),
                value => Ok(Some(value)),
            }
        })
    }
}

/// Wraps an async closure as a [`Handler`].
///
/// The closure gets an owned copy of the context. Its output is serialized
/// to JSON and wrapped in a success envelope; an output that serializes to
/// `null` (such as `()` or `None`) produces no envelope.
///
/// # Example
///
/// ```rust
/// use meridian_core::{handler_fn, HandlerError, RequestContext};
/// use serde_json::json;
///
/// let hello = handler_fn(|_ctx: RequestContext| async move {
///     Ok::<_, HandlerError>(json!({ "message": "Hello World" }))
/// });
/// # let _ = hello;
/// ```
pub fn handler_fn<F, Fut, T>(func: F) -> FnHandler<F>
where
    F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, HandlerError>> + Send + 'static,
    T: Serialize,
{
    FnHandler { func }
}

/// Handler built from a closure that may write to the sink directly.
///
/// Created by [`raw_handler`].
pub struct RawHandler<F> {
    func: F,
}

impl<F> Handler for RawHandler<F>
where
    F: for<'a> Fn(&'a RequestContext, &'a mut ResponseSink) -> BoxFuture<'a, HandlerResult>
        + Send
        + Sync
        + 'static,
{
    fn call<'a>(
        &'a self,
        ctx: &'a RequestContext,
        sink: &'a mut ResponseSink,
    ) -> BoxFuture<'a, HandlerResult> {
        (self.func)(ctx, sink)
    }
}

/// Wraps a closure with full access to the sink as a [`Handler`].
///
/// # Example
///
/// ```rust
/// use meridian_core::{raw_handler, HandlerResult};
/// use http::StatusCode;
///
/// let no_content = raw_handler(|_ctx, sink| {
///     Box::pin(async move {
///         sink.set_status(StatusCode::NO_CONTENT);
///         sink.finalize();
///         HandlerResult::Ok(None)
///     })
/// });
/// # let _ = no_content;
/// ```
pub fn raw_handler<F>(func: F) -> RawHandler<F>
where
    F: for<'a> Fn(&'a RequestContext, &'a mut ResponseSink) -> BoxFuture<'a, HandlerResult>
        + Send
        + Sync
        + 'static,
{
    RawHandler { func }
}
