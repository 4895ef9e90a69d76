//! Core middleware trait and closure adapters.
//!
//! A middleware step sees the current [`RequestContext`] and the shared
//! [`ResponseSink`]. It may pass through, short-circuit with a value, write
//! and finalize the response itself, or fail.
//!
//! # Example
//!
//! ```
//! use meridian_middleware::{Middleware, BoxFuture};
//! use meridian_core::{HandlerError, HandlerResult, RequestContext, ResponseSink};
//!
//! struct RequireApiKey;
//!
//! impl Middleware for RequireApiKey {
//!     fn name(&self) -> &'static str {
//!         "require_api_key"
//!     }
//!
//!     fn call<'a>(
//!         &'a self,
//!         ctx: &'a RequestContext,
//!         _sink: &'a mut ResponseSink,
//!     ) -> BoxFuture<'a, HandlerResult> {
//!         Box::pin(async move {
//!             match ctx.header("x-api-key") {
//!                 Some(_) => Ok(None),
//!                 None => Err(HandlerError::unauthorized("missing api key")),
//!             }
//!         })
//!     }
//! }
//! ```

use meridian_core::{HandlerResult, RequestContext, ResponseSink};

pub use meridian_core::BoxFuture;

/// A single pipeline step.
///
/// # Contract
///
/// - `Ok(None)`: continue with the next step
/// - `Ok(Some(value))`: stop; `value` is sent through the success modifier
/// - finalize the sink: stop; nothing else is written
/// - `Err(error)`: abort the dispatch; the error modifier runs once
pub trait Middleware: Send + Sync + 'static {
    /// Returns a name for logs.
    fn name(&self) -> &'static str;

    /// Runs the step.
    fn call<'a>(
        &'a self,
        ctx: &'a RequestContext,
        sink: &'a mut ResponseSink,
    ) -> BoxFuture<'a, HandlerResult>;
}

/// A middleware built from a closure returning a boxed future.
///
/// Created by [`middleware_fn`].
pub struct FnMiddleware<F> {
    name: &'static str,
    func: F,
}

impl<F> Middleware for FnMiddleware<F>
where
    F: for<'a> Fn(&'a RequestContext, &'a mut ResponseSink) -> BoxFuture<'a, HandlerResult>
        + Send
        + Sync
        + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn call<'a>(
        &'a self,
        ctx: &'a RequestContext,
        sink: &'a mut ResponseSink,
    ) -> BoxFuture<'a, HandlerResult> {
        (self.func)(ctx, sink)
    }
}

/// Creates an async middleware from a closure.
///
/// # Example
///
/// ```
/// use meridian_middleware::middleware_fn;
/// use meridian_core::HandlerResult;
/// use http::StatusCode;
///
/// let maintenance = middleware_fn("maintenance", |_ctx, sink| {
///     Box::pin(async move {
///         sink.set_status(StatusCode::SERVICE_UNAVAILABLE);
///         sink.finalize();
///         HandlerResult::Ok(None)
///     })
/// });
/// # let _ = maintenance;
/// ```
pub fn middleware_fn<F>(name: &'static str, func: F) -> FnMiddleware<F>
where
    F: for<'a> Fn(&'a RequestContext, &'a mut ResponseSink) -> BoxFuture<'a, HandlerResult>
        + Send
        + Sync
        + 'static,
{
    FnMiddleware { name, func }
}

/// A middleware built from a synchronous closure.
///
/// Created by [`sync_middleware`].
pub struct SyncMiddleware<F> {
    name: &'static str,
    func: F,
}

impl<F> Middleware for SyncMiddleware<F>
where
    F: Fn(&RequestContext, &mut ResponseSink) -> HandlerResult + Send + Sync + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn call<'a>(
        &'a self,
        ctx: &'a RequestContext,
        sink: &'a mut ResponseSink,
    ) -> BoxFuture<'a, HandlerResult> {
        let result = (self.func)(ctx, sink);
        Box::pin(async move { result })
    }
}

/// Creates a middleware from a synchronous closure, such as a header check
/// or a step that sets CORS headers.
pub fn sync_middleware<F>(name: &'static str, func: F) -> SyncMiddleware<F>
where
    F: Fn(&RequestContext, &mut ResponseSink) -> HandlerResult + Send + Sync + 'static,
{
    SyncMiddleware { name, func }
}
