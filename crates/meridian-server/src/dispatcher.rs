//! Request dispatch.
//!
//! A [`Dispatcher`] is a compiled router. Each request walks a fixed
//! sequence of stages:
//!
//! ```text
//! ENTER → ROUTER_MIDDLEWARE → MATCH → BODY_ACQUIRE → VALIDATE → ROUTE_MIDDLEWARE → HANDLER → RESPOND
//! ```
//!
//! Routes copied in by [`Router::mount`](crate::Router::mount) also carry the
//! mounted router's own middleware, which runs right after MATCH and before
//! the body is read.
//!
//! Every stage either hands a rebuilt [`RequestContext`] to the next one,
//! finishes the response, or fails with a [`DispatchError`]. Failures are
//! resolved in one place, which picks the response modifier for the error
//! kind, so no request gets more than one modifier call.

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use http::{Method, Request, Response};
use http_body::Body;
use http_body_util::Full;
use meridian_core::{
    BoxError, BoxFuture, DispatchError, FieldTarget, Handler, HandlerError, HandlerResult,
    Payload, RequestContext, ResponseSink, Schema, ValidationError,
};
use meridian_middleware::{Middleware, MiddlewareChain, Outcome, ValidationPipeline};
use meridian_router::RouteTable;
use serde::Serialize;
use serde_json::Value;
use tracing::Instrument;

use crate::body::acquire_body;
use crate::modifiers::Modifiers;

/// A route frozen by [`Router::compile`](crate::Router::compile).
pub(crate) struct CompiledRoute {
    pub(crate) name: Option<String>,
    pub(crate) path: String,
    pub(crate) schema: Option<Schema>,
    /// Router-level middleware of mounted sub-routers, outermost first.
    pub(crate) mounted: MiddlewareChain,
    pub(crate) middlewares: MiddlewareChain,
    pub(crate) handler: Arc<dyn Handler>,
}

impl CompiledRoute {
    fn label(&self, method: &Method) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("{method} {}", self.path))
    }
}

/// Read-only description of a compiled route.
///
/// Code generators and documentation tools consume the
/// [manifest](Dispatcher::manifest); it never changes after compile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteInfo {
    /// Route name, if one was given.
    pub name: Option<String>,
    /// Upper-case method.
    pub method: String,
    /// Normalized path pattern.
    pub path: String,
    /// Parameter names in capture order.
    pub params: Vec<String>,
    /// Fields the route's schema validates.
    pub schema: Vec<FieldTarget>,
}

/// A compiled router, ready to serve requests.
///
/// Cloning is cheap: the route table is shared.
///
/// Modifiers belong to the dispatcher they are set on. A dispatcher nested
/// as [`Middleware`] in another router answers with its own modifiers, not
/// the parent's; set them on the nested dispatcher before registering it.
#[derive(Clone)]
pub struct Dispatcher {
    table: Arc<RouteTable<CompiledRoute>>,
    middlewares: MiddlewareChain,
    modifiers: Modifiers,
}

impl Dispatcher {
    pub(crate) fn new(table: RouteTable<CompiledRoute>, middlewares: MiddlewareChain) -> Self {
        Self {
            table: Arc::new(table),
            middlewares,
            modifiers: Modifiers::default(),
        }
    }

    /// Replaces all four response modifiers.
    #[must_use]
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Replaces the success modifier.
    #[must_use]
    pub fn with_success<F>(mut self, f: F) -> Self
    where
        F: Fn(&RequestContext, &mut ResponseSink, Value) + Send + Sync + 'static,
    {
        self.modifiers = self.modifiers.with_success(f);
        self
    }

    /// Replaces the error modifier.
    #[must_use]
    pub fn with_error<F>(mut self, f: F) -> Self
    where
        F: Fn(&RequestContext, &mut ResponseSink, &HandlerError) + Send + Sync + 'static,
    {
        self.modifiers = self.modifiers.with_error(f);
        self
    }

    /// Replaces the invalid-request modifier.
    #[must_use]
    pub fn with_invalid_request<F>(mut self, f: F) -> Self
    where
        F: Fn(&RequestContext, &mut ResponseSink, &ValidationError) + Send + Sync + 'static,
    {
        self.modifiers = self.modifiers.with_invalid_request(f);
        self
    }

    /// Replaces the not-found modifier.
    #[must_use]
    pub fn with_not_found<F>(mut self, f: F) -> Self
    where
        F: Fn(&RequestContext, &mut ResponseSink) + Send + Sync + 'static,
    {
        self.modifiers = self.modifiers.with_not_found(f);
        self
    }

    /// Returns the response modifiers.
    pub fn modifiers(&self) -> &Modifiers {
        &self.modifiers
    }

    /// Returns the number of compiled routes.
    pub fn route_count(&self) -> usize {
        self.table.len()
    }

    /// Describes every compiled route, in match order.
    pub fn manifest(&self) -> Vec<RouteInfo> {
        self.table
            .iter()
            .map(|entry| {
                let route = entry.value();
                RouteInfo {
                    name: route.name.clone(),
                    method: entry.method().as_str().to_string(),
                    path: route.path.clone(),
                    params: entry.matcher().param_names().to_vec(),
                    schema: route
                        .schema
                        .as_ref()
                        .map(Schema::declared)
                        .unwrap_or_default(),
                }
            })
            .collect()
    }

    /// Handles a transport request and produces the response.
    pub async fn handle<B>(&self, request: Request<B>) -> Response<Full<Bytes>>
    where
        B: Body<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        let (parts, body) = request.into_parts();
        let ctx = RequestContext::from_parts(&parts, Payload::from_body(body));
        let mut sink = ResponseSink::new();
        self.dispatch(ctx, &mut sink).await;
        sink.into_response()
    }

    /// Runs one request through every stage and finalizes `sink`.
    pub async fn dispatch(&self, ctx: RequestContext, sink: &mut ResponseSink) {
        let span = tracing::debug_span!(
            "dispatch",
            request_id = %ctx.request_id(),
            method = %ctx.method(),
            path = ctx.path(),
        );

        async move {
            let started = Instant::now();
            let mut ctx = ctx;

            if let Err(err) = self.run(&mut ctx, sink).await {
                self.resolve(&ctx, sink, err);
            }
            sink.finalize();

            tracing::debug!(
                status = sink.status().as_u16(),
                elapsed_us = started.elapsed().as_micros() as u64,
                "request dispatched"
            );
        }
        .instrument(span)
        .await;
    }

    async fn run(
        &self,
        ctx: &mut RequestContext,
        sink: &mut ResponseSink,
    ) -> Result<(), DispatchError> {
        match self.middlewares.run(ctx, sink).await? {
            Outcome::Continue => {}
            Outcome::ShortCircuit(value) => {
                self.modifiers.success(ctx, sink, value);
                return Ok(());
            }
            Outcome::Ended => return Ok(()),
        }

        if !ctx.path().starts_with('/') {
            return Err(DispatchError::malformed(format!(
                "request target '{}' is not an absolute path",
                ctx.path()
            )));
        }

        let method = ctx.method().as_str().to_string();
        let Some((entry, params)) = self.table.lookup_entry(&method, ctx.path()) else {
            let allowed = self.table.allowed_methods(ctx.path());
            if !allowed.is_empty() {
                tracing::debug!(?allowed, "path is routed for other methods only");
            }
            return Err(DispatchError::routing_miss(method, ctx.path()));
        };

        let route = entry.value();
        let label = route.label(entry.method());
        tracing::debug!(route = %label, "route matched");

        *ctx = ctx
            .clone()
            .with_path_params(params)
            .with_route_name(route.name.clone());

        match route.mounted.run(ctx, sink).await? {
            Outcome::Continue => {}
            Outcome::ShortCircuit(value) => {
                self.modifiers.success(ctx, sink, value);
                return Ok(());
            }
            Outcome::Ended => return Ok(()),
        }

        let body = acquire_body(ctx.payload()).await;
        *ctx = ctx.clone().with_body(body);

        if let Some(schema) = &route.schema {
            *ctx = ValidationPipeline::new(schema, &label)
                .validate(ctx.clone())
                .await?;
        }

        match route.middlewares.run(ctx, sink).await? {
            Outcome::Continue => {}
            Outcome::ShortCircuit(value) => {
                self.modifiers.success(ctx, sink, value);
                return Ok(());
            }
            Outcome::Ended => return Ok(()),
        }

        match route.handler.call(ctx, sink).await? {
            Some(value) if !sink.is_finalized() => self.modifiers.success(ctx, sink, value),
            Some(_) => tracing::debug!("handler value dropped; response already finalized"),
            None => {}
        }

        Ok(())
    }

    fn resolve(&self, ctx: &RequestContext, sink: &mut ResponseSink, err: DispatchError) {
        if sink.is_finalized() {
            tracing::error!(
                kind = err.kind(),
                error = %err,
                "request failed after its response was finalized"
            );
            return;
        }

        match err {
            DispatchError::Validation(err) => {
                self.modifiers.invalid_request(ctx, sink, &err);
            }
            DispatchError::Handler(err) => {
                if err.is_internal() {
                    tracing::error!(error = ?err, "request failed");
                } else {
                    tracing::debug!(error = %err, "request rejected");
                }
                self.modifiers.error(ctx, sink, &err);
            }
            DispatchError::RoutingMiss { .. } => {
                self.modifiers.not_found(ctx, sink);
            }
            DispatchError::MalformedTransport { reason } => {
                tracing::warn!(%reason, "malformed request");
                let err = HandlerError::bad_request("Malformed request");
                self.modifiers.error(ctx, sink, &err);
            }
        }
    }
}

impl Middleware for Dispatcher {
    fn name(&self) -> &'static str {
        "router"
    }

    /// Dispatches the request through this router.
    ///
    /// The response is always finalized, so the enclosing chain ends here.
    /// Responses are written with this dispatcher's modifiers; the
    /// enclosing dispatcher's modifiers are not consulted.
    fn call<'a>(
        &'a self,
        ctx: &'a RequestContext,
        sink: &'a mut ResponseSink,
    ) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            self.dispatch(ctx.clone(), sink).await;
            Ok(None)
        })
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("routes", &self.table.len())
            .field("middlewares", &self.middlewares)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::{RouteDefinition, Router};
    use http::StatusCode;
    use meridian_core::{handler_fn, raw_handler, FnValidator, Issue};
    use meridian_middleware::sync_middleware;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn echo_path() -> impl Handler {
        handler_fn(|ctx: RequestContext| async move {
            Ok::<_, HandlerError>(json!({ "path": ctx.path(), "params": ctx.params().clone() }))
        })
    }

    fn body_json(sink: &ResponseSink) -> Value {
        serde_json::from_slice(sink.body()).unwrap()
    }

    async fn send(dispatcher: &Dispatcher, method: Method, path: &str) -> ResponseSink {
        let mut sink = ResponseSink::new();
        dispatcher
            .dispatch(RequestContext::new(method, path), &mut sink)
            .await;
        sink
    }

    /// Counts modifier calls by kind.
    fn counting_modifiers(dispatcher: Dispatcher, calls: &Arc<Mutex<Vec<&'static str>>>) -> Dispatcher {
        let (s, e, i, n) = (
            Arc::clone(calls),
            Arc::clone(calls),
            Arc::clone(calls),
            Arc::clone(calls),
        );
        dispatcher
            .with_success(move |ctx, sink, data| {
                s.lock().push("success");
                crate::modifiers::default_success(ctx, sink, data);
            })
            .with_error(move |ctx, sink, err| {
                e.lock().push("error");
                crate::modifiers::default_error(ctx, sink, err);
            })
            .with_invalid_request(move |ctx, sink, err| {
                i.lock().push("invalid_request");
                crate::modifiers::default_invalid_request(ctx, sink, err);
            })
            .with_not_found(move |ctx, sink| {
                n.lock().push("not_found");
                crate::modifiers::default_not_found(ctx, sink);
            })
    }

    #[tokio::test]
    async fn test_path_params_reach_handler() {
        let dispatcher = Router::new()
            .route(RouteDefinition::get("/users/:id", echo_path()))
            .compile()
            .unwrap();

        let sink = send(&dispatcher, Method::GET, "/users/42").await;
        assert_eq!(sink.status(), StatusCode::OK);
        assert_eq!(body_json(&sink)["data"]["params"], json!({ "id": "42" }));
    }

    #[tokio::test]
    async fn test_method_is_compared_case_insensitively() {
        let dispatcher = Router::new()
            .route(RouteDefinition::get("/", echo_path()))
            .compile()
            .unwrap();
        let lower = Method::from_bytes(b"get").unwrap();

        let sink = send(&dispatcher, lower, "/").await;
        assert_eq!(sink.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_router_middleware_short_circuit_uses_success() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = Router::new()
            .middleware(sync_middleware("cache", |_ctx, _sink| Ok(Some(json!("cached")))))
            .route(RouteDefinition::get("/", echo_path()))
            .compile()
            .unwrap();
        let dispatcher = counting_modifiers(dispatcher, &calls);

        let sink = send(&dispatcher, Method::GET, "/").await;
        assert_eq!(body_json(&sink)["data"], json!("cached"));
        assert_eq!(*calls.lock(), vec!["success"]);
    }

    #[tokio::test]
    async fn test_router_middleware_runs_before_matching() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let dispatcher = Router::new()
            .middleware(sync_middleware("count", move |_ctx, _sink| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(None)
            }))
            .compile()
            .unwrap();

        let sink = send(&dispatcher, Method::GET, "/missing").await;
        assert_eq!(sink.status(), StatusCode::NOT_FOUND);
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_route_middleware_failure_calls_error_once() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let handled = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&handled);
        let dispatcher = Router::new()
            .route(
                RouteDefinition::get(
                    "/admin",
                    handler_fn(move |_ctx: RequestContext| {
                        counter.fetch_add(1, Ordering::SeqCst);
                        async move { Ok::<_, HandlerError>(json!(true)) }
                    }),
                )
                .middleware(sync_middleware("auth", |_ctx, _sink| {
                    Err(HandlerError::unauthorized("login required"))
                })),
            )
            .compile()
            .unwrap();
        let dispatcher = counting_modifiers(dispatcher, &calls);

        let sink = send(&dispatcher, Method::GET, "/admin").await;
        assert_eq!(sink.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            body_json(&sink),
            json!({ "code": 401, "message": "login required" })
        );
        assert_eq!(*calls.lock(), vec!["error"]);
        assert_eq!(handled.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_router_middleware_failure_calls_error_once() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let handled = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&handled);
        let dispatcher = Router::new()
            .middleware(sync_middleware("tenant", |_ctx, _sink| {
                Err(HandlerError::forbidden("unknown tenant"))
            }))
            .route(RouteDefinition::get(
                "/reports",
                handler_fn(move |_ctx: RequestContext| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    async move { Ok::<_, HandlerError>(json!([])) }
                }),
            ))
            .compile()
            .unwrap();
        let dispatcher = counting_modifiers(dispatcher, &calls);

        let sink = send(&dispatcher, Method::GET, "/reports").await;
        assert_eq!(sink.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            body_json(&sink),
            json!({ "code": 403, "message": "unknown tenant" })
        );
        assert_eq!(*calls.lock(), vec!["error"]);
        assert_eq!(handled.load(Ordering::SeqCst), 0);

        // Misses fail the same way; matching never runs.
        calls.lock().clear();
        let sink = send(&dispatcher, Method::GET, "/missing").await;
        assert_eq!(sink.status(), StatusCode::FORBIDDEN);
        assert_eq!(*calls.lock(), vec!["error"]);
    }

    fn guarded_sub_router(validated: &Arc<AtomicUsize>) -> Router {
        let counter = Arc::clone(validated);
        Router::new()
            .middleware(sync_middleware("auth", |_ctx, _sink| {
                Err(HandlerError::unauthorized("login required"))
            }))
            .route(
                RouteDefinition::get("/users/:id", echo_path()).schema(Schema::new().params(
                    FnValidator::new(move |_v| {
                        counter.fetch_add(1, Ordering::SeqCst);
                        Err(vec![Issue::new("bad id")])
                    }),
                )),
            )
    }

    #[tokio::test]
    async fn test_mounted_router_middleware_runs_before_validation() {
        let validated = Arc::new(AtomicUsize::new(0));
        let standalone = guarded_sub_router(&validated).compile().unwrap();
        let sink = send(&standalone, Method::GET, "/users/1").await;
        assert_eq!(sink.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(validated.load(Ordering::SeqCst), 0);

        let calls = Arc::new(Mutex::new(Vec::new()));
        let mounted = Router::new()
            .mount("/api", guarded_sub_router(&validated))
            .compile()
            .unwrap();
        let mounted = counting_modifiers(mounted, &calls);
        let sink = send(&mounted, Method::GET, "/api/users/1").await;
        assert_eq!(sink.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(*calls.lock(), vec!["error"]);
        assert_eq!(validated.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_mounted_router_middleware_sees_path_params() {
        let seen = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&seen);
        let sub = Router::new()
            .middleware(sync_middleware("owner", move |ctx, _sink| {
                *slot.lock() = ctx.param("id").map(ToString::to_string);
                Ok(None)
            }))
            .route(RouteDefinition::get("/users/:id", echo_path()));
        let dispatcher = Router::new().mount("/api", sub).compile().unwrap();

        let sink = send(&dispatcher, Method::GET, "/api/users/9").await;
        assert_eq!(sink.status(), StatusCode::OK);
        assert_eq!(seen.lock().as_deref(), Some("9"));
    }

    #[tokio::test]
    async fn test_handler_internal_error_is_generic_500() {
        let dispatcher = Router::new()
            .route(RouteDefinition::get(
                "/boom",
                handler_fn(|_ctx: RequestContext| async move {
                    Err::<Value, _>(HandlerError::internal("db pool exhausted"))
                }),
            ))
            .compile()
            .unwrap();

        let sink = send(&dispatcher, Method::GET, "/boom").await;
        assert_eq!(sink.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(&sink),
            json!({ "code": 500, "message": "Internal server error" })
        );
    }

    #[tokio::test]
    async fn test_validation_failure_uses_route_label() {
        let route_seen = Arc::new(Mutex::new(String::new()));
        let seen = Arc::clone(&route_seen);
        let dispatcher = Router::new()
            .route(
                RouteDefinition::get("/items/:id", echo_path()).schema(
                    Schema::new().params(FnValidator::new(|_v| Err(vec![Issue::new("bad id")]))),
                ),
            )
            .compile()
            .unwrap()
            .with_invalid_request(move |ctx, sink, err| {
                *seen.lock() = err.route.clone();
                crate::modifiers::default_invalid_request(ctx, sink, err);
            });

        let sink = send(&dispatcher, Method::GET, "/items/1").await;
        assert_eq!(sink.status(), StatusCode::BAD_REQUEST);
        assert_eq!(*route_seen.lock(), "GET /items/:id");
    }

    #[tokio::test]
    async fn test_handler_that_finalizes_gets_no_envelope() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = Router::new()
            .route(RouteDefinition::post(
                "/upload",
                raw_handler(|_ctx, sink| {
                    Box::pin(async move {
                        sink.set_status(StatusCode::ACCEPTED);
                        sink.write_body("queued");
                        sink.finalize();
                        HandlerResult::Ok(Some(json!("ignored")))
                    })
                }),
            ))
            .compile()
            .unwrap();
        let dispatcher = counting_modifiers(dispatcher, &calls);

        let sink = send(&dispatcher, Method::POST, "/upload").await;
        assert_eq!(sink.status(), StatusCode::ACCEPTED);
        assert_eq!(sink.body(), b"queued");
        assert!(calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_handler_without_value_is_finalized_empty() {
        let dispatcher = Router::new()
            .route(RouteDefinition::delete(
                "/items/:id",
                handler_fn(|_ctx: RequestContext| async move { Ok::<_, HandlerError>(()) }),
            ))
            .compile()
            .unwrap();

        let sink = send(&dispatcher, Method::DELETE, "/items/9").await;
        assert!(sink.is_finalized());
        assert_eq!(sink.status(), StatusCode::OK);
        assert!(sink.body().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_target_goes_to_error_modifier() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = counting_modifiers(Router::new().compile().unwrap(), &calls);

        let sink = send(&dispatcher, Method::OPTIONS, "*").await;
        assert_eq!(sink.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(&sink)["message"], "Malformed request");
        assert_eq!(*calls.lock(), vec!["error"]);
    }

    #[tokio::test]
    async fn test_compiled_dispatcher_is_a_middleware() {
        let inner = Router::new()
            .route(RouteDefinition::get("/inner", echo_path()))
            .compile()
            .unwrap();
        let outer = Router::new()
            .middleware(inner)
            .route(RouteDefinition::get("/outer", echo_path()))
            .compile()
            .unwrap();

        let sink = send(&outer, Method::GET, "/inner").await;
        assert_eq!(sink.status(), StatusCode::OK);
        assert_eq!(body_json(&sink)["data"]["path"], "/inner");

        // The nested router owns the response, including its misses.
        let sink = send(&outer, Method::GET, "/outer").await;
        assert_eq!(sink.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_nested_dispatcher_answers_with_its_own_modifiers() {
        let outer_calls = Arc::new(Mutex::new(Vec::new()));
        let inner_calls = Arc::new(Mutex::new(Vec::new()));
        let inner = Router::new()
            .route(RouteDefinition::get("/inner", echo_path()))
            .compile()
            .unwrap();
        let inner = counting_modifiers(inner, &inner_calls);
        let outer = Router::new().middleware(inner).compile().unwrap();
        let outer = counting_modifiers(outer, &outer_calls);

        send(&outer, Method::GET, "/inner").await;
        send(&outer, Method::GET, "/nowhere").await;

        assert_eq!(*inner_calls.lock(), vec!["success", "not_found"]);
        assert!(outer_calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_handle_reads_transport_request() {
        let dispatcher = Router::new()
            .route(RouteDefinition::post(
                "/echo",
                handler_fn(|ctx: RequestContext| async move {
                    Ok::<_, HandlerError>(json!({
                        "body": ctx.body().clone(),
                        "query": ctx.query().clone(),
                        "tenant": ctx.header("x-tenant"),
                    }))
                }),
            ))
            .compile()
            .unwrap();

        let request = Request::post("/echo?page=2")
            .header("X-Tenant", "acme")
            .body(Full::new(Bytes::from_static(br#"{"a":1}"#)))
            .unwrap();
        let response = dispatcher.handle(request).await;

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = http_body_util::BodyExt::collect(response.into_body())
            .await
            .unwrap()
            .to_bytes();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            body["data"],
            json!({ "body": { "a": 1 }, "query": { "page": "2" }, "tenant": "acme" })
        );
    }

    #[test]
    fn test_manifest_lists_routes_in_order() {
        let dispatcher = Router::new()
            .route(RouteDefinition::get("/users/:id", echo_path()).name("getUser"))
            .route(RouteDefinition::post("/users", echo_path()))
            .compile()
            .unwrap();

        let manifest = dispatcher.manifest();
        assert_eq!(manifest.len(), 2);
        assert_eq!(
            manifest[0],
            RouteInfo {
                name: Some("getUser".to_string()),
                method: "GET".to_string(),
                path: "/users/:id".to_string(),
                params: vec!["id".to_string()],
                schema: vec![],
            }
        );
        assert_eq!(manifest[1].method, "POST");
    }
}
