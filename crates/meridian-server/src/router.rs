//! Route registration and router composition.
//!
//! A [`Router`] collects [`RouteDefinition`]s and router-level middleware in
//! registration order. Routers compose by copying: [`Router::mount`] and
//! [`Router::merge`] re-register every route of another router into this
//! one, so the parent ends up with one flat, ordered list.
//!
//! [`Router::compile`] freezes the router into a [`Dispatcher`]: every path
//! pattern is compiled, every lazy schema is resolved once, and the result
//! is immutable.
//!
//! # Example
//!
//! ```rust
//! use meridian_server::{RouteDefinition, Router};
//! use meridian_core::{handler_fn, HandlerError, RequestContext};
//! use serde_json::json;
//!
//! let health = Router::new().route(RouteDefinition::get(
//!     "/health",
//!     handler_fn(|_ctx: RequestContext| async move {
//!         Ok::<_, HandlerError>(json!({ "status": "ok" }))
//!     }),
//! ));
//!
//! let dispatcher = Router::new().mount("/v1", health).compile().unwrap();
//! assert_eq!(dispatcher.manifest()[0].path, "/v1/health");
//! ```

use std::sync::Arc;

use http::Method;
use meridian_core::{Handler, Schema, SchemaSource};
use meridian_middleware::{Middleware, MiddlewareChain};
use meridian_router::path::join_paths;
use meridian_router::{Matcher, PatternError, RouteEntry, RouteTable};
use thiserror::Error;

use crate::dispatcher::{CompiledRoute, Dispatcher};

/// A route that could not be compiled.
#[derive(Debug, Error)]
#[error("cannot compile route {method} {path}")]
pub struct RouteError {
    /// Method of the failing route.
    pub method: Method,
    /// Normalized path of the failing route.
    pub path: String,
    /// Why the pattern was rejected.
    #[source]
    pub source: PatternError,
}

/// A declared route.
///
/// # Example
///
/// ```rust
/// use meridian_server::RouteDefinition;
/// use meridian_core::{handler_fn, HandlerError, RequestContext, Schema, SerdeValidator};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Deserialize, Serialize)]
/// struct UserParams {
///     #[allow(dead_code)]
///     user_id: u64,
/// }
///
/// let route = RouteDefinition::get(
///     "/users/:user_id",
///     handler_fn(|ctx: RequestContext| async move {
///         Ok::<_, HandlerError>(ctx.params().clone())
///     }),
/// )
/// .name("getUser")
/// .schema(Schema::new().params(SerdeValidator::<UserParams>::new()));
/// # let _ = route;
/// ```
#[derive(Clone)]
pub struct RouteDefinition {
    pub(crate) name: Option<String>,
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) schema: Option<SchemaSource>,
    pub(crate) middlewares: MiddlewareChain,
    pub(crate) mounted: MiddlewareChain,
    pub(crate) handler: Arc<dyn Handler>,
}

impl RouteDefinition {
    /// Creates a route for any method.
    pub fn new(method: Method, path: impl Into<String>, handler: impl Handler) -> Self {
        Self {
            name: None,
            method,
            path: path.into(),
            schema: None,
            middlewares: MiddlewareChain::new(),
            mounted: MiddlewareChain::new(),
            handler: Arc::new(handler),
        }
    }

    /// Creates a `GET` route.
    pub fn get(path: impl Into<String>, handler: impl Handler) -> Self {
        Self::new(Method::GET, path, handler)
    }

    /// Creates a `POST` route.
    pub fn post(path: impl Into<String>, handler: impl Handler) -> Self {
        Self::new(Method::POST, path, handler)
    }

    /// Creates a `PUT` route.
    pub fn put(path: impl Into<String>, handler: impl Handler) -> Self {
        Self::new(Method::PUT, path, handler)
    }

    /// Creates a `PATCH` route.
    pub fn patch(path: impl Into<String>, handler: impl Handler) -> Self {
        Self::new(Method::PATCH, path, handler)
    }

    /// Creates a `DELETE` route.
    pub fn delete(path: impl Into<String>, handler: impl Handler) -> Self {
        Self::new(Method::DELETE, path, handler)
    }

    /// Creates a `HEAD` route.
    pub fn head(path: impl Into<String>, handler: impl Handler) -> Self {
        Self::new(Method::HEAD, path, handler)
    }

    /// Names the route. Names label validation errors and the manifest.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Declares the route's schema.
    #[must_use]
    pub fn schema(mut self, schema: impl Into<SchemaSource>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Declares a schema built on first compile.
    #[must_use]
    pub fn lazy_schema<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Schema + Send + Sync + 'static,
    {
        self.schema = Some(SchemaSource::lazy(factory));
        self
    }

    /// Appends a route-level middleware.
    #[must_use]
    pub fn middleware(mut self, middleware: impl Middleware) -> Self {
        self.middlewares.push(middleware);
        self
    }

    /// Returns the method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the path as registered.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the route name, if any.
    pub fn route_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn with_prefix(mut self, prefix: &str) -> Self {
        self.path = join_paths(&[prefix, self.path.as_str()]);
        self
    }
}

impl std::fmt::Debug for RouteDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteDefinition")
            .field("name", &self.name)
            .field("method", &self.method)
            .field("path", &self.path)
            .field("schema", &self.schema)
            .field("mounted", &self.mounted)
            .field("middlewares", &self.middlewares)
            .finish_non_exhaustive()
    }
}

/// Ordered route and middleware registry.
#[derive(Debug, Clone, Default)]
pub struct Router {
    prefix: String,
    routes: Vec<RouteDefinition>,
    middlewares: MiddlewareChain,
}

impl Router {
    /// Creates an empty router with no prefix.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty router whose routes all live under `prefix`.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            ..Self::default()
        }
    }

    /// Registers a route.
    #[must_use]
    pub fn route(mut self, route: RouteDefinition) -> Self {
        self.add_route(route);
        self
    }

    /// Registers a route without consuming the router.
    ///
    /// The router's prefix is joined ahead of the route path, which is then
    /// normalized.
    pub fn add_route(&mut self, route: RouteDefinition) {
        let route = route.with_prefix(&self.prefix);
        tracing::debug!(method = %route.method, path = %route.path, "route registered");
        self.routes.push(route);
    }

    /// Appends a router-level middleware.
    ///
    /// Router middleware runs for every request, before route matching.
    #[must_use]
    pub fn middleware(mut self, middleware: impl Middleware) -> Self {
        self.middlewares.push(middleware);
        self
    }

    /// Copies every route of `sub` into this router under `prefix`.
    ///
    /// Routes keep their relative order and are appended after the routes
    /// already registered. Router-level middleware of `sub` is carried on
    /// each copied route and runs right after that route matches, before
    /// the body is read or validated, so a mounted guard sees requests at
    /// the same point as it does when `sub` is compiled on its own.
    #[must_use]
    pub fn mount(mut self, prefix: &str, sub: Router) -> Self {
        let shared = sub.middlewares;
        if !shared.is_empty() {
            tracing::debug!(
                prefix,
                middlewares = ?shared.names(),
                "sub-router middleware carried onto mounted routes"
            );
        }

        for mut route in sub.routes {
            if !shared.is_empty() {
                let mut chain = shared.clone();
                for step in route.mounted.iter() {
                    chain.push_arc(Arc::clone(step));
                }
                route.mounted = chain;
            }
            self.add_route(route.with_prefix(prefix));
        }
        self
    }

    /// Copies every route of `sub` into this router without a prefix.
    #[must_use]
    pub fn merge(self, sub: Router) -> Self {
        self.mount("", sub)
    }

    /// Returns the registered routes, in order.
    pub fn routes(&self) -> &[RouteDefinition] {
        &self.routes
    }

    /// Returns the router-level middleware chain.
    pub fn middlewares(&self) -> &MiddlewareChain {
        &self.middlewares
    }

    /// Freezes the router into a [`Dispatcher`].
    ///
    /// # Errors
    ///
    /// Returns [`RouteError`] for the first route whose path pattern cannot
    /// be compiled, such as one that repeats a parameter name.
    pub fn compile(self) -> Result<Dispatcher, RouteError> {
        let mut table = RouteTable::new();

        for route in self.routes {
            let matcher = Matcher::compile(&route.path).map_err(|source| RouteError {
                method: route.method.clone(),
                path: route.path.clone(),
                source,
            })?;

            let schema = route.schema.as_ref().map(SchemaSource::resolve);
            let compiled = CompiledRoute {
                name: route.name,
                path: route.path,
                schema,
                mounted: route.mounted,
                middlewares: route.middlewares,
                handler: route.handler,
            };
            table.push(RouteEntry::new(route.method, matcher, compiled));
        }

        tracing::debug!(routes = table.len(), "router compiled");
        Ok(Dispatcher::new(table, self.middlewares))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_core::{handler_fn, FieldTarget, HandlerError, RequestContext};
    use meridian_middleware::sync_middleware;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn noop() -> impl Handler {
        handler_fn(|_ctx: RequestContext| async move { Ok::<_, HandlerError>(json!(null)) })
    }

    fn paths(router: &Router) -> Vec<String> {
        router.routes().iter().map(|r| r.path().to_string()).collect()
    }

    #[test]
    fn test_paths_are_normalized() {
        let router = Router::new()
            .route(RouteDefinition::get("users/", noop()))
            .route(RouteDefinition::get("", noop()));
        assert_eq!(paths(&router), vec!["/users", "/"]);
    }

    #[test]
    fn test_router_prefix_applies_to_routes() {
        let router = Router::with_prefix("/api/").route(RouteDefinition::get("/items", noop()));
        assert_eq!(paths(&router), vec!["/api/items"]);
    }

    #[test]
    fn test_mount_prefixes_and_preserves_order() {
        let sub = Router::new()
            .route(RouteDefinition::get("/health", noop()))
            .route(RouteDefinition::get("/ready", noop()));
        let router = Router::new()
            .route(RouteDefinition::get("/", noop()))
            .mount("/v1", sub);

        assert_eq!(paths(&router), vec!["/", "/v1/health", "/v1/ready"]);
    }

    #[test]
    fn test_merge_keeps_paths() {
        let sub = Router::with_prefix("/admin").route(RouteDefinition::delete("/cache", noop()));
        let router = Router::new().merge(sub);
        assert_eq!(paths(&router), vec!["/admin/cache"]);
        assert_eq!(*router.routes()[0].method(), Method::DELETE);
    }

    #[test]
    fn test_mount_carries_sub_router_middleware_separately() {
        let sub = Router::new()
            .middleware(sync_middleware("auth", |_ctx, _sink| Ok(None)))
            .route(
                RouteDefinition::get("/me", noop())
                    .middleware(sync_middleware("audit", |_ctx, _sink| Ok(None))),
            );
        let router = Router::new().mount("/account", sub);

        assert!(router.middlewares().is_empty());
        assert_eq!(router.routes()[0].mounted.names(), vec!["auth"]);
        assert_eq!(router.routes()[0].middlewares.names(), vec!["audit"]);
    }

    #[test]
    fn test_nested_mounts_run_outer_middleware_first() {
        let inner = Router::new()
            .middleware(sync_middleware("inner", |_ctx, _sink| Ok(None)))
            .route(RouteDefinition::get("/x", noop()));
        let outer = Router::new()
            .middleware(sync_middleware("outer", |_ctx, _sink| Ok(None)))
            .mount("/in", inner);
        let router = Router::new().mount("/out", outer);

        assert_eq!(paths(&router), vec!["/out/in/x"]);
        assert_eq!(router.routes()[0].mounted.names(), vec!["outer", "inner"]);
    }

    #[test]
    fn test_compile_rejects_duplicate_params() {
        let err = Router::new()
            .route(RouteDefinition::get("/a/:id/b/:id", noop()))
            .compile()
            .unwrap_err();
        assert_eq!(err.path, "/a/:id/b/:id");
        assert!(matches!(err.source, PatternError::DuplicateParam { .. }));
    }

    #[test]
    fn test_lazy_schema_resolved_once_at_compile() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let router = Router::new().route(RouteDefinition::post("/items", noop()).lazy_schema(
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Schema::new().body(meridian_core::FnValidator::new(|v| Ok(v.clone())))
            },
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let dispatcher = router.compile().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(dispatcher.manifest()[0].schema, vec![FieldTarget::Body]);
    }
}
