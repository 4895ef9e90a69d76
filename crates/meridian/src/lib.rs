//! # Meridian
//!
//! Declarative HTTP routing for JSON services.
//!
//! - Ordered route registration with `:param` path patterns
//! - Per-route schemas validating `params`, `query`, `body` and `headers`
//! - Router- and route-level middleware chains that can short-circuit
//! - Routers that mount, merge and nest as middleware of other routers
//! - Replaceable response envelopes for success, errors, invalid requests
//!   and misses
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use meridian::prelude::*;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let dispatcher = Router::new()
//!         .route(RouteDefinition::get(
//!             "/",
//!             handler_fn(|_ctx: RequestContext| async move {
//!                 Ok::<_, HandlerError>(json!({ "message": "Hello World" }))
//!             }),
//!         ))
//!         .compile()?;
//!
//!     Server::builder()
//!         .http_addr("127.0.0.1:8080")
//!         .dispatcher(dispatcher)
//!         .build()
//!         .run()
//!         .await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Request → Router middleware → Match → Body → Validation → Route middleware → Handler
//!                                                                               ↓
//! Response ←──────────────────────────── Modifiers (success / error / invalid / not found)
//! ```

#![doc(html_root_url = "https://docs.rs/meridian/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub use meridian_config as config;
pub use meridian_core as core;
pub use meridian_middleware as middleware;
pub use meridian_router as router;
pub use meridian_server as server;
pub use meridian_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// ```rust
/// use meridian::prelude::*;
/// ```
pub mod prelude {
    pub use meridian_config::{ConfigLoader, MeridianConfig};
    pub use meridian_core::{
        handler_fn, raw_handler, AsyncFnValidator, FieldTarget, FnValidator, Handler,
        HandlerError, HandlerResult, Issue, RequestContext, ResponseSink, Schema, SchemaSource,
        SerdeValidator, Validator,
    };
    pub use meridian_middleware::{middleware_fn, sync_middleware, Middleware};
    pub use meridian_server::{
        Dispatcher, Modifiers, RouteDefinition, RouteError, Router, Server, ShutdownSignal,
    };
    pub use meridian_telemetry::{init_logging, LogConfig};
}
