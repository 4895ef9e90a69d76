//! # Meridian Server
//!
//! Router composition, request dispatch and HTTP serving.
//!
//! - [`Router`] / [`RouteDefinition`] - ordered registration, mounting and merging
//! - [`Dispatcher`] - the compiled router; runs the request pipeline and is
//!   itself a [`Middleware`](meridian_middleware::Middleware)
//! - [`Modifiers`] - the four replaceable response writers
//! - [`Server`] - hyper HTTP/1.1 accept loop with graceful shutdown
//!
//! ## Request pipeline
//!
//! | Stage | On success | On failure |
//! |-------|------------|------------|
//! | Router middleware | next stage | `error` modifier |
//! | Match | next stage | `not_found` modifier |
//! | Mounted router middleware | next stage | `error` modifier |
//! | Body | next stage | never fails; unreadable bodies become `null` |
//! | Validation | next stage | `invalid_request` modifier |
//! | Route middleware | next stage | `error` modifier |
//! | Handler | `success` modifier with the returned value | `error` modifier |
//!
//! A middleware step that returns a value skips straight to the `success`
//! modifier; one that finalizes the response ends the request with no
//! modifier at all.
//!
//! ## Example
//!
//! ```rust
//! use meridian_server::{RouteDefinition, Router};
//! use meridian_core::{handler_fn, HandlerError, RequestContext, ResponseSink};
//! use http::{Method, StatusCode};
//! use serde_json::json;
//!
//! let dispatcher = Router::new()
//!     .route(RouteDefinition::get(
//!         "/",
//!         handler_fn(|_ctx: RequestContext| async move {
//!             Ok::<_, HandlerError>(json!({ "message": "Hello World" }))
//!         }),
//!     ))
//!     .compile()
//!     .unwrap();
//!
//! let mut sink = ResponseSink::new();
//! tokio_test::block_on(dispatcher.dispatch(RequestContext::new(Method::GET, "/"), &mut sink));
//! assert_eq!(sink.status(), StatusCode::OK);
//! ```

#![doc(html_root_url = "https://docs.rs/meridian-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod body;
mod config;
mod dispatcher;
mod modifiers;
mod router;
mod server;
mod shutdown;

pub use body::acquire_body;
pub use config::{ServerConfig, DEFAULT_HTTP_ADDR, DEFAULT_SHUTDOWN_TIMEOUT_SECS};
pub use dispatcher::{Dispatcher, RouteInfo};
pub use modifiers::{
    default_error, default_invalid_request, default_not_found, default_success, ErrorModifier,
    InvalidRequestModifier, Modifiers, NotFoundModifier, SuccessModifier,
};
pub use router::{RouteDefinition, RouteError, Router};
pub use server::{Server, ServerBuilder, ServerError};
pub use shutdown::{ConnectionToken, ConnectionTracker, ShutdownSignal};
