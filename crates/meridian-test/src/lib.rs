//! # Meridian Test
//!
//! In-memory testing for Meridian routers. Requests go straight into a
//! compiled [`Dispatcher`](meridian_server::Dispatcher), so tests exercise
//! the whole pipeline without binding a port.
//!
//! ## Example
//!
//! ```rust
//! use meridian_core::{handler_fn, HandlerError, RequestContext};
//! use meridian_server::{RouteDefinition, Router};
//! use meridian_test::TestClient;
//! use http::StatusCode;
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let dispatcher = Router::new()
//!     .route(RouteDefinition::get(
//!         "/users/:id",
//!         handler_fn(|ctx: RequestContext| async move {
//!             Ok::<_, HandlerError>(json!({ "id": ctx.param("id") }))
//!         }),
//!     ))
//!     .compile()
//!     .unwrap();
//!
//! let client = TestClient::new(dispatcher);
//! let response = client.get("/users/42").send().await;
//!
//! response.assert_status(StatusCode::OK);
//! assert_eq!(response.data(), json!({ "id": "42" }));
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/meridian-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod request;
mod response;

pub use client::{TestClient, TestClientRequest};
pub use error::TestError;
pub use request::TestRequest;
pub use response::TestResponse;
