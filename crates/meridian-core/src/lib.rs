//! # Meridian Core
//!
//! Core types shared by every stage of the Meridian request pipeline.
//!
//! - [`RequestContext`] - immutable per-request value rebuilt at each stage
//! - [`Payload`] - the request body stream, read at most once
//! - [`ResponseSink`] - status, headers and body with a finalize-once guard
//! - [`Schema`] / [`Validator`] / [`SchemaSource`] - per-field validation contract
//! - [`Handler`] - route handler trait with closure adapters
//! - [`HandlerError`], [`ValidationError`], [`DispatchError`] - error taxonomy
//!
//! ## Example
//!
//! ```rust
//! use meridian_core::{RequestContext, Schema, FnValidator, Issue, FieldTarget};
//! use http::Method;
//! use serde_json::json;
//!
//! let ctx = RequestContext::new(Method::GET, "/users/7")
//!     .with_params(json!({ "id": "7" }));
//! assert_eq!(ctx.param("id"), Some("7"));
//!
//! let schema = Schema::new().params(FnValidator::new(|value| {
//!     match value["id"].as_str().and_then(|s| s.parse::<u64>().ok()) {
//!         Some(id) => Ok(json!({ "id": id })),
//!         None => Err(vec![Issue::new("expected a number").at("id")]),
//!     }
//! }));
//! assert_eq!(schema.declared(), vec![FieldTarget::Params]);
//! ```

#![doc(html_root_url = "https://docs.rs/meridian-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod error;
mod handler;
mod payload;
mod response;
mod schema;

pub use context::{parse_query, RequestContext, RequestId};
pub use error::{
    DispatchError, HandlerError, HandlerResult, ValidationError, INTERNAL_ERROR_MESSAGE,
};
pub use handler::{handler_fn, raw_handler, BoxFuture, FnHandler, Handler, RawHandler};
pub use payload::{BoxError, Payload, PayloadError};
pub use response::{ResponseSink, CONTENT_TYPE_JSON};
pub use schema::{
    AsyncFnValidator, FieldTarget, FnValidator, Issue, Schema, SchemaSource, SerdeValidator,
    Validator,
};
