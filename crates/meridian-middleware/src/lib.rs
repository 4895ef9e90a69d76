//! # Meridian Middleware
//!
//! Ordered middleware chains and the per-field validation pipeline.
//!
//! ## Chain semantics
//!
//! A [`MiddlewareChain`] runs its steps in registration order. After each
//! step exactly one of these holds:
//!
//! | Step result | Sink | Chain outcome |
//! |---|---|---|
//! | any | finalized | [`Outcome::Ended`]: the step owns the response |
//! | `Ok(Some(value))` | open | [`Outcome::ShortCircuit`]: `value` goes to the success modifier |
//! | `Ok(None)` | open | next step, or [`Outcome::Continue`] after the last |
//! | `Err(error)` | any | the chain stops and returns the error |
//!
//! Chains run at two levels with identical semantics: router-level chains
//! before route matching and route-level chains after validation.
//!
//! ## Validation
//!
//! [`ValidationPipeline`] checks `params`, `query`, `body` and `headers` in
//! that order, stops at the first failure, and merges each validator's
//! output back into the context.
//!
//! ## Example
//!
//! ```
//! use meridian_middleware::{sync_middleware, MiddlewareChain, Outcome};
//! use meridian_core::{RequestContext, ResponseSink};
//! use http::Method;
//! use serde_json::json;
//!
//! let chain = MiddlewareChain::new()
//!     .with(sync_middleware("noop", |_ctx, _sink| Ok(None)))
//!     .with(sync_middleware("cached", |_ctx, _sink| Ok(Some(json!({ "hit": true })))));
//!
//! let ctx = RequestContext::new(Method::GET, "/");
//! let mut sink = ResponseSink::new();
//! let outcome = tokio_test::block_on(chain.run(&ctx, &mut sink)).unwrap();
//! assert_eq!(outcome, Outcome::ShortCircuit(json!({ "hit": true })));
//! ```

#![doc(html_root_url = "https://docs.rs/meridian-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod chain;
pub mod middleware;
pub mod stages;

pub use chain::{BoxedMiddleware, MiddlewareChain, Outcome};
pub use middleware::{middleware_fn, sync_middleware, BoxFuture, FnMiddleware, Middleware, SyncMiddleware};
pub use stages::validation::{merge_field, ValidationPipeline};
