//! Ordered middleware chains.

use std::fmt;
use std::sync::Arc;

use meridian_core::{HandlerError, RequestContext, ResponseSink};
use serde_json::Value;

use crate::middleware::Middleware;

/// A type-erased middleware that can be stored in a chain.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// How a chain run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Every step passed through.
    Continue,
    /// A step produced a value for the success modifier.
    ShortCircuit(Value),
    /// A step finalized the response itself.
    Ended,
}

impl Outcome {
    /// Returns true if processing should go on.
    pub fn is_continue(&self) -> bool {
        matches!(self, Self::Continue)
    }
}

/// An ordered list of middleware steps.
///
/// Chains are cheap to clone; steps are shared.
#[derive(Clone, Default)]
pub struct MiddlewareChain {
    steps: Vec<BoxedMiddleware>,
}

impl MiddlewareChain {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a step.
    pub fn push(&mut self, middleware: impl Middleware) {
        self.steps.push(Arc::new(middleware));
    }

    /// Appends an already shared step.
    pub fn push_arc(&mut self, middleware: BoxedMiddleware) {
        self.steps.push(middleware);
    }

    /// Appends a step, builder style.
    #[must_use]
    pub fn with(mut self, middleware: impl Middleware) -> Self {
        self.push(middleware);
        self
    }

    /// Returns the number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns true if the chain has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Returns the step names, in order.
    pub fn names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|m| m.name()).collect()
    }

    /// Iterates over the steps.
    pub fn iter(&self) -> impl Iterator<Item = &BoxedMiddleware> {
        self.steps.iter()
    }

    /// Runs every step in order until one stops the chain.
    ///
    /// A finalized sink takes precedence over a returned value: a step that
    /// both wrote the response and returned a value ends the chain as
    /// [`Outcome::Ended`].
    pub async fn run(
        &self,
        ctx: &RequestContext,
        sink: &mut ResponseSink,
    ) -> Result<Outcome, HandlerError> {
        if sink.is_finalized() {
            return Ok(Outcome::Ended);
        }

        for step in &self.steps {
            let result = step.call(ctx, sink).await;

            let value = match result {
                Ok(value) => value,
                Err(err) => {
                    tracing::debug!(middleware = step.name(), error = %err, "middleware failed");
                    return Err(err);
                }
            };

            if sink.is_finalized() {
                tracing::trace!(middleware = step.name(), "middleware finalized the response");
                return Ok(Outcome::Ended);
            }

            if let Some(value) = value {
                tracing::trace!(middleware = step.name(), "middleware short-circuited");
                return Ok(Outcome::ShortCircuit(value));
            }
        }

        Ok(Outcome::Continue)
    }
}

impl fmt::Debug for MiddlewareChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareChain")
            .field("steps", &self.names())
            .finish()
    }
}
