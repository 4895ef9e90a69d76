//! Per-field request validation.
//!
//! Runs between route matching and the route's own middleware:
//!
//! ```text
//! Match → Body → [Validation: params → query → body → headers] → Route middleware → Handler
//! ```
//!
//! Each declared validator sees the current value of its field. On success
//! the output is merged back into the context, which is how validators
//! coerce (`"7"` to `7`) and fill defaults. On failure the pipeline stops
//! and no later field is checked.

use meridian_core::{FieldTarget, RequestContext, Schema, ValidationError};
use serde_json::Value;

/// Validates a request against a route's [`Schema`].
///
/// # Example
///
/// ```
/// use meridian_middleware::ValidationPipeline;
/// use meridian_core::{FnValidator, Issue, RequestContext, Schema};
/// use http::Method;
/// use serde_json::json;
///
/// let schema = Schema::new().params(FnValidator::new(|v| {
///     v["id"]
///         .as_str()
///         .and_then(|s| s.parse::<u64>().ok())
///         .map(|id| json!({ "id": id }))
///         .ok_or_else(|| vec![Issue::new("expected a positive integer").at("id")])
/// }));
/// let pipeline = ValidationPipeline::new(&schema, "getUser");
///
/// let ctx = RequestContext::new(Method::GET, "/users/7").with_params(json!({ "id": "7" }));
/// let ctx = tokio_test::block_on(pipeline.validate(ctx)).unwrap();
/// assert_eq!(ctx.params(), &json!({ "id": 7 }));
///
/// let bad = RequestContext::new(Method::GET, "/users/x").with_params(json!({ "id": "x" }));
/// let err = tokio_test::block_on(pipeline.validate(bad)).unwrap_err();
/// assert_eq!(err.route, "getUser");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ValidationPipeline<'a> {
    schema: &'a Schema,
    route: &'a str,
}

impl<'a> ValidationPipeline<'a> {
    /// Creates a pipeline for one route's schema.
    ///
    /// `route` labels any [`ValidationError`] produced.
    pub fn new(schema: &'a Schema, route: &'a str) -> Self {
        Self { schema, route }
    }

    /// Runs the declared validators in order.
    ///
    /// Returns the rebuilt context, or the first field's failure.
    pub async fn validate(&self, ctx: RequestContext) -> Result<RequestContext, ValidationError> {
        let mut ctx = ctx;

        for target in FieldTarget::ORDER {
            let Some(validator) = self.schema.get(target) else {
                continue;
            };

            let output = match validator.validate(ctx.field(target)).await {
                Ok(output) => output,
                Err(issues) => {
                    tracing::debug!(
                        route = self.route,
                        field = target.as_str(),
                        issues = issues.len(),
                        "request validation failed"
                    );
                    return Err(ValidationError {
                        target,
                        route: self.route.to_string(),
                        issues,
                    });
                }
            };

            if target == FieldTarget::Body && ctx.body().is_null() {
                tracing::trace!(route = self.route, "absent body left unmerged");
                continue;
            }

            let merged = merge_field(ctx.field(target), output);
            ctx = ctx.with_field(target, merged);
        }

        Ok(ctx)
    }
}

/// Merges a validator's output into the current field value.
///
/// Two objects are merged shallowly, with the output's keys winning and keys
/// the validator did not return kept as they were. Any other combination is
/// a replacement by the output.
///
/// # Example
///
/// ```
/// use meridian_middleware::merge_field;
/// use serde_json::json;
///
/// let merged = merge_field(&json!({ "id": "7", "extra": true }), json!({ "id": 7 }));
/// assert_eq!(merged, json!({ "id": 7, "extra": true }));
///
/// assert_eq!(merge_field(&json!("7"), json!(7)), json!(7));
/// ```
pub fn merge_field(current: &Value, output: Value) -> Value {
    match (current, output) {
        (Value::Object(existing), Value::Object(updates)) => {
            let mut merged = existing.clone();
            for (key, value) in updates {
                merged.insert(key, value);
            }
            Value::Object(merged)
        }
        (_, output) => output,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;
    use meridian_core::{AsyncFnValidator, FnValidator, Issue, Validator};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counted_identity(counter: &Arc<AtomicUsize>) -> impl Validator {
        let counter = Arc::clone(counter);
        FnValidator::new(move |v: &Value| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(v.clone())
        })
    }

    fn rejecting() -> impl Validator {
        FnValidator::new(|_v: &Value| Err(vec![Issue::new("rejected")]))
    }

    fn ctx() -> RequestContext {
        RequestContext::new(Method::POST, "/items/1")
            .with_params(json!({ "id": "1" }))
            .with_query(json!({ "page": "2" }))
            .with_body(json!({ "name": "widget" }))
            .with_headers(json!({ "x-tenant": "acme" }))
    }

    #[tokio::test]
    async fn test_no_schema_is_identity() {
        let schema = Schema::new();
        let out = ValidationPipeline::new(&schema, "r").validate(ctx()).await.unwrap();
        assert_eq!(out.params(), &json!({ "id": "1" }));
        assert_eq!(out.body(), &json!({ "name": "widget" }));
    }

    #[tokio::test]
    async fn test_params_failure_skips_remaining_fields() {
        let later = Arc::new(AtomicUsize::new(0));
        let schema = Schema::new()
            .params(rejecting())
            .query(counted_identity(&later))
            .body(counted_identity(&later))
            .headers(counted_identity(&later));

        let err = ValidationPipeline::new(&schema, "updateItem")
            .validate(ctx())
            .await
            .unwrap_err();

        assert_eq!(err.target, FieldTarget::Params);
        assert_eq!(err.route, "updateItem");
        assert_eq!(err.issues, vec![Issue::new("rejected")]);
        assert_eq!(later.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_fields_are_validated_in_order() {
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let mut schema = Schema::new();
        let reversed = [
            FieldTarget::Headers,
            FieldTarget::Body,
            FieldTarget::Query,
            FieldTarget::Params,
        ];
        for target in reversed {
            let seen = Arc::clone(&seen);
            schema = schema.with(
                target,
                Arc::new(FnValidator::new(move |v: &Value| {
                    seen.lock().push(target);
                    Ok(v.clone())
                })),
            );
        }

        ValidationPipeline::new(&schema, "r").validate(ctx()).await.unwrap();
        assert_eq!(*seen.lock(), FieldTarget::ORDER.to_vec());
    }

    #[tokio::test]
    async fn test_outputs_are_merged() {
        let schema = Schema::new()
            .params(FnValidator::new(|v: &Value| {
                let id = v["id"].as_str().and_then(|s| s.parse::<i64>().ok());
                Ok(json!({ "id": id }))
            }))
            .query(FnValidator::new(|_v: &Value| Ok(json!({ "size": 20 }))))
            .body(AsyncFnValidator::new(|_v: Value| async move {
                Ok::<_, Vec<Issue>>(json!({ "quantity": 1 }))
            }));

        let out = ValidationPipeline::new(&schema, "r").validate(ctx()).await.unwrap();
        assert_eq!(out.params(), &json!({ "id": 1 }));
        assert_eq!(out.query(), &json!({ "page": "2", "size": 20 }));
        assert_eq!(out.body(), &json!({ "name": "widget", "quantity": 1 }));
        assert_eq!(out.headers(), &json!({ "x-tenant": "acme" }));
    }

    #[tokio::test]
    async fn test_absent_body_is_not_merged() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let schema = Schema::new().body(FnValidator::new(move |v: &Value| {
            counter.fetch_add(1, Ordering::SeqCst);
            assert!(v.is_null());
            Ok(json!({ "defaulted": true }))
        }));

        let input = ctx().with_body(Value::Null);
        let out = ValidationPipeline::new(&schema, "r").validate(input).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(out.body().is_null());
    }

    #[tokio::test]
    async fn test_absent_body_can_still_be_rejected() {
        let schema = Schema::new().body(rejecting());
        let err = ValidationPipeline::new(&schema, "r")
            .validate(ctx().with_body(Value::Null))
            .await
            .unwrap_err();
        assert_eq!(err.target, FieldTarget::Body);
    }

    #[test]
    fn test_merge_field_replaces_non_objects() {
        assert_eq!(merge_field(&json!([1, 2]), json!({ "a": 1 })), json!({ "a": 1 }));
        assert_eq!(merge_field(&json!({ "a": 1 }), json!("x")), json!("x"));
    }
}
