//! Per-field request schemas.
//!
//! A [`Schema`] holds up to four independent validators, one per derived
//! request field. Validators are opaque: each maps an input JSON value to a
//! transformed value or a list of [`Issue`]s. Anything that can express that
//! contract plugs in, from a closure to a serde type ([`SerdeValidator`]).

use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::handler::BoxFuture;

/// One derived request field a validator can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldTarget {
    /// Path parameters
    Params,
    /// Parsed query string
    Query,
    /// Parsed JSON body
    Body,
    /// Request headers
    Headers,
}

impl FieldTarget {
    /// All targets, in validation order.
    pub const ORDER: [FieldTarget; 4] = [Self::Params, Self::Query, Self::Body, Self::Headers];

    /// Returns the lower-case field name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Params => "params",
            Self::Query => "query",
            Self::Body => "body",
            Self::Headers => "headers",
        }
    }
}

impl fmt::Display for FieldTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single validation problem.
///
/// Serialized as an element of the `errors` array in the invalid-request
/// envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Location of the problem inside the validated value.
    #[serde(default)]
    pub path: Vec<String>,
    /// Human-readable description.
    pub message: String,
    /// Optional machine-readable code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl Issue {
    /// Creates an issue at the root of the value.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            path: Vec::new(),
            message: message.into(),
            code: None,
        }
    }

    /// Appends a path segment.
    #[must_use]
    pub fn at(mut self, segment: impl Into<String>) -> Self {
        self.path.push(segment.into());
        self
    }

    /// Sets the machine-readable code.
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

/// Validates one request field.
///
/// Returning `Ok(value)` lets the validator coerce or default the input;
/// the pipeline merges the output back into the context. Validators may
/// suspend.
pub trait Validator: Send + Sync + 'static {
    /// Validates `value`.
    fn validate<'a>(&'a self, value: &'a Value) -> BoxFuture<'a, Result<Value, Vec<Issue>>>;
}

/// Validator built from a synchronous closure.
///
/// # Example
///
/// ```rust
/// use meridian_core::{FnValidator, Issue};
/// use serde_json::Value;
///
/// let non_empty = FnValidator::new(|value: &Value| {
///     if value.as_object().is_some_and(|o| !o.is_empty()) {
///         Ok(value.clone())
///     } else {
///         Err(vec![Issue::new("must not be empty")])
///     }
/// });
/// # let _ = non_empty;
/// ```
pub struct FnValidator<F> {
    func: F,
}

impl<F> FnValidator<F>
where
    F: Fn(&Value) -> Result<Value, Vec<Issue>> + Send + Sync + 'static,
{
    /// Wraps a closure.
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> Validator for FnValidator<F>
where
    F: Fn(&Value) -> Result<Value, Vec<Issue>> + Send + Sync + 'static,
{
    fn validate<'a>(&'a self, value: &'a Value) -> BoxFuture<'a, Result<Value, Vec<Issue>>> {
        let result = (self.func)(value);
        Box::pin(async move { result })
    }
}

/// Validator built from a closure returning a future.
///
/// The closure receives an owned copy of the input.
pub struct AsyncFnValidator<F> {
    func: F,
}

impl<F, Fut> AsyncFnValidator<F>
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, Vec<Issue>>> + Send + 'static,
{
    /// Wraps a closure.
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F, Fut> Validator for AsyncFnValidator<F>
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, Vec<Issue>>> + Send + 'static,
{
    fn validate<'a>(&'a self, value: &'a Value) -> BoxFuture<'a, Result<Value, Vec<Issue>>> {
        Box::pin((self.func)(value.clone()))
    }
}

/// Validator that round-trips the value through a serde type.
///
/// Deserialization failures become a single issue. Field defaults declared
/// with `#[serde(default)]` show up in the output, and fields unknown to `T`
/// are dropped from it.
///
/// # Example
///
/// ```rust
/// use meridian_core::{SerdeValidator, Validator};
/// use serde::{Deserialize, Serialize};
/// use serde_json::json;
///
/// #[derive(Serialize, Deserialize)]
/// struct Paging {
///     #[serde(default = "default_size")]
///     size: u32,
/// }
/// fn default_size() -> u32 { 20 }
///
/// let validator = SerdeValidator::<Paging>::new();
/// let input = json!({});
/// let out = tokio_test::block_on(validator.validate(&input)).unwrap();
/// assert_eq!(out, json!({ "size": 20 }));
/// ```
pub struct SerdeValidator<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> SerdeValidator<T> {
    /// Creates the validator.
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for SerdeValidator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Validator for SerdeValidator<T>
where
    T: DeserializeOwned + Serialize + 'static,
{
    fn validate<'a>(&'a self, value: &'a Value) -> BoxFuture<'a, Result<Value, Vec<Issue>>> {
        let result = T::deserialize(value)
            .map_err(|err| vec![Issue::new(err.to_string()).with_code("invalid_type")])
            .and_then(|typed| {
                serde_json::to_value(typed)
                    .map_err(|err| vec![Issue::new(err.to_string()).with_code("serialize")])
            });
        Box::pin(async move { result })
    }
}

/// Up to four validators, one per request field.
///
/// # Example
///
/// ```rust
/// use meridian_core::{Schema, FnValidator, FieldTarget};
///
/// let schema = Schema::new()
///     .query(FnValidator::new(|v| Ok(v.clone())))
///     .headers(FnValidator::new(|v| Ok(v.clone())));
///
/// assert_eq!(schema.declared(), vec![FieldTarget::Query, FieldTarget::Headers]);
/// ```
#[derive(Clone, Default)]
pub struct Schema {
    params: Option<Arc<dyn Validator>>,
    query: Option<Arc<dyn Validator>>,
    body: Option<Arc<dyn Validator>>,
    headers: Option<Arc<dyn Validator>>,
}

impl Schema {
    /// Creates an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the path-parameter validator.
    #[must_use]
    pub fn params(self, validator: impl Validator) -> Self {
        self.with(FieldTarget::Params, Arc::new(validator))
    }

    /// Sets the query validator.
    #[must_use]
    pub fn query(self, validator: impl Validator) -> Self {
        self.with(FieldTarget::Query, Arc::new(validator))
    }

    /// Sets the body validator.
    #[must_use]
    pub fn body(self, validator: impl Validator) -> Self {
        self.with(FieldTarget::Body, Arc::new(validator))
    }

    /// Sets the header validator.
    #[must_use]
    pub fn headers(self, validator: impl Validator) -> Self {
        self.with(FieldTarget::Headers, Arc::new(validator))
    }

    /// Sets the validator for `target`.
    #[must_use]
    pub fn with(mut self, target: FieldTarget, validator: Arc<dyn Validator>) -> Self {
        *self.slot_mut(target) = Some(validator);
        self
    }

    /// Returns the validator for `target`, if declared.
    pub fn get(&self, target: FieldTarget) -> Option<&Arc<dyn Validator>> {
        match target {
            FieldTarget::Params => self.params.as_ref(),
            FieldTarget::Query => self.query.as_ref(),
            FieldTarget::Body => self.body.as_ref(),
            FieldTarget::Headers => self.headers.as_ref(),
        }
    }

    /// Returns the declared targets, in validation order.
    pub fn declared(&self) -> Vec<FieldTarget> {
        FieldTarget::ORDER
            .into_iter()
            .filter(|t| self.get(*t).is_some())
            .collect()
    }

    /// Returns true if no validator is declared.
    pub fn is_empty(&self) -> bool {
        self.declared().is_empty()
    }

    fn slot_mut(&mut self, target: FieldTarget) -> &mut Option<Arc<dyn Validator>> {
        match target {
            FieldTarget::Params => &mut self.params,
            FieldTarget::Query => &mut self.query,
            FieldTarget::Body => &mut self.body,
            FieldTarget::Headers => &mut self.headers,
        }
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("declared", &self.declared())
            .finish()
    }
}

/// A schema given either directly or as a factory.
///
/// Lazy schemas are resolved once when the router is compiled, never per
/// request.
#[derive(Clone)]
pub enum SchemaSource {
    /// A ready schema.
    Static(Schema),
    /// A factory invoked at compile time.
    Lazy(Arc<dyn Fn() -> Schema + Send + Sync>),
}

impl SchemaSource {
    /// Creates a lazy source.
    pub fn lazy<F>(factory: F) -> Self
    where
        F: Fn() -> Schema + Send + Sync + 'static,
    {
        Self::Lazy(Arc::new(factory))
    }

    /// Produces the schema, invoking the factory for lazy sources.
    pub fn resolve(&self) -> Schema {
        match self {
            Self::Static(schema) => schema.clone(),
            Self::Lazy(factory) => factory(),
        }
    }
}

impl From<Schema> for SchemaSource {
    fn from(schema: Schema) -> Self {
        Self::Static(schema)
    }
}

impl fmt::Debug for SchemaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(schema) => f.debug_tuple("Static").field(schema).finish(),
            Self::Lazy(_) => f.write_str("Lazy(..)"),
        }
    }
}
