//! Request context types.
//!
//! A [`RequestContext`] is built from the raw transport request and then
//! rebuilt, one field at a time, by each pipeline stage. Stages never mutate
//! a shared request: they take a context by value and return a new one.

use http::{HeaderMap, Method};
use meridian_router::Params;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::payload::Payload;
use crate::schema::FieldTarget;

/// A unique identifier for each request, using UUID v7.
///
/// UUID v7 is time-ordered, which keeps log lines for one request easy to
/// correlate and sort.
///
/// # Example
///
/// ```
/// use meridian_core::RequestId;
///
/// let id = RequestId::new();
/// assert_eq!(id.to_string().len(), 36);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new request ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Per-request state handed to middleware, validators and handlers.
///
/// The four derived fields (`params`, `query`, `body`, `headers`) are JSON
/// values so that validators can coerce and default them. `body` is `null`
/// until the dispatcher has read the payload, and stays `null` when no
/// payload was sent or it was not valid JSON.
///
/// # Example
///
/// ```
/// use meridian_core::RequestContext;
/// use http::Method;
/// use serde_json::json;
///
/// let ctx = RequestContext::new(Method::POST, "/users")
///     .with_query(json!({ "page": "2" }))
///     .with_body(json!({ "name": "alice" }));
///
/// assert_eq!(ctx.path(), "/users");
/// assert_eq!(ctx.query()["page"], "2");
/// assert_eq!(ctx.body()["name"], "alice");
/// ```
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: RequestId,
    method: Method,
    path: String,
    raw_query: Option<String>,
    route_name: Option<String>,
    params: Value,
    query: Value,
    body: Value,
    headers: Value,
    payload: Payload,
}

impl RequestContext {
    /// Creates a context for `method` and `path` with empty derived fields.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            request_id: RequestId::new(),
            method,
            path: path.into(),
            raw_query: None,
            route_name: None,
            params: Value::Object(Map::new()),
            query: Value::Object(Map::new()),
            body: Value::Null,
            headers: Value::Object(Map::new()),
            payload: Payload::empty(),
        }
    }

    /// Builds the initial context from transport request parts.
    ///
    /// Header names are lower-cased; repeated headers are joined with `", "`.
    /// The query string is parsed with [`parse_query`].
    #[must_use]
    pub fn from_parts(parts: &http::request::Parts, payload: Payload) -> Self {
        let raw_query = parts.uri.query().map(ToString::to_string);
        let query = raw_query.as_deref().map_or_else(|| Value::Object(Map::new()), parse_query);

        Self {
            raw_query,
            query,
            headers: headers_to_value(&parts.headers),
            payload,
            ..Self::new(parts.method.clone(), parts.uri.path())
        }
    }

    /// Returns the request ID.
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the request method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request path, without the query string.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the raw query string, if one was sent.
    pub fn raw_query(&self) -> Option<&str> {
        self.raw_query.as_deref()
    }

    /// Returns the name of the matched route, once matching has happened.
    pub fn route_name(&self) -> Option<&str> {
        self.route_name.as_deref()
    }

    /// Returns the path parameters.
    pub fn params(&self) -> &Value {
        &self.params
    }

    /// Returns the parsed query.
    pub fn query(&self) -> &Value {
        &self.query
    }

    /// Returns the parsed body (`null` when absent).
    pub fn body(&self) -> &Value {
        &self.body
    }

    /// Returns the headers as a JSON object keyed by lower-case name.
    pub fn headers(&self) -> &Value {
        &self.headers
    }

    /// Returns the request body stream.
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Returns one derived field.
    pub fn field(&self, target: FieldTarget) -> &Value {
        match target {
            FieldTarget::Params => &self.params,
            FieldTarget::Query => &self.query,
            FieldTarget::Body => &self.body,
            FieldTarget::Headers => &self.headers,
        }
    }

    /// Returns a path parameter as a string, if present.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).and_then(Value::as_str)
    }

    /// Returns a header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(name.to_ascii_lowercase())
            .and_then(Value::as_str)
    }

    /// Replaces the path parameters.
    #[must_use]
    pub fn with_params(mut self, params: Value) -> Self {
        self.params = params;
        self
    }

    /// Replaces the path parameters from a matcher's captures.
    #[must_use]
    pub fn with_path_params(self, params: Params) -> Self {
        let map: Map<String, Value> = params
            .into_iter()
            .map(|(name, value)| (name, Value::String(value)))
            .collect();
        self.with_params(Value::Object(map))
    }

    /// Replaces the query.
    #[must_use]
    pub fn with_query(mut self, query: Value) -> Self {
        self.query = query;
        self
    }

    /// Replaces the body.
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    /// Replaces the headers.
    #[must_use]
    pub fn with_headers(mut self, headers: Value) -> Self {
        self.headers = headers;
        self
    }

    /// Replaces one derived field.
    #[must_use]
    pub fn with_field(self, target: FieldTarget, value: Value) -> Self {
        match target {
            FieldTarget::Params => self.with_params(value),
            FieldTarget::Query => self.with_query(value),
            FieldTarget::Body => self.with_body(value),
            FieldTarget::Headers => self.with_headers(value),
        }
    }

    /// Records the matched route's name.
    #[must_use]
    pub fn with_route_name(mut self, name: Option<String>) -> Self {
        self.route_name = name;
        self
    }

    /// Replaces the body stream.
    #[must_use]
    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    /// Deserializes the path parameters into `T`.
    pub fn params_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.params)
    }

    /// Deserializes the query into `T`.
    pub fn query_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.query)
    }

    /// Deserializes the body into `T`.
    pub fn body_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.body)
    }

    /// Deserializes the headers into `T`.
    pub fn headers_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.headers)
    }
}

/// Parses a raw query string into a JSON object.
///
/// A key that appears once maps to a string; a key that repeats maps to an
/// array of strings in order of appearance. A query that cannot be decoded
/// yields an empty object.
///
/// # Example
///
/// ```
/// use meridian_core::parse_query;
/// use serde_json::json;
///
/// assert_eq!(parse_query("a=1&b=x%20y&a=2"), json!({ "a": ["1", "2"], "b": "x y" }));
/// ```
pub fn parse_query(raw: &str) -> Value {
    let pairs: Vec<(String, String)> = match serde_urlencoded::from_str(raw) {
        Ok(pairs) => pairs,
        Err(err) => {
            tracing::debug!(error = %err, "ignoring undecodable query string");
            Vec::new()
        }
    };

    let mut map = Map::new();
    for (key, value) in pairs {
        match map.get_mut(&key) {
            Some(Value::Array(values)) => values.push(Value::String(value)),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, Value::String(value)]);
            }
            None => {
                map.insert(key, Value::String(value));
            }
        }
    }
    Value::Object(map)
}

fn headers_to_value(headers: &HeaderMap) -> Value {
    let mut map = Map::new();
    for name in headers.keys() {
        let joined = headers
            .get_all(name)
            .iter()
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
            .collect::<Vec<_>>()
            .join(", ");
        map.insert(name.as_str().to_string(), Value::String(joined));
    }
    Value::Object(map)
}
