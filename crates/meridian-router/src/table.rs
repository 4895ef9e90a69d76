//! Ordered first-match route table.

use http::Method;

use crate::matcher::{Matcher, PatternError};
use crate::params::Params;

/// One registered route: method, compiled pattern and the caller's value.
#[derive(Debug, Clone)]
pub struct RouteEntry<T> {
    method: Method,
    matcher: Matcher,
    value: T,
}

impl<T> RouteEntry<T> {
    /// Creates an entry from an already compiled matcher.
    pub fn new(method: Method, matcher: Matcher, value: T) -> Self {
        Self {
            method,
            matcher,
            value,
        }
    }

    /// Returns the route's method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the compiled matcher.
    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    /// Returns the stored value.
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Returns true if `method` names this entry's method, ignoring ASCII case.
    pub fn accepts_method(&self, method: &str) -> bool {
        self.method.as_str().eq_ignore_ascii_case(method)
    }
}

/// Ordered collection of routes where the first registered match wins.
///
/// Lookups scan entries in insertion order. A route whose path matches but
/// whose method differs is skipped and scanning continues.
///
/// # Example
///
/// ```rust
/// use meridian_router::RouteTable;
/// use http::Method;
///
/// let mut table = RouteTable::new();
/// table.insert(Method::GET, "/items/:id", "first").unwrap();
/// table.insert(Method::GET, "/items/:key", "second").unwrap();
///
/// let (value, params) = table.lookup("get", "/items/9").unwrap();
/// assert_eq!(*value, "first");
/// assert_eq!(params.get("id"), Some("9"));
/// ```
#[derive(Debug, Clone)]
pub struct RouteTable<T> {
    entries: Vec<RouteEntry<T>>,
}

impl<T> Default for RouteTable<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> RouteTable<T> {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles `pattern` and appends a route.
    pub fn insert(&mut self, method: Method, pattern: &str, value: T) -> Result<(), PatternError> {
        let matcher = Matcher::compile(pattern)?;
        self.entries.push(RouteEntry::new(method, matcher, value));
        Ok(())
    }

    /// Appends a pre-built entry.
    pub fn push(&mut self, entry: RouteEntry<T>) {
        self.entries.push(entry);
    }

    /// Finds the first route accepting `method` and `path`.
    pub fn lookup(&self, method: &str, path: &str) -> Option<(&T, Params)> {
        self.lookup_entry(method, path)
            .map(|(entry, params)| (&entry.value, params))
    }

    /// Like [`lookup`](Self::lookup) but returns the whole entry.
    pub fn lookup_entry(&self, method: &str, path: &str) -> Option<(&RouteEntry<T>, Params)> {
        self.entries
            .iter()
            .filter(|entry| entry.accepts_method(method))
            .find_map(|entry| entry.matcher.test(path).map(|params| (entry, params)))
    }

    /// Returns the methods of every route whose pattern matches `path`.
    ///
    /// Methods appear once each, in registration order.
    pub fn allowed_methods(&self, path: &str) -> Vec<Method> {
        let mut methods: Vec<Method> = Vec::new();
        for entry in &self.entries {
            if entry.matcher.is_match(path) && !methods.contains(&entry.method) {
                methods.push(entry.method.clone());
            }
        }
        methods
    }

    /// Returns the number of routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no routes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over entries in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &RouteEntry<T>> {
        self.entries.iter()
    }
}

impl<T> FromIterator<RouteEntry<T>> for RouteTable<T> {
    fn from_iter<I: IntoIterator<Item = RouteEntry<T>>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RouteTable<&'static str> {
        let mut table = RouteTable::new();
        table.insert(Method::GET, "/", "root").unwrap();
        table.insert(Method::GET, "/users", "listUsers").unwrap();
        table.insert(Method::POST, "/users", "createUser").unwrap();
        table.insert(Method::GET, "/users/:id", "getUser").unwrap();
        table.insert(Method::GET, "/users/me", "getMe").unwrap();
        table
    }

    #[test]
    fn test_first_match_wins() {
        let table = table();
        let (value, params) = table.lookup("GET", "/users/me").unwrap();
        assert_eq!(*value, "getUser");
        assert_eq!(params.get("id"), Some("me"));
    }

    #[test]
    fn test_method_is_case_insensitive() {
        let table = table();
        assert_eq!(*table.lookup("post", "/users").unwrap().0, "createUser");
        assert_eq!(*table.lookup("Get", "/").unwrap().0, "root");
    }

    #[test]
    fn test_method_mismatch_is_a_miss() {
        let table = table();
        assert!(table.lookup("DELETE", "/").is_none());
        assert!(table.lookup("PUT", "/users").is_none());
    }

    #[test]
    fn test_allowed_methods() {
        let table = table();
        assert_eq!(table.allowed_methods("/users"), vec![Method::GET, Method::POST]);
        assert!(table.allowed_methods("/nothing").is_empty());
    }

    #[test]
    fn test_lookup_entry_exposes_matcher() {
        let table = table();
        let (entry, _) = table.lookup_entry("GET", "/users/1").unwrap();
        assert_eq!(entry.matcher().pattern(), "/users/:id");
        assert_eq!(entry.method(), Method::GET);
    }

    #[test]
    fn test_insert_rejects_bad_pattern() {
        let mut table: RouteTable<()> = RouteTable::new();
        assert!(table.insert(Method::GET, "/a/:x/:x", ()).is_err());
        assert!(table.is_empty());
    }
}
