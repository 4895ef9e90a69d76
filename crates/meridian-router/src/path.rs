//! Path normalisation helpers.
//!
//! Patterns are matched without any trailing-slash handling, so everything
//! that builds a route path (prefix mounting, file-based loaders) goes
//! through [`join_paths`] first.

use http::Method;

/// Methods a file-based route loader recognises as exported handler names.
pub const LOADER_METHODS: [Method; 6] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::HEAD,
];

/// Joins path fragments into a single normalised path.
///
/// Leading and trailing slashes are stripped from every fragment, empty
/// fragments are dropped, and the rest are joined with a single `/` behind
/// a leading `/`.
///
/// # Example
///
/// ```rust
/// use meridian_router::path::join_paths;
///
/// assert_eq!(join_paths(&["/v1/", "/health"]), "/v1/health");
/// assert_eq!(join_paths(&["/", ""]), "/");
/// assert_eq!(join_paths(&["api", "users/:id/"]), "/api/users/:id");
/// ```
#[must_use]
pub fn join_paths<S: AsRef<str>>(parts: &[S]) -> String {
    let joined = parts
        .iter()
        .map(|p| p.as_ref().trim_matches('/'))
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("/");
    format!("/{joined}")
}

/// Normalises a single path. Equivalent to `join_paths(&[path])`.
#[must_use]
pub fn normalize(path: &str) -> String {
    join_paths(&[path])
}

/// Maps an exported symbol name to the HTTP method it registers.
///
/// Only the upper-case names in [`LOADER_METHODS`] are recognised.
#[must_use]
pub fn method_from_symbol(symbol: &str) -> Option<Method> {
    LOADER_METHODS.iter().find(|m| m.as_str() == symbol).cloned()
}

/// Converts one file or directory name into a route path segment.
///
/// `[id]` becomes `:id`, a trailing extension is dropped and `index` maps to
/// the path root. Declaration files (`.d.ts`) and source maps (`.map`)
/// return `None`.
#[must_use]
pub fn segment_from_file_name(file_name: &str) -> Option<String> {
    if file_name.ends_with(".d.ts") || file_name.ends_with(".map") {
        return None;
    }

    let stem = match file_name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => file_name,
    };

    let segment = if let Some(inner) = stem.strip_prefix('[') {
        match inner.split_once(']') {
            Some((name, rest)) if !name.is_empty() => format!(":{name}{rest}"),
            _ => stem.to_string(),
        }
    } else if stem == "index" {
        "/".to_string()
    } else {
        stem.to_string()
    };

    Some(segment)
}

/// Derives the route path for a file found under a routes directory.
///
/// `relative` is the file path relative to the routes root, using `/` as
/// separator. Returns `None` when any component is skipped by
/// [`segment_from_file_name`].
///
/// # Example
///
/// ```rust
/// use meridian_router::path::route_path_from_file;
///
/// assert_eq!(route_path_from_file("/", "index.ts").as_deref(), Some("/"));
/// assert_eq!(
///     route_path_from_file("/api", "users/[userId].ts").as_deref(),
///     Some("/api/users/:userId"),
/// );
/// assert_eq!(route_path_from_file("/", "users.d.ts"), None);
/// ```
#[must_use]
pub fn route_path_from_file(prefix: &str, relative: &str) -> Option<String> {
    let mut parts = vec![prefix.to_string()];
    for component in relative.split('/').filter(|c| !c.is_empty()) {
        parts.push(segment_from_file_name(component)?);
    }
    Some(join_paths(&parts))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_paths() {
        assert_eq!(join_paths::<&str>(&[]), "/");
        assert_eq!(join_paths(&["//a//", "b"]), "/a/b");
        assert_eq!(join_paths(&["/v1", "/", "/health/"]), "/v1/health");
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("users/"), "/users");
        assert_eq!(normalize("/"), "/");
    }

    #[test]
    fn test_method_from_symbol() {
        assert_eq!(method_from_symbol("GET"), Some(Method::GET));
        assert_eq!(method_from_symbol("HEAD"), Some(Method::HEAD));
        assert_eq!(method_from_symbol("get"), None);
        assert_eq!(method_from_symbol("OPTIONS"), None);
    }

    #[test]
    fn test_segment_from_file_name() {
        assert_eq!(segment_from_file_name("[id].ts").as_deref(), Some(":id"));
        assert_eq!(segment_from_file_name("[id]").as_deref(), Some(":id"));
        assert_eq!(segment_from_file_name("index.js").as_deref(), Some("/"));
        assert_eq!(segment_from_file_name("users").as_deref(), Some("users"));
        assert_eq!(segment_from_file_name("types.d.ts"), None);
        assert_eq!(segment_from_file_name("users.js.map"), None);
    }

    #[test]
    fn test_route_path_from_file() {
        assert_eq!(
            route_path_from_file("/", "posts/[postId]/index.ts").as_deref(),
            Some("/posts/:postId")
        );
        assert_eq!(route_path_from_file("v2", "health.ts").as_deref(), Some("/v2/health"));
    }
}
