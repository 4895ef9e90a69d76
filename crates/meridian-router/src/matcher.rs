//! Path pattern compilation.
//!
//! A [`Matcher`] is the compiled form of a path pattern such as
//! `/users/:id/posts/:postId`. Compilation is pure: compiling the same
//! pattern twice produces matchers that behave identically.

use std::fmt;

use regex::Regex;
use thiserror::Error;

use crate::params::Params;

/// Capture group used for every `:name` segment.
const PARAM_CAPTURE: &str = "([^/]+)";

/// Errors raised while compiling a path pattern.
#[derive(Debug, Error)]
pub enum PatternError {
    /// The same parameter name appears twice in one pattern.
    #[error("duplicate path parameter ':{name}' in pattern '{pattern}'")]
    DuplicateParam {
        /// The offending pattern
        pattern: String,
        /// The repeated parameter name
        name: String,
    },

    /// A `:` segment has an empty name or a name with non-word characters.
    #[error("invalid path parameter name ':{name}' in pattern '{pattern}'")]
    InvalidParamName {
        /// The offending pattern
        pattern: String,
        /// The rejected name
        name: String,
    },

    /// The generated regular expression failed to compile.
    #[error("pattern '{pattern}' could not be compiled: {source}")]
    Regex {
        /// The offending pattern
        pattern: String,
        /// Underlying regex error
        #[source]
        source: regex::Error,
    },
}

/// A compiled path pattern.
///
/// # Example
///
/// ```rust
/// use meridian_router::Matcher;
///
/// let matcher = Matcher::compile("/users/:id/posts/:postId").unwrap();
/// assert_eq!(matcher.param_names(), ["id", "postId"]);
///
/// let params = matcher.test("/users/7/posts/3").unwrap();
/// assert_eq!(params.get("id"), Some("7"));
/// assert_eq!(params.get("postId"), Some("3"));
///
/// assert!(matcher.test("/users/7").is_none());
/// ```
#[derive(Clone)]
pub struct Matcher {
    pattern: String,
    regex: Regex,
    param_names: Vec<String>,
}

impl Matcher {
    /// Compiles a path pattern.
    ///
    /// Empty segments are ignored, so `/a//b/` compiles the same as `/a/b`.
    /// Parameter names must be non-empty, consist of ASCII word characters
    /// and be unique within the pattern.
    pub fn compile(pattern: &str) -> Result<Self, PatternError> {
        let mut param_names: Vec<String> = Vec::new();
        let mut parts: Vec<String> = Vec::new();

        for segment in pattern.split('/').filter(|s| !s.is_empty()) {
            if let Some(name) = segment.strip_prefix(':') {
                if name.is_empty() || !name.chars().all(is_word_char) {
                    return Err(PatternError::InvalidParamName {
                        pattern: pattern.to_string(),
                        name: name.to_string(),
                    });
                }
                if param_names.iter().any(|n| n == name) {
                    return Err(PatternError::DuplicateParam {
                        pattern: pattern.to_string(),
                        name: name.to_string(),
                    });
                }
                param_names.push(name.to_string());
                parts.push(PARAM_CAPTURE.to_string());
            } else {
                parts.push(regex::escape(segment));
            }
        }

        let source = format!("^/{}$", parts.join("/"));
        let regex = Regex::new(&source).map_err(|source| PatternError::Regex {
            pattern: pattern.to_string(),
            source,
        })?;

        debug_assert_eq!(regex.captures_len() - 1, param_names.len());

        Ok(Self {
            pattern: pattern.to_string(),
            regex,
            param_names,
        })
    }

    /// Tests a concrete request path against this pattern.
    ///
    /// Returns the captured parameters in pattern order, or `None` when the
    /// path does not match. Captured values are percent-decoded; values that
    /// do not decode to UTF-8 are kept as received.
    #[must_use]
    pub fn test(&self, path: &str) -> Option<Params> {
        let captures = self.regex.captures(path)?;
        let mut params = Params::with_capacity(self.param_names.len());

        for (index, name) in self.param_names.iter().enumerate() {
            let raw = captures.get(index + 1).map_or("", |m| m.as_str());
            let value = urlencoding::decode(raw).map_or_else(|_| raw.to_string(), |v| v.into_owned());
            params.push(name.clone(), value);
        }

        Some(params)
    }

    /// Returns true if the path matches, without extracting parameters.
    #[must_use]
    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Returns the parameter names, left to right.
    #[must_use]
    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }

    /// Returns the pattern this matcher was compiled from.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Matcher")
            .field("pattern", &self.pattern)
            .field("regex", &self.regex.as_str())
            .field("param_names", &self.param_names)
            .finish()
    }
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_literal_pattern() {
        let m = Matcher::compile("/users").unwrap();
        assert!(m.test("/users").is_some());
        assert!(m.test("/users/").is_none());
        assert!(m.test("/user").is_none());
        assert!(m.param_names().is_empty());
    }

    #[test]
    fn test_nested_params() {
        let m = Matcher::compile("/users/:id/posts/:postId").unwrap();
        let params = m.test("/users/7/posts/3").unwrap();
        let pairs: Vec<_> = params.iter().collect();
        assert_eq!(pairs, vec![("id", "7"), ("postId", "3")]);

        assert!(m.test("/users/7").is_none());
        assert!(m.test("/users//posts/3").is_none());
        assert!(m.test("/users/7/posts/3/extra").is_none());
    }

    #[test]
    fn test_root_pattern() {
        for pattern in ["", "/", "//"] {
            let m = Matcher::compile(pattern).unwrap();
            assert!(m.test("/").is_some(), "pattern {pattern:?}");
            assert!(m.test("/x").is_none());
        }
    }

    #[test]
    fn test_literal_segments_are_escaped() {
        let m = Matcher::compile("/files/a.b+c").unwrap();
        assert!(m.is_match("/files/a.b+c"));
        assert!(!m.is_match("/files/aXb+c"));
        assert!(!m.is_match("/files/a.bbc"));
    }

    #[test]
    fn test_duplicate_param_rejected() {
        let err = Matcher::compile("/a/:id/b/:id").unwrap_err();
        assert!(matches!(err, PatternError::DuplicateParam { ref name, .. } if name == "id"));
    }

    #[test]
    fn test_invalid_param_name_rejected() {
        assert!(matches!(
            Matcher::compile("/a/:").unwrap_err(),
            PatternError::InvalidParamName { .. }
        ));
        assert!(matches!(
            Matcher::compile("/a/:na-me").unwrap_err(),
            PatternError::InvalidParamName { .. }
        ));
    }

    #[test]
    fn test_values_are_percent_decoded() {
        let m = Matcher::compile("/tags/:tag").unwrap();
        let params = m.test("/tags/hello%20world").unwrap();
        assert_eq!(params.get("tag"), Some("hello world"));

        let params = m.test("/tags/%FF").unwrap();
        assert_eq!(params.get("tag"), Some("%FF"));
    }

    #[test]
    fn test_debug_output_names_pattern() {
        let m = Matcher::compile("/users/:id").unwrap();
        let debug = format!("{m:?}");
        assert!(debug.contains("/users/:id"));
        assert!(debug.contains("([^/]+)"));
    }

    proptest! {
        #[test]
        fn compile_is_deterministic(
            literal in "[a-z]{1,8}",
            first in "[a-zA-Z0-9]{1,8}",
            second in "[a-zA-Z0-9]{1,8}",
        ) {
            let pattern = format!("/{literal}/:a/{literal}/:b");
            let path = format!("/{literal}/{first}/{literal}/{second}");

            let left = Matcher::compile(&pattern).unwrap().test(&path);
            let right = Matcher::compile(&pattern).unwrap().test(&path);

            prop_assert_eq!(&left, &right);
            let params = left.unwrap();
            prop_assert_eq!(params.get("a"), Some(first.as_str()));
            prop_assert_eq!(params.get("b"), Some(second.as_str()));
        }

        #[test]
        fn param_count_matches_names(count in 0usize..6) {
            let pattern: String = (0..count).map(|i| format!("/:p{i}")).collect();
            let path: String = (0..count).map(|i| format!("/v{i}")).collect();
            let path = if path.is_empty() { "/".to_string() } else { path };

            let matcher = Matcher::compile(&pattern).unwrap();
            prop_assert_eq!(matcher.param_names().len(), count);
            prop_assert_eq!(matcher.test(&path).unwrap().len(), count);
        }
    }
}
