//! Path pattern compilation and ordered route tables for Meridian.
//!
//! This crate holds the leaf pieces of request routing:
//!
//! - [`Matcher`]: a compiled `:name`-style path pattern that tests concrete
//!   paths and extracts named parameters
//! - [`Params`]: the extracted (name, value) pairs, in capture order
//! - [`RouteTable`]: an ordered, first-match-wins collection of
//!   (method, matcher, value) entries
//! - [`path`]: helpers that normalise and join paths before registration
//!
//! # Example
//!
//! ```rust
//! use meridian_router::RouteTable;
//! use http::Method;
//!
//! let mut table = RouteTable::new();
//! table.insert(Method::GET, "/users/:id", "getUser").unwrap();
//! table.insert(Method::GET, "/users/:id/posts/:postId", "getPost").unwrap();
//!
//! let (route, params) = table.lookup("GET", "/users/7/posts/3").unwrap();
//! assert_eq!(*route, "getPost");
//! assert_eq!(params.get("id"), Some("7"));
//! assert_eq!(params.get("postId"), Some("3"));
//!
//! assert!(table.lookup("GET", "/users/7/posts").is_none());
//! ```
//!
//! # Matching rules
//!
//! Patterns are split on `/`. A segment starting with `:` captures one or
//! more characters up to the next `/`; every other segment must match
//! literally. Matching is anchored at both ends and performs no trailing
//! slash normalisation, so callers normalise patterns with
//! [`path::join_paths`] before registering them. A pattern with no segments
//! matches only `/`.

#![doc(html_root_url = "https://docs.rs/meridian-router/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod matcher;
mod params;
pub mod path;
mod table;

pub use matcher::{Matcher, PatternError};
pub use params::Params;
pub use table::{RouteEntry, RouteTable};
