//! Built-in pipeline stages.

pub mod validation;
