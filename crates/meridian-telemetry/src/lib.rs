//! # Meridian Telemetry
//!
//! Logging setup for Meridian services, built on `tracing-subscriber`.
//!
//! - JSON lines for production, pretty output for development
//! - `EnvFilter` levels and directives, overridable with `RUST_LOG`
//! - Presets convertible from [`meridian_config::LoggingSection`]
//!
//! ## Example
//!
//! ```rust,no_run
//! use meridian_config::MeridianConfig;
//! use meridian_telemetry::{init_logging, LogConfig};
//!
//! let config = MeridianConfig::development();
//! init_logging(&LogConfig::from(&config.logging)).unwrap();
//! ```

#![doc(html_root_url = "https://docs.rs/meridian-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, fields, init_logging, init_test_logging, LogConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
