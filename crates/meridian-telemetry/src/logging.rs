//! Structured logging.
//!
//! Library crates only emit events through `tracing` macros. The binary
//! calls [`init_logging`] once at startup to decide where they go.
//!
//! # Example
//!
//! ```rust,no_run
//! use meridian_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::production()).expect("logging already installed");
//! tracing::info!(route = "getUser", "serving");
//! ```

use meridian_config::{LogFormat, LoggingSection};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::error::TelemetryError;
use crate::TelemetryResult;

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Whether to install a subscriber at all.
    pub enabled: bool,
    /// Level or `EnvFilter` directive.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
    /// Log span open and close events.
    pub span_events: bool,
    /// Include source file and line.
    pub include_location: bool,
    /// Include the event target (module path).
    pub include_target: bool,
    /// Emit ANSI colors.
    pub ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::production()
    }
}

impl LogConfig {
    /// Human-readable debug output with dispatch spans.
    pub fn development() -> Self {
        Self {
            enabled: true,
            level: "debug".to_string(),
            format: LogFormat::Pretty,
            span_events: true,
            include_location: true,
            include_target: true,
            ansi: true,
        }
    }

    /// JSON lines at info level.
    pub fn production() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            format: LogFormat::Json,
            span_events: false,
            include_location: false,
            include_target: true,
            ansi: false,
        }
    }
}

impl From<&LoggingSection> for LogConfig {
    fn from(section: &LoggingSection) -> Self {
        Self {
            enabled: section.enabled,
            level: section.level.clone(),
            format: section.format,
            include_location: section.include_location,
            ansi: section.ansi_enabled,
            ..Self::production()
        }
    }
}

/// Installs the global subscriber described by `config`.
///
/// `RUST_LOG`, when set, takes precedence over `config.level`. A disabled
/// config installs nothing.
///
/// # Errors
///
/// Fails if the level does not parse or a subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directive) if !directive.is_empty() => create_env_filter(&directive)?,
        _ => create_env_filter(&config.level)?,
    };

    tracing_subscriber::registry()
        .with(fmt_layer(config, filter))
        .try_init()
        .map_err(|e| TelemetryError::LoggingInit(e.to_string()))
}

/// Installs a subscriber that writes through the test harness.
///
/// Safe to call from every test; only the first call in a process installs.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Parses a level or filter directive such as `meridian_server=debug,info`.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidFilter`] if the directive does not parse.
pub fn create_env_filter(directive: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(directive).map_err(|e| TelemetryError::InvalidFilter {
        filter: directive.to_string(),
        reason: e.to_string(),
    })
}

fn fmt_layer(config: &LogConfig, filter: EnvFilter) -> Box<dyn Layer<Registry> + Send + Sync> {
    let span_events = if config.span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let layer = tracing_subscriber::fmt::layer()
        .with_ansi(config.ansi)
        .with_span_events(span_events)
        .with_file(config.include_location)
        .with_line_number(config.include_location)
        .with_target(config.include_target);

    match config.format {
        LogFormat::Json => layer
            .json()
            .with_current_span(true)
            .with_filter(filter)
            .boxed(),
        LogFormat::Pretty => layer.pretty().with_filter(filter).boxed(),
    }
}

/// Field names used by Meridian's own log events.
pub mod fields {
    /// Request ID, on the dispatch span.
    pub const REQUEST_ID: &str = "request_id";
    /// Request method, on the dispatch span.
    pub const METHOD: &str = "method";
    /// Request path, on the dispatch span.
    pub const PATH: &str = "path";
    /// Route name or `METHOD pattern`.
    pub const ROUTE: &str = "route";
    /// Response status code.
    pub const STATUS: &str = "status";
    /// Dispatch time in microseconds.
    pub const ELAPSED_US: &str = "elapsed_us";
    /// Error description.
    pub const ERROR: &str = "error";
}
