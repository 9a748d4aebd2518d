//! Structured logging for Rolodex.
//!
//! Logs go to stdout through `tracing-subscriber`, as JSON by default or as
//! human-readable text. Request spans opened by the pipeline are included
//! in every event emitted while a request is processed.
//!
//! # Example
//!
//! ```rust,ignore
//! use rolodex_telemetry::logging::{LogConfig, LogFormat, init_logging};
//!
//! let config = LogConfig::default().with_format(LogFormat::Text);
//! init_logging(&config)?;
//!
//! tracing::info!(operation_id = "get-api-contacts", "listening");
//! ```

use crate::error::TelemetryError;
use crate::TelemetryResult;
use std::fmt;
use std::str::FromStr;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Default log filter.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Output format of the log records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Human-readable text.
    Text,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => f.write_str("json"),
            Self::Text => f.write_str("text"),
        }
    }
}

impl FromStr for LogFormat {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "text" => Ok(Self::Text),
            other => Err(TelemetryError::InvalidConfig(format!(
                "unknown log format {other:?}, expected \"json\" or \"text\""
            ))),
        }
    }
}

/// How log records are filtered and formatted.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// When false, `init_logging` installs nothing.
    pub enabled: bool,

    /// Filter directive (e.g., "info", "rolodex_server=debug,hyper=warn").
    pub level: String,

    /// Output format.
    pub format: LogFormat,

    /// Emit an event when a span opens and when it closes.
    pub span_events: bool,

    /// Attach source file and line to every record.
    pub file_line_info: bool,

    /// Attach the module path of the emitting code.
    pub include_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: DEFAULT_LOG_LEVEL.to_string(),
            format: LogFormat::Json,
            span_events: false,
            file_line_info: false,
            include_target: true,
        }
    }
}

impl LogConfig {
    /// Sets the filter directive.
    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Sets the output format.
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    fn fmt_span(&self) -> FmtSpan {
        if self.span_events {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        }
    }
}

/// Installs the global `tracing` subscriber described by `config`.
///
/// Call once, early in `main`. Returns `TelemetryError::LoggingInit` when
/// the filter does not parse or a subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let filter = create_env_filter(&config.level)?;
    let output: Box<dyn Layer<Registry> + Send + Sync> = match config.format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_span_events(config.fmt_span())
            .with_file(config.file_line_info)
            .with_line_number(config.file_line_info)
            .with_target(config.include_target)
            .boxed(),
        LogFormat::Text => tracing_subscriber::fmt::layer()
            .with_span_events(config.fmt_span())
            .with_file(config.file_line_info)
            .with_line_number(config.file_line_info)
            .with_target(config.include_target)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(output.with_filter(filter))
        .try_init()
        .map_err(|e| TelemetryError::LoggingInit(e.to_string()))
}

/// Creates an env filter from a directive string.
///
/// # Errors
///
/// Fails when `filter` is not a valid `EnvFilter` directive.
pub fn create_env_filter(filter: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(filter)
        .map_err(|e| TelemetryError::LoggingInit(format!("Invalid log level {filter:?}: {e}")))
}

/// Field names used by request logging.
pub mod fields {
    /// Request ID, taken from the `x-request-id` header.
    pub const REQUEST_ID: &str = "request_id";

    /// Operation ID.
    pub const OPERATION_ID: &str = "operation_id";

    /// Remote peer address.
    pub const FROM: &str = "from";

    /// `Referer` header.
    pub const REFERER: &str = "referer";

    /// `User-Agent` header.
    pub const USER_AGENT: &str = "user_agent";

    /// Final response status.
    pub const STATUS: &str = "status";

    /// Request duration.
    pub const DURATION: &str = "dur";
}
