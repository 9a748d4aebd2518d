//! Observability for Rolodex.
//!
//! This crate provides the observability building blocks used by the
//! request pipeline and the server:
//!
//! - **Metrics**: an explicitly constructed [`MetricsRegistry`] of counters,
//!   gauges and histograms, rendered in Prometheus text format
//! - **Process metrics**: [`BuildInfo`] and [`ProcessMetrics`] lines appended
//!   to the `/metrics` output
//! - **Logging**: structured JSON or text logging via `tracing-subscriber`
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `http_requests_in_flight` | Gauge | `method`, `path` | Requests currently being processed |
//! | `http_request_duration_seconds` | Histogram | `method`, `path`, `status` | Request latency |
//! | `http_requests_total` | Counter | `method`, `path`, `status` | Completed requests |
//! | `build_info` | Gauge | `title`, `version`, `revision`, `created` | Always `1` |
//! | `process_start_time_seconds` | Gauge | - | Unix time the process started |
//! | `process_uptime_seconds` | Gauge | - | Seconds since start |
//!
//! # Example
//!
//! ```
//! use rolodex_telemetry::{series, MetricsRegistry};
//!
//! let registry = MetricsRegistry::new();
//! let key = series("http_requests_total", &[("method", "GET"), ("path", "/teapot"), ("status", "418")]);
//! registry.get_or_create_counter(&key).inc();
//!
//! assert!(registry
//!     .render()
//!     .contains("http_requests_total{method=\"GET\",path=\"/teapot\",status=\"418\"} 1"));
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod logging;
pub mod metrics;
pub mod process;

pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig, LogFormat};
pub use metrics::{
    exponential_buckets, series, Counter, Gauge, GaugeGuard, Histogram, HistogramSnapshot,
    MetricsRegistry, DEFAULT_DURATION_BUCKETS,
};
pub use process::{BuildInfo, ProcessMetrics};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
