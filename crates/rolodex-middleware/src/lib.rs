//! # Rolodex Middleware
//!
//! Composable request middleware pipeline for the Rolodex service.
//!
//! A [`Pipeline`] is an ordered chain of [`Middleware`] wrapping a terminal
//! handler. The first registered middleware is the outermost: it sees the
//! request first and the response last.
//!
//! ## Standard Stages
//!
//! ```text
//! Request → RequestLog → InFlight → ResponseMetrics → Recovery → Handler
//!                                                                   ↓
//! Response ← RequestLog ← InFlight ← ResponseMetrics ← Recovery ←───┘
//! ```
//!
//! | Stage | Middleware | Purpose |
//! |-------|------------|---------|
//! | 1 | [`RequestLogMiddleware`] | Request span, one log record per request |
//! | 2 | [`InFlightMiddleware`] | `http_requests_in_flight` gauge |
//! | 3 | [`ResponseMetricsMiddleware`] | `http_request_duration_seconds`, `http_requests_total` |
//! | 4 | [`RecoveryMiddleware`] | Turns handler panics into 500 responses |
//!
//! Response metrics sit outside recovery so a recovered panic is counted
//! with status 500.
//!
//! ## Example
//!
//! ```
//! use rolodex_middleware::{standard_pipeline, MiddlewareContext};
//! use rolodex_telemetry::MetricsRegistry;
//! use std::sync::Arc;
//!
//! let pipeline = standard_pipeline(Arc::new(MetricsRegistry::new()));
//! assert_eq!(
//!     pipeline.stage_names(),
//!     vec!["request_log", "in_flight", "response_metrics", "recovery"]
//! );
//! ```

#![doc(html_root_url = "https://docs.rs/rolodex-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod context;
pub mod middleware;
pub mod pipeline;
pub mod stages;
pub mod types;

// Re-export main types at crate root
pub use context::MiddlewareContext;
pub use middleware::{BoxFuture, Middleware, Next};
pub use pipeline::{BoxedMiddleware, Pipeline, PipelineBuilder};
pub use stages::{
    standard_pipeline, InFlightMiddleware, PanicCallback, Recovered, RecordSink,
    RecoveryMiddleware, RequestLogMiddleware, RequestRecord, ResponseMetricsMiddleware,
};
pub use types::{Request, Response, ResponseExt};
