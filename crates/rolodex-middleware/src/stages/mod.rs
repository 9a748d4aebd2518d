//! Standard middleware stages.
//!
//! [`standard_pipeline`] assembles them in the order every service uses:
//!
//! 1. [`request_log`] - Request span and one log record per request
//! 2. [`in_flight`] - In-flight gauge per operation
//! 3. [`response_metrics`] - Duration histogram and request counter per
//!    operation and status
//! 4. [`recovery`] - Panic containment

pub mod in_flight;
pub mod recovery;
pub mod request_log;
pub mod response_metrics;

pub use in_flight::InFlightMiddleware;
pub use recovery::{PanicCallback, Recovered, RecoveryMiddleware};
pub use request_log::{RecordSink, RequestLogMiddleware, RequestRecord};
pub use response_metrics::ResponseMetricsMiddleware;

use crate::pipeline::Pipeline;
use rolodex_telemetry::MetricsRegistry;
use std::sync::Arc;

/// Builds the standard pipeline recording into `registry`.
#[must_use]
pub fn standard_pipeline(registry: Arc<MetricsRegistry>) -> Pipeline {
    Pipeline::builder()
        .with(RequestLogMiddleware::new())
        .with(InFlightMiddleware::new(registry.clone()))
        .with(ResponseMetricsMiddleware::new(registry))
        .with(RecoveryMiddleware::new())
        .build()
}
