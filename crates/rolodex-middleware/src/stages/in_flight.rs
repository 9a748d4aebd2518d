//! In-flight request gauge.
//!
//! Tracks `http_requests_in_flight{method,path}` for the resolved operation.
//! The gauge is incremented on entry and decremented by a drop guard, so the
//! decrement also happens when the request panics or is cancelled.

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response};
use dashmap::DashMap;
use rolodex_core::Operation;
use rolodex_telemetry::{series, Gauge, MetricsRegistry};
use std::sync::Arc;

/// Metric name of the in-flight gauge.
pub const IN_FLIGHT_METRIC: &str = "http_requests_in_flight";

/// Middleware maintaining the in-flight gauge of each operation.
///
/// Requests without a resolved operation pass through untracked.
#[derive(Debug)]
pub struct InFlightMiddleware {
    registry: Arc<MetricsRegistry>,
    // keyed by operation id
    gauges: DashMap<String, Arc<Gauge>>,
}

impl InFlightMiddleware {
    /// Creates the middleware recording into `registry`.
    #[must_use]
    pub fn new(registry: Arc<MetricsRegistry>) -> Self {
        Self {
            registry,
            gauges: DashMap::new(),
        }
    }

    fn gauge_for(&self, operation: &Operation) -> Arc<Gauge> {
        if let Some(gauge) = self.gauges.get(operation.operation_id()) {
            return gauge.clone();
        }
        self.gauges
            .entry(operation.operation_id().to_string())
            .or_insert_with(|| {
                self.registry.get_or_create_gauge(&series(
                    IN_FLIGHT_METRIC,
                    &[
                        ("method", operation.method().as_str()),
                        ("path", operation.path()),
                    ],
                ))
            })
            .clone()
    }
}

impl Middleware for InFlightMiddleware {
    fn name(&self) -> &'static str {
        "in_flight"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let Some(operation) = ctx.operation().cloned() else {
                return next.run(ctx, request).await;
            };

            let _in_flight = self.gauge_for(&operation).track();
            next.run(ctx, request).await
        })
    }
}
