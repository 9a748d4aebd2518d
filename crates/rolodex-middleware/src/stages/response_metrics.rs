//! Request duration and count per operation and status.
//!
//! After the downstream chain returns, the final status is known and the
//! request is recorded in
//!
//! - `http_request_duration_seconds{method,path,status}` (histogram)
//! - `http_requests_total{method,path,status}` (counter)
//!
//! This stage must sit outside [`RecoveryMiddleware`](super::RecoveryMiddleware)
//! so recovered panics are recorded with status 500.

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response};
use dashmap::DashMap;
use http::StatusCode;
use rolodex_core::Operation;
use rolodex_telemetry::{series, Counter, Histogram, MetricsRegistry, DEFAULT_DURATION_BUCKETS};
use std::sync::Arc;
use std::time::Instant;

/// Metric name of the duration histogram.
pub const DURATION_METRIC: &str = "http_request_duration_seconds";

/// Metric name of the request counter.
pub const TOTAL_METRIC: &str = "http_requests_total";

#[derive(Debug)]
struct ResponseSeries {
    duration: Arc<Histogram>,
    total: Arc<Counter>,
}

/// Middleware recording request duration and count.
#[derive(Debug)]
pub struct ResponseMetricsMiddleware {
    registry: Arc<MetricsRegistry>,
    buckets: Vec<f64>,
    series: DashMap<(String, StatusCode), Arc<ResponseSeries>>,
}

impl ResponseMetricsMiddleware {
    /// Creates the middleware with the default duration buckets.
    #[must_use]
    pub fn new(registry: Arc<MetricsRegistry>) -> Self {
        Self::with_buckets(registry, DEFAULT_DURATION_BUCKETS.to_vec())
    }

    /// Creates the middleware with custom duration buckets.
    #[must_use]
    pub fn with_buckets(registry: Arc<MetricsRegistry>, buckets: Vec<f64>) -> Self {
        Self {
            registry,
            buckets,
            series: DashMap::new(),
        }
    }

    fn series_for(&self, operation: &Operation, status: StatusCode) -> Arc<ResponseSeries> {
        let key = (operation.operation_id().to_string(), status);
        if let Some(found) = self.series.get(&key) {
            return found.clone();
        }

        self.series
            .entry(key)
            .or_insert_with(|| {
                let labels = [
                    ("method", operation.method().as_str()),
                    ("path", operation.path()),
                    ("status", status.as_str()),
                ];
                Arc::new(ResponseSeries {
                    duration: self
                        .registry
                        .get_or_create_histogram(&series(DURATION_METRIC, &labels), &self.buckets),
                    total: self
                        .registry
                        .get_or_create_counter(&series(TOTAL_METRIC, &labels)),
                })
            })
            .clone()
    }
}

impl Middleware for ResponseMetricsMiddleware {
    fn name(&self) -> &'static str {
        "response_metrics"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let operation = ctx.operation().cloned();
            let start = Instant::now();

            let response = next.run(ctx, request).await;

            if let Some(operation) = operation {
                let recorded = self.series_for(&operation, response.status());
                recorded.duration.observe_since(start);
                recorded.total.inc();
            }
            response
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ResponseExt;
    use bytes::Bytes;
    use http::Method;
    use http_body_util::Full;

    fn request() -> Request {
        http::Request::new(Full::new(Bytes::new()))
    }

    async fn run(middleware: &ResponseMetricsMiddleware, op: &Arc<Operation>, status: StatusCode) {
        let mut ctx = MiddlewareContext::new().with_operation(op.clone());
        let response = middleware
            .process(
                &mut ctx,
                request(),
                Next::handler(move |_ctx, _req| Box::pin(async move { Response::empty(status) })),
            )
            .await;
        assert_eq!(response.status(), status);
    }

    #[tokio::test]
    async fn test_records_per_status() {
        let registry = Arc::new(MetricsRegistry::new());
        let middleware = ResponseMetricsMiddleware::new(registry.clone());
        let op = Arc::new(Operation::new(Method::GET, "/api/contacts/{id}"));

        run(&middleware, &op, StatusCode::OK).await;
        run(&middleware, &op, StatusCode::OK).await;
        run(&middleware, &op, StatusCode::NOT_FOUND).await;

        let ok = registry.get_or_create_counter(&series(
            TOTAL_METRIC,
            &[("method", "GET"), ("path", "/api/contacts/{id}"), ("status", "200")],
        ));
        let not_found = registry.get_or_create_counter(&series(
            TOTAL_METRIC,
            &[("method", "GET"), ("path", "/api/contacts/{id}"), ("status", "404")],
        ));
        assert_eq!(ok.get(), 2);
        assert_eq!(not_found.get(), 1);

        // two statuses, a histogram and a counter each
        assert_eq!(registry.len(), 4);
    }

    #[tokio::test]
    async fn test_count_matches_histogram_count() {
        let registry = Arc::new(MetricsRegistry::new());
        let middleware = ResponseMetricsMiddleware::new(registry.clone());
        let op = Arc::new(Operation::new(Method::POST, "/api/contacts"));

        for _ in 0..5 {
            run(&middleware, &op, StatusCode::OK).await;
        }

        let recorded = middleware.series_for(&op, StatusCode::OK);
        assert_eq!(recorded.total.get(), 5);
        assert_eq!(recorded.duration.snapshot().count(), 5);
    }

    #[tokio::test]
    async fn test_custom_buckets() {
        let registry = Arc::new(MetricsRegistry::new());
        let middleware = ResponseMetricsMiddleware::with_buckets(registry.clone(), vec![10.0]);
        let op = Arc::new(Operation::new(Method::GET, "/slow"));

        run(&middleware, &op, StatusCode::OK).await;
        let recorded = middleware.series_for(&op, StatusCode::OK);
        assert_eq!(recorded.duration.bounds(), &[10.0]);
    }
}
