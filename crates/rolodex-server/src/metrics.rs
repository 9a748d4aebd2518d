//! The `/metrics` endpoint.
//!
//! The body is the concatenation of
//!
//! 1. the constant `build_info{...} 1` gauge,
//! 2. the request metrics registry,
//! 3. process start time and uptime.

use std::sync::Arc;

use bytes::Bytes;
use http::{header, HeaderValue, StatusCode};
use http_body_util::Full;
use rolodex_middleware::Response;
use rolodex_telemetry::{BuildInfo, MetricsRegistry, ProcessMetrics};

/// Content type of the Prometheus text exposition format.
pub const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Renders the `/metrics` body.
#[derive(Debug, Clone)]
pub struct MetricsEndpoint {
    registry: Arc<MetricsRegistry>,
    build_info: BuildInfo,
    process: ProcessMetrics,
}

impl MetricsEndpoint {
    /// Creates the endpoint; process start is taken now.
    #[must_use]
    pub fn new(registry: Arc<MetricsRegistry>, build_info: BuildInfo) -> Self {
        Self {
            registry,
            build_info,
            process: ProcessMetrics::start(),
        }
    }

    /// Returns the request metrics registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<MetricsRegistry> {
        &self.registry
    }

    /// Returns the build info.
    #[must_use]
    pub fn build_info(&self) -> &BuildInfo {
        &self.build_info
    }

    /// Renders the full exposition text.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = self.build_info.render();
        out.push_str(&self.registry.render());
        out.push_str(&self.process.render());
        out
    }

    /// Builds the `/metrics` response.
    #[must_use]
    pub fn response(&self) -> Response {
        let mut response = http::Response::new(Full::new(Bytes::from(self.render())));
        *response.status_mut() = StatusCode::OK;
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(PROMETHEUS_CONTENT_TYPE),
        );
        response
    }
}
