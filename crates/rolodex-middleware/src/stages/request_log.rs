//! Request logging.
//!
//! Opens the request span, stores it in the [`MiddlewareContext`] and runs
//! the rest of the chain inside it, so every event emitted downstream is
//! attributed to the request. When the response is ready, one
//! [`RequestRecord`] is handed to the sink.
//!
//! # Log Format
//!
//! The default sink emits an info event whose message is
//! `"<METHOD> <path> <HTTP/x.y>"` with these fields:
//!
//! | Field | Source |
//! |-------|--------|
//! | `from` | peer address |
//! | `referer` | `Referer` header |
//! | `user_agent` | `User-Agent` header |
//! | `status` | final response status |
//! | `dur` | elapsed time |
//!
//! The span carries `request_id` (from `x-request-id`) and `operation_id`.

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response};
use http::{header, HeaderMap, Method, StatusCode, Version};
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::field;
use tracing::Instrument;

/// Header carrying a client-chosen request identifier.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Summary of one completed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestRecord {
    /// Request method.
    pub method: Method,
    /// Request path, as received.
    pub path: String,
    /// Protocol version.
    pub version: Version,
    /// Peer address.
    pub remote_addr: Option<SocketAddr>,
    /// `Referer` header.
    pub referer: Option<String>,
    /// `User-Agent` header.
    pub user_agent: Option<String>,
    /// `x-request-id` header.
    pub request_id: Option<String>,
    /// Resolved operation ID.
    pub operation_id: Option<String>,
    /// Final response status.
    pub status: StatusCode,
    /// Time spent in the downstream chain.
    pub duration: Duration,
}

impl RequestRecord {
    /// Returns the log message, e.g. `GET /api/contacts HTTP/1.1`.
    pub fn message(&self) -> String {
        format!("{} {} {:?}", self.method, self.path, self.version)
    }
}

impl fmt::Display for RequestRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {:?} {}", self.method, self.path, self.version, self.status.as_u16())
    }
}

/// Receives one record per completed request, inside the request span.
pub type RecordSink = Arc<dyn Fn(&RequestRecord) + Send + Sync>;

fn log_record(record: &RequestRecord) {
    tracing::info!(
        from = record.remote_addr.map(field::display),
        referer = record.referer.as_deref(),
        user_agent = record.user_agent.as_deref(),
        status = record.status.as_u16(),
        dur = ?record.duration,
        "{}",
        record.message()
    );
}

fn header_string(headers: &HeaderMap, name: impl header::AsHeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Middleware that opens the request span and logs each request.
pub struct RequestLogMiddleware {
    sink: RecordSink,
}

impl RequestLogMiddleware {
    /// Creates the middleware logging through `tracing`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sink: Arc::new(log_record),
        }
    }

    /// Creates the middleware with a custom record sink.
    #[must_use]
    pub fn with_sink(sink: RecordSink) -> Self {
        Self { sink }
    }
}

impl Default for RequestLogMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RequestLogMiddleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestLogMiddleware").finish_non_exhaustive()
    }
}

impl Middleware for RequestLogMiddleware {
    fn name(&self) -> &'static str {
        "request_log"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let request_id = header_string(request.headers(), REQUEST_ID_HEADER);
            if let Some(id) = &request_id {
                ctx.set_request_id(id.clone());
            }
            let operation_id = ctx.operation_id().map(str::to_string);

            let span = tracing::info_span!(
                "request",
                request_id = request_id.as_deref(),
                operation_id = operation_id.as_deref(),
            );
            ctx.set_span(span.clone());

            let method = request.method().clone();
            let path = request.uri().path().to_string();
            let version = request.version();
            let referer = header_string(request.headers(), header::REFERER);
            let user_agent = header_string(request.headers(), header::USER_AGENT);
            let remote_addr = ctx.remote_addr();

            let response = next.run(ctx, request).instrument(span.clone()).await;

            let record = RequestRecord {
                method,
                path,
                version,
                remote_addr,
                referer,
                user_agent,
                request_id,
                operation_id,
                status: response.status(),
                duration: ctx.elapsed(),
            };
            span.in_scope(|| (self.sink)(&record));

            response
        })
    }
}
