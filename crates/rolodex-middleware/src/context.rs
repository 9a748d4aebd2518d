//! Request-scoped middleware context.
//!
//! A [`MiddlewareContext`] is created for each request, owned by the task
//! serving it and dropped when the response is complete. It carries what the
//! router resolved (operation, path parameters), what the connection knows
//! (peer address) and what middleware attached on the way in (request span,
//! request id). State is explicit fields, never a type-keyed lookup table.

use rolodex_core::Operation;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::Span;

/// Context that flows through the middleware pipeline.
///
/// # Example
///
/// ```
/// use rolodex_core::Operation;
/// use rolodex_middleware::context::MiddlewareContext;
/// use http::Method;
/// use std::sync::Arc;
///
/// let op = Arc::new(Operation::new(Method::GET, "/api/contacts/{id}"));
/// let ctx = MiddlewareContext::new()
///     .with_operation(op)
///     .with_param("id", "42");
///
/// assert_eq!(ctx.operation_id(), Some("get-api-contacts-by-id"));
/// assert_eq!(ctx.param("id"), Some("42"));
/// ```
#[derive(Debug)]
pub struct MiddlewareContext {
    /// The operation the router resolved, if any.
    operation: Option<Arc<Operation>>,

    /// Path parameters extracted by the router.
    params: HashMap<String, String>,

    /// Address of the connected peer.
    remote_addr: Option<SocketAddr>,

    /// Value of the `x-request-id` header, if the client sent one.
    request_id: Option<String>,

    /// Request span; disabled until the logging stage opens one.
    span: Span,

    /// When the request started processing.
    started_at: Instant,
}

impl MiddlewareContext {
    /// Creates an empty context starting now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            operation: None,
            params: HashMap::new(),
            remote_addr: None,
            request_id: None,
            span: Span::none(),
            started_at: Instant::now(),
        }
    }

    /// Sets the resolved operation.
    #[must_use]
    pub fn with_operation(mut self, operation: Arc<Operation>) -> Self {
        self.operation = Some(operation);
        self
    }

    /// Sets the peer address.
    #[must_use]
    pub fn with_remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    /// Adds one path parameter.
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Replaces all path parameters.
    #[must_use]
    pub fn with_params(mut self, params: HashMap<String, String>) -> Self {
        self.params = params;
        self
    }

    /// Returns the resolved operation.
    #[must_use]
    pub fn operation(&self) -> Option<&Arc<Operation>> {
        self.operation.as_ref()
    }

    /// Returns the resolved operation ID.
    #[must_use]
    pub fn operation_id(&self) -> Option<&str> {
        self.operation.as_deref().map(Operation::operation_id)
    }

    /// Returns a path parameter by name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Returns all path parameters.
    #[must_use]
    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    /// Returns the peer address.
    #[must_use]
    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    /// Returns the client-provided request ID.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    /// Sets the client-provided request ID.
    pub fn set_request_id(&mut self, request_id: impl Into<String>) {
        self.request_id = Some(request_id.into());
    }

    /// Returns the request span.
    ///
    /// Before the logging stage runs this is [`Span::none`].
    #[must_use]
    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Sets the request span.
    pub fn set_span(&mut self, span: Span) {
        self.span = span;
    }

    /// Returns the time since the context was created, which is when the
    /// server accepted the request.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

impl Default for MiddlewareContext {
    fn default() -> Self {
        Self::new()
    }
}
