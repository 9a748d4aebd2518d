//! HTTP server implementation.
//!
//! The server accepts connections on a tokio listener and serves each on
//! its own task with hyper's HTTP/1.1 connection driver. Requests are
//! dispatched in this order:
//!
//! 1. `/liveness`, `/readiness` and `/metrics` are answered directly,
//! 2. otherwise the router resolves the operation; unmatched paths get 404
//!    and known paths with another method get 405, both outside the pipeline,
//! 3. matched requests run through the middleware [`Pipeline`] into the
//!    route handler.
//!
//! On shutdown the server stops accepting, flips readiness off, asks every
//! open connection to finish its current request, and waits for them up to
//! the configured shutdown timeout.
//!
//! # Example
//!
//! ```rust,ignore
//! use rolodex_server::{Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), rolodex_server::ServerError> {
//!     let server = Server::builder()
//!         .config(ServerConfig::builder().port(8080).build())
//!         .build();
//!     server.run().await
//! }
//! ```

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use http::{header, HeaderValue, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use tokio::net::{TcpListener, TcpStream};

use rolodex_middleware::{standard_pipeline, MiddlewareContext, Pipeline, Request, Response, ResponseExt};
use rolodex_telemetry::{BuildInfo, MetricsRegistry};

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::health::{self, ReadinessCheck};
use crate::metrics::MetricsEndpoint;
use crate::router::{Resolution, Router};
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// Path of the liveness probe.
pub const LIVENESS_PATH: &str = "/liveness";

/// Path of the readiness probe.
pub const READINESS_PATH: &str = "/readiness";

/// Path of the metrics endpoint.
pub const METRICS_PATH: &str = "/metrics";

/// The Rolodex HTTP server.
pub struct Server {
    config: ServerConfig,
    router: Router,
    pipeline: Pipeline,
    readiness: ReadinessCheck,
    metrics: MetricsEndpoint,
}

impl Server {
    /// Creates a new server builder.
    #[must_use]
    pub fn builder() -> ServerBuilder {
        ServerBuilder::default()
    }

    /// Returns the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the router.
    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Returns the middleware pipeline.
    #[must_use]
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Returns the readiness probe.
    #[must_use]
    pub fn readiness(&self) -> &ReadinessCheck {
        &self.readiness
    }

    /// Returns the metrics endpoint.
    #[must_use]
    pub fn metrics(&self) -> &MetricsEndpoint {
        &self.metrics
    }

    /// Dispatches one request whose body has already been collected.
    pub async fn handle(&self, request: Request, remote_addr: Option<SocketAddr>) -> Response {
        match request.uri().path() {
            LIVENESS_PATH => return health::liveness(),
            READINESS_PATH => return self.readiness.response(),
            METRICS_PATH => return self.metrics.response(),
            _ => {}
        }

        let resolution = self.router.resolve(request.method(), request.uri().path());
        match resolution {
            Resolution::Found(route) => {
                let (operation, params, handler) = route.into_parts();
                let mut ctx = MiddlewareContext::new()
                    .with_operation(operation)
                    .with_params(params);
                if let Some(addr) = remote_addr {
                    ctx = ctx.with_remote_addr(addr);
                }
                self.pipeline
                    .process(ctx, request, move |ctx, request| handler(ctx, request))
                    .await
            }
            Resolution::MethodNotAllowed(allowed) => {
                tracing::debug!(method = %request.method(), path = request.uri().path(), "method not allowed");
                method_not_allowed(&allowed)
            }
            Resolution::NotFound => {
                tracing::debug!(method = %request.method(), path = request.uri().path(), "no route");
                Response::json_error(StatusCode::NOT_FOUND, "NOT_FOUND", "not found")
            }
        }
    }

    /// Binds the configured address and serves until SIGINT or SIGTERM.
    pub async fn run(self) -> Result<(), ServerError> {
        let shutdown = ShutdownSignal::with_os_signals();
        self.run_with_shutdown(shutdown).await
    }

    /// Binds the configured address and serves until `shutdown` fires.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let addr = self.config.bind_addr();
        let listener = TcpListener::bind(addr.as_str())
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        self.serve(listener, shutdown).await
    }

    /// Serves connections from `listener` until `shutdown` fires, then
    /// drains open connections.
    pub async fn serve(self, listener: TcpListener, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let local_addr = listener.local_addr()?;
        tracing::info!(
            addr = %local_addr,
            prefix = self.config.endpoints_prefix(),
            routes = self.router.route_count(),
            "server listening"
        );

        let server = Arc::new(self);
        let tracker = ConnectionTracker::new();

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, remote_addr)) => {
                        let server = Arc::clone(&server);
                        let token = tracker.acquire();
                        let shutdown = shutdown.clone();
                        tokio::spawn(async move {
                            if let Err(e) = server.serve_connection(stream, remote_addr, shutdown).await {
                                tracing::debug!(from = %remote_addr, error = %e, "connection error");
                            }
                            drop(token);
                        });
                    }
                    Err(e) => tracing::error!(error = %e, "failed to accept connection"),
                },
                () = shutdown.recv() => break,
            }
        }

        drop(listener);
        server.readiness.set_draining(true);

        let timeout = server.config.shutdown_timeout();
        tracing::info!(
            connections = tracker.active_connections(),
            timeout = ?timeout,
            "shutting down, draining connections"
        );

        tokio::select! {
            () = tracker.wait_for_drain() => tracing::info!("all connections closed"),
            () = tokio::time::sleep(timeout) => tracing::warn!(
                connections = tracker.active_connections(),
                "shutdown timeout reached with connections still open"
            ),
        }

        tracing::info!("server stopped");
        Ok(())
    }

    async fn serve_connection(
        self: &Arc<Self>,
        stream: TcpStream,
        remote_addr: SocketAddr,
        shutdown: ShutdownSignal,
    ) -> Result<(), hyper::Error> {
        let server = Arc::clone(self);
        let service = service_fn(move |request: http::Request<Incoming>| {
            let server = Arc::clone(&server);
            async move { Ok::<_, Infallible>(server.serve_request(request, remote_addr).await) }
        });

        let mut builder = http1::Builder::new();
        builder
            .timer(TokioTimer::new())
            .header_read_timeout(self.config.read_header_timeout());

        let conn = builder.serve_connection(TokioIo::new(stream), service);
        tokio::pin!(conn);

        tokio::select! {
            result = conn.as_mut() => result,
            () = shutdown.recv() => {
                conn.as_mut().graceful_shutdown();
                conn.await
            }
        }
    }

    async fn serve_request(&self, request: http::Request<Incoming>, remote_addr: SocketAddr) -> Response {
        let (head, body) = request.into_parts();
        let body = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) => {
                tracing::warn!(from = %remote_addr, error = %e, "failed to read request body");
                return Response::json_error(
                    StatusCode::BAD_REQUEST,
                    "BODY_READ_ERROR",
                    "failed to read request body",
                );
            }
        };

        let request = http::Request::from_parts(head, Full::new(body));
        self.handle(request, Some(remote_addr)).await
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("config", &self.config)
            .field("router", &self.router)
            .field("pipeline", &self.pipeline)
            .finish_non_exhaustive()
    }
}

fn method_not_allowed(allowed: &[http::Method]) -> Response {
    let mut response = Response::json_error(
        StatusCode::METHOD_NOT_ALLOWED,
        "METHOD_NOT_ALLOWED",
        "method not allowed",
    );
    let allow = allowed
        .iter()
        .map(http::Method::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    if let Ok(value) = HeaderValue::from_str(&allow) {
        response.headers_mut().insert(header::ALLOW, value);
    }
    response
}

/// Builder for [`Server`].
///
/// Unset parts default to: the default [`ServerConfig`], an empty router,
/// a fresh metrics registry with this crate's build info, the
/// [`standard_pipeline`] over that registry, and a readiness probe without
/// checks.
#[derive(Debug, Default)]
pub struct ServerBuilder {
    config: Option<ServerConfig>,
    router: Option<Router>,
    pipeline: Option<Pipeline>,
    readiness: Option<ReadinessCheck>,
    metrics: Option<MetricsEndpoint>,
}

impl ServerBuilder {
    /// Creates a builder with every part unset.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the router.
    #[must_use]
    pub fn router(mut self, router: Router) -> Self {
        self.router = Some(router);
        self
    }

    /// Sets the middleware pipeline.
    #[must_use]
    pub fn pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = Some(pipeline);
        self
    }

    /// Sets the readiness probe.
    #[must_use]
    pub fn readiness(mut self, readiness: ReadinessCheck) -> Self {
        self.readiness = Some(readiness);
        self
    }

    /// Sets the metrics endpoint.
    #[must_use]
    pub fn metrics(mut self, metrics: MetricsEndpoint) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Builds the server.
    #[must_use]
    pub fn build(self) -> Server {
        let metrics = self.metrics.unwrap_or_else(|| {
            MetricsEndpoint::new(
                Arc::new(MetricsRegistry::new()),
                BuildInfo::new(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            )
        });
        let pipeline = self
            .pipeline
            .unwrap_or_else(|| standard_pipeline(Arc::clone(metrics.registry())));

        Server {
            config: self.config.unwrap_or_default(),
            router: self.router.unwrap_or_default(),
            pipeline,
            readiness: self.readiness.unwrap_or_default(),
            metrics,
        }
    }
}
