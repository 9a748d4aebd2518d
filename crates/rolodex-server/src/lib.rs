//! # Rolodex Server
//!
//! HTTP server for the Rolodex contact service.
//!
//! This crate provides:
//!
//! - HTTP/1.1 serving via hyper, with a header read timeout
//! - Routing with `{param}` path templates under an endpoint prefix
//! - The contact, greeting and panic REST endpoints
//! - `/liveness`, `/readiness` and `/metrics`
//! - Graceful shutdown with connection draining
//!
//! Every routed request runs through a
//! [`Pipeline`](rolodex_middleware::Pipeline); by default the
//! [standard pipeline](rolodex_middleware::standard_pipeline).
//!
//! ## Example
//!
//! ```rust,ignore
//! use rolodex_server::{app, ServerConfig};
//! use rolodex_telemetry::BuildInfo;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), rolodex_server::ServerError> {
//!     let server = app::build_server(ServerConfig::default(), BuildInfo::new("rolodex", "0.1.0"));
//!     server.run().await
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/rolodex-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod handler;
pub mod health;
pub mod metrics;
pub mod router;
pub mod server;
pub mod shutdown;

pub use config::{ServerConfig, ServerConfigBuilder};
pub use error::{ApiError, ServerError};
pub use handler::{handler_fn, json_response, ApiResult, BoxedHandler, RequestParts};
pub use health::ReadinessCheck;
pub use metrics::MetricsEndpoint;
pub use router::{Resolution, RouteMatch, Router};
pub use server::{Server, ServerBuilder};
pub use shutdown::{ConnectionTracker, ShutdownSignal};
