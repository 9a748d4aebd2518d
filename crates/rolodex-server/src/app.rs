//! Service assembly.
//!
//! Wires the seeded in-memory store, the contact service, the REST
//! endpoints, the standard middleware pipeline and the metrics endpoint
//! into a [`Server`].

use std::sync::Arc;

use chrono::NaiveDate;
use rolodex_core::{Contact, MemoryStore, ReportingService, StoreService};
use rolodex_middleware::standard_pipeline;
use rolodex_telemetry::{BuildInfo, MetricsRegistry};

use crate::api::{self, contacts::SharedService};
use crate::config::ServerConfig;
use crate::metrics::MetricsEndpoint;
use crate::router::Router;
use crate::server::Server;

/// Creates the store the service starts with: one contact, john smith,
/// born 1999-12-31.
#[must_use]
pub fn seeded_store() -> MemoryStore {
    MemoryStore::with_contacts(
        NaiveDate::from_ymd_opt(1999, 12, 31).map(|birthday| Contact::new("john", "smith", birthday)),
    )
}

/// Creates the contact service over the seeded store; failed calls are
/// logged inside the request span.
#[must_use]
pub fn contact_service() -> SharedService {
    Arc::new(ReportingService::logging(StoreService::new(seeded_store())))
}

/// Creates the router with every REST endpoint mounted under `prefix`.
#[must_use]
pub fn api_router(prefix: &str, service: SharedService) -> Router {
    let mut router = Router::with_prefix(prefix);
    api::contacts::register(&mut router, service);
    api::greet::register(&mut router);
    api::panic::register(&mut router);
    router
}

/// Assembles the Rolodex server.
#[must_use]
pub fn build_server(config: ServerConfig, build_info: BuildInfo) -> Server {
    build_server_with(config, build_info, contact_service())
}

/// Assembles the Rolodex server around a given contact service.
#[must_use]
pub fn build_server_with(config: ServerConfig, build_info: BuildInfo, service: SharedService) -> Server {
    let registry = Arc::new(MetricsRegistry::new());
    let router = api_router(config.endpoints_prefix(), service);

    Server::builder()
        .pipeline(standard_pipeline(Arc::clone(&registry)))
        .metrics(MetricsEndpoint::new(registry, build_info))
        .router(router)
        .config(config)
        .build()
}
