//! # Rolodex Core
//!
//! Core types and traits for the Rolodex contact service.
//!
//! This crate provides the foundational types used throughout Rolodex:
//!
//! - [`Contact`] / [`ContactId`] - The single entity managed by the service
//! - [`ContactStore`] - Storage abstraction, with the in-memory [`MemoryStore`]
//! - [`ContactService`] - Service abstraction, with [`StoreService`] and
//!   the error-reporting [`ReportingService`] wrapper
//! - [`Operation`] - The `{method, path, operation_id}` identity of an endpoint
//! - [`DomainError`] - Domain error kinds and their HTTP status mapping

#![doc(html_root_url = "https://docs.rs/rolodex-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod contact;
mod error;
pub mod fixtures;
mod operation;
mod service;
mod store;

pub use contact::{Contact, ContactId};
pub use error::{DomainError, DomainResult};
pub use operation::Operation;
pub use service::{ContactService, ErrorReporter, ReportingService, StoreService};
pub use store::{ContactStore, MemoryStore};
