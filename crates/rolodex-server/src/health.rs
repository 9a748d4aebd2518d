//! Liveness and readiness probes.
//!
//! - `/liveness` answers 200 with an empty body while the process serves.
//! - `/readiness` answers 200 with an empty body when every registered
//!   check passes and the server is not draining, 503 otherwise.
//!
//! # Example
//!
//! ```rust
//! use rolodex_server::ReadinessCheck;
//! use std::sync::atomic::{AtomicBool, Ordering};
//! use std::sync::Arc;
//!
//! let store_up = Arc::new(AtomicBool::new(true));
//! let probe = Arc::clone(&store_up);
//! let readiness = ReadinessCheck::new().add_check("store", move || probe.load(Ordering::SeqCst));
//! assert!(readiness.is_ready());
//!
//! store_up.store(false, Ordering::SeqCst);
//! assert!(!readiness.is_ready());
//! ```

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use http::StatusCode;
use rolodex_middleware::{Response, ResponseExt};

/// A readiness check function.
type ReadinessCheckFn = Arc<dyn Fn() -> bool + Send + Sync>;

/// Readiness probe with named checks.
///
/// Clones share the draining flag, so the server can flip readiness off
/// while a handle is held elsewhere.
#[derive(Clone)]
pub struct ReadinessCheck {
    checks: Vec<(String, ReadinessCheckFn)>,
    draining: Arc<AtomicBool>,
}

impl ReadinessCheck {
    /// Creates a readiness check with no checks; it reports ready.
    #[must_use]
    pub fn new() -> Self {
        Self {
            checks: Vec::new(),
            draining: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Adds a named check.
    #[must_use]
    pub fn add_check<F>(mut self, name: impl Into<String>, check: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.checks.push((name.into(), Arc::new(check)));
        self
    }

    /// Marks the server as draining; readiness fails from then on.
    pub fn set_draining(&self, draining: bool) {
        self.draining.store(draining, Ordering::SeqCst);
    }

    /// Returns `true` while the server is draining.
    #[must_use]
    pub fn is_draining(&self) -> bool {
        self.draining.load(Ordering::SeqCst)
    }

    /// Returns `true` when not draining and every check passes.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        if self.is_draining() {
            return false;
        }
        self.checks.iter().all(|(name, check)| {
            let ok = check();
            if !ok {
                tracing::debug!(check = %name, "readiness check failed");
            }
            ok
        })
    }

    /// Returns the names of the registered checks.
    pub fn check_names(&self) -> impl Iterator<Item = &str> {
        self.checks.iter().map(|(name, _)| name.as_str())
    }

    /// Builds the `/readiness` response.
    #[must_use]
    pub fn response(&self) -> Response {
        if self.is_ready() {
            Response::empty(StatusCode::OK)
        } else {
            Response::empty(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}

impl Default for ReadinessCheck {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ReadinessCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadinessCheck")
            .field("checks", &self.check_names().collect::<Vec<_>>())
            .field("draining", &self.is_draining())
            .finish()
    }
}

/// Builds the `/liveness` response.
#[must_use]
pub fn liveness() -> Response {
    Response::empty(StatusCode::OK)
}
