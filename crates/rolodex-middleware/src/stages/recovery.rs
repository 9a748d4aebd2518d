//! Panic recovery.
//!
//! Catches panics raised anywhere downstream, including synchronously in the
//! handler, and turns them into a 500 response with a generic body. The
//! panic payload never reaches the client; it is handed to a callback.

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response, ResponseExt};
use futures_util::FutureExt;
use http::StatusCode;
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// A caught panic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recovered {
    message: String,
}

impl Recovered {
    /// Extracts the panic message from a payload.
    ///
    /// `&str` and `String` payloads keep their text; anything else is
    /// reported as `Box<dyn Any>`.
    pub fn from_payload(payload: &(dyn Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "Box<dyn Any>".to_string()
        };
        Self { message }
    }

    /// Returns the panic message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Recovered {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Callback invoked with the request context and the caught panic.
pub type PanicCallback = Arc<dyn Fn(&MiddlewareContext, &Recovered) + Send + Sync>;

fn log_panic(ctx: &MiddlewareContext, recovered: &Recovered) {
    let _entered = ctx.span().enter();
    tracing::error!(panic = %recovered, "panic occurred");
}

/// Middleware that converts panics into 500 responses.
pub struct RecoveryMiddleware {
    callback: PanicCallback,
}

impl RecoveryMiddleware {
    /// Creates the middleware; panics are logged at error level.
    #[must_use]
    pub fn new() -> Self {
        Self {
            callback: Arc::new(log_panic),
        }
    }

    /// Creates the middleware with a custom panic callback.
    #[must_use]
    pub fn with_callback(callback: PanicCallback) -> Self {
        Self { callback }
    }
}

impl Default for RecoveryMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RecoveryMiddleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecoveryMiddleware").finish_non_exhaustive()
    }
}

impl Middleware for RecoveryMiddleware {
    fn name(&self) -> &'static str {
        "recovery"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let outcome = AssertUnwindSafe(next.run(&mut *ctx, request))
                .catch_unwind()
                .await;

            match outcome {
                Ok(response) => response,
                Err(payload) => {
                    let recovered = Recovered::from_payload(payload.as_ref());
                    (self.callback)(ctx, &recovered);
                    Response::json_error(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "internal server error",
                    )
                }
            }
        })
    }
}
