//! Core middleware trait and types.
//!
//! Middleware wraps the rest of the chain: it runs code before calling
//! [`Next::run`], awaits the downstream response, and runs code after.
//! Middleware can also return its own response without calling `next`.
//!
//! # Example
//!
//! ```
//! use rolodex_middleware::{BoxFuture, Middleware, MiddlewareContext, Next, Request, Response};
//!
//! struct ServerHeader;
//!
//! impl Middleware for ServerHeader {
//!     fn name(&self) -> &'static str {
//!         "server_header"
//!     }
//!
//!     fn process<'a>(
//!         &'a self,
//!         ctx: &'a mut MiddlewareContext,
//!         request: Request,
//!         next: Next<'a>,
//!     ) -> BoxFuture<'a, Response> {
//!         Box::pin(async move {
//!             let mut response = next.run(ctx, request).await;
//!             response
//!                 .headers_mut()
//!                 .insert("server", http::HeaderValue::from_static("rolodex"));
//!             response
//!         })
//!     }
//! }
//! ```

use crate::context::MiddlewareContext;
use crate::types::{Request, Response};
use std::future::Future;
use std::pin::Pin;

/// A boxed future that returns a response.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The core middleware trait.
///
/// Middleware receives a mutable context, the incoming request, and a
/// [`Next`] continuation for the rest of the chain.
///
/// # Invariants
///
/// - `next` is consumed by [`Next::run`], so it runs at most once
/// - Dropping the returned future cancels the request; cleanup that must
///   happen regardless belongs in `Drop` guards
pub trait Middleware: Send + Sync + 'static {
    /// Returns the name of this middleware stage, used in logs and
    /// introspection.
    fn name(&self) -> &'static str;

    /// Processes the request through this middleware.
    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response>;
}

/// Terminal handler of a chain.
pub type Handler<'a> =
    Box<dyn FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response> + Send + 'a>;

/// Continuation to the rest of the middleware chain.
pub struct Next<'a> {
    inner: NextInner<'a>,
}

enum NextInner<'a> {
    /// More middleware to process
    Chain {
        middleware: &'a dyn Middleware,
        next: Box<Next<'a>>,
    },
    /// End of chain
    Handler(Handler<'a>),
}

impl<'a> Next<'a> {
    /// Creates a `Next` that will invoke `middleware`, then `next`.
    pub(crate) fn new(middleware: &'a dyn Middleware, next: Next<'a>) -> Self {
        Self {
            inner: NextInner::Chain {
                middleware,
                next: Box::new(next),
            },
        }
    }

    /// Creates a terminal `Next` that invokes the handler.
    pub fn handler<F>(f: F) -> Self
    where
        F: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response> + Send + 'a,
    {
        Self {
            inner: NextInner::Handler(Box::new(f)),
        }
    }

    /// Invokes the next middleware or the handler.
    ///
    /// This consumes `self`, so the rest of the chain runs at most once.
    pub async fn run(self, ctx: &mut MiddlewareContext, request: Request) -> Response {
        match self.inner {
            NextInner::Chain { middleware, next } => middleware.process(ctx, request, *next).await,
            NextInner::Handler(handler) => handler(ctx, request).await,
        }
    }
}

impl std::fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.inner {
            NextInner::Chain { middleware, .. } => f
                .debug_struct("Next")
                .field("middleware", &middleware.name())
                .finish_non_exhaustive(),
            NextInner::Handler(_) => f.debug_struct("Next").field("handler", &true).finish(),
        }
    }
}
