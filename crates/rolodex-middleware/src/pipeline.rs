//! Ordered middleware pipeline.
//!
//! A [`Pipeline`] is built once at startup and shared by every request.
//! Stages nest in registration order: the first stage registered is the
//! outermost, so it sees the request first and the response last.

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response};
use std::sync::Arc;

/// A type-erased middleware that can be stored in a vector.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// An immutable chain of middleware.
///
/// # Example
///
/// ```
/// use rolodex_middleware::{Pipeline, MiddlewareContext, RecoveryMiddleware, Response, ResponseExt};
/// use http::StatusCode;
///
/// # tokio_test::block_on(async {
/// let pipeline = Pipeline::builder().with(RecoveryMiddleware::new()).build();
///
/// let request = http::Request::new(http_body_util::Full::new(bytes::Bytes::new()));
/// let response = pipeline
///     .process(MiddlewareContext::new(), request, |_ctx, _req| {
///         Box::pin(async { Response::empty(StatusCode::OK) })
///     })
///     .await;
/// assert_eq!(response.status(), StatusCode::OK);
/// # });
/// ```
#[derive(Clone, Default)]
pub struct Pipeline {
    stages: Vec<BoxedMiddleware>,
}

impl Pipeline {
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Runs a request through every stage, then `handler`.
    ///
    /// The context is owned by this call and dropped with the response.
    pub async fn process<H>(&self, mut ctx: MiddlewareContext, request: Request, handler: H) -> Response
    where
        H: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response> + Send + 'static,
    {
        let next = self.build_chain(handler);
        next.run(&mut ctx, request).await
    }

    /// Builds the chain from the innermost stage outwards.
    fn build_chain<'a, H>(&'a self, handler: H) -> Next<'a>
    where
        H: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response> + Send + 'a,
    {
        let mut next = Next::handler(handler);
        for middleware in self.stages.iter().rev() {
            next = Next::new(middleware.as_ref(), next);
        }
        next
    }

    /// Returns the names of all stages, outermost first.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|mw| mw.name()).collect()
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .finish()
    }
}

/// Builder for constructing a [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    stages: Vec<BoxedMiddleware>,
}

impl PipelineBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a stage inside the stages registered so far.
    #[must_use]
    pub fn with<M: Middleware>(mut self, middleware: M) -> Self {
        self.stages.push(Arc::new(middleware));
        self
    }

    /// Appends an already shared stage.
    #[must_use]
    pub fn with_shared(mut self, middleware: BoxedMiddleware) -> Self {
        self.stages.push(middleware);
        self
    }

    /// Builds the pipeline.
    #[must_use]
    pub fn build(self) -> Pipeline {
        Pipeline {
            stages: self.stages,
        }
    }
}
