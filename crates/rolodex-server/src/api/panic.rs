//! `GET /panic`: always panics, to exercise panic recovery.

use http::Method;
use rolodex_middleware::Response;

use crate::handler::{handler_fn, ApiResult, RequestParts};
use crate::router::Router;

/// The panic payload.
pub const PANIC_MESSAGE: &str = "panic argument";

/// Registers the panicking endpoint.
pub fn register(router: &mut Router) {
    router.route(Method::GET, "/panic", handler_fn(explode));
}

#[allow(clippy::unused_async)]
async fn explode(_parts: RequestParts) -> ApiResult<Response> {
    panic!("{}", PANIC_MESSAGE)
}
