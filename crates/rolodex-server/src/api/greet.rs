//! `GET /greet/{who}`: returns the JSON string `"Hello, <who>!"`.

use http::{Method, StatusCode};
use rolodex_middleware::Response;

use crate::error::ApiError;
use crate::handler::{handler_fn, json_response, ApiResult, RequestParts};
use crate::router::Router;

/// Longest accepted name, in characters.
pub const MAX_WHO_LEN: usize = 30;

/// Registers the greeting endpoint.
pub fn register(router: &mut Router) {
    router.route(Method::GET, "/greet/{who}", handler_fn(greet));
}

async fn greet(parts: RequestParts) -> ApiResult<Response> {
    let who = parts.param("who")?;
    if who.chars().count() > MAX_WHO_LEN {
        return Err(ApiError::validation(format!(
            "who: expected length <= {MAX_WHO_LEN}"
        )));
    }
    Ok(json_response(StatusCode::OK, &format!("Hello, {who}!")))
}
