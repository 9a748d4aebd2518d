//! Route handlers and request extraction.
//!
//! A route handler is the leaf of the middleware pipeline. The pipeline
//! calls it with the request context and the request; the handler copies
//! what it needs out of the context synchronously and returns a `'static`
//! future.
//!
//! Most handlers are written with [`handler_fn`], which hands the handler a
//! [`RequestParts`] and turns an [`ApiError`] into its JSON envelope:
//!
//! ```rust
//! use rolodex_server::handler::{handler_fn, json_response, RequestParts};
//! use http::StatusCode;
//!
//! let greet = handler_fn(|parts: RequestParts| async move {
//!     let who = parts.param("who")?.to_string();
//!     Ok(json_response(StatusCode::OK, &format!("Hello, {who}!")))
//! });
//! ```

use std::borrow::Cow;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use http::{header, HeaderValue, StatusCode};
use http_body_util::{BodyExt, Full};
use serde::de::DeserializeOwned;
use serde::Serialize;

use rolodex_middleware::{BoxFuture, MiddlewareContext, Request, Response};

use crate::error::ApiError;

/// Result type returned by [`handler_fn`] handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// A type-erased route handler, shared by every request to its route.
pub type BoxedHandler =
    Arc<dyn Fn(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response> + Send + Sync>;

/// The parts of a request a handler works with.
#[derive(Debug)]
pub struct RequestParts {
    params: HashMap<String, String>,
    head: http::request::Parts,
    body: Bytes,
}

impl RequestParts {
    /// Creates request parts from path parameters, the request head and the
    /// collected body.
    #[must_use]
    pub fn new(params: HashMap<String, String>, head: http::request::Parts, body: Bytes) -> Self {
        Self { params, head, body }
    }

    /// Collects a pipeline request into parts.
    pub async fn from_request(params: HashMap<String, String>, request: Request) -> Self {
        let (head, body) = request.into_parts();
        let body = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(never) => match never {},
        };
        Self::new(params, head, body)
    }

    /// Returns a percent-decoded path parameter.
    ///
    /// A missing parameter means the route template and handler disagree,
    /// so it is reported as an internal error. A value that does not decode
    /// to UTF-8 is a validation error.
    pub fn param(&self, name: &str) -> ApiResult<Cow<'_, str>> {
        let raw = self
            .params
            .get(name)
            .ok_or_else(|| ApiError::Internal(format!("missing path parameter {name}")))?;
        urlencoding::decode(raw)
            .map_err(|e| ApiError::validation(format!("invalid path parameter {name}: {e}")))
    }

    /// Parses a path parameter.
    pub fn parse_param<T>(&self, name: &str) -> ApiResult<T>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.param(name)?
            .parse()
            .map_err(|e| ApiError::validation(format!("invalid path parameter {name}: {e}")))
    }

    /// Deserializes the query string; a missing query deserializes from
    /// the empty string, so `#[serde(default)]` fields apply.
    pub fn query<T: DeserializeOwned>(&self) -> ApiResult<T> {
        let query = self.head.uri.query().unwrap_or("");
        serde_urlencoded::from_str(query)
            .map_err(|e| ApiError::validation(format!("invalid query: {e}")))
    }

    /// Deserializes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> ApiResult<T> {
        serde_json::from_slice(&self.body)
            .map_err(|e| ApiError::validation(format!("invalid body: {e}")))
    }
}

/// Wraps an async function into a [`BoxedHandler`].
///
/// Errors are converted into their JSON envelope.
pub fn handler_fn<F, Fut>(f: F) -> BoxedHandler
where
    F: Fn(RequestParts) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ApiResult<Response>> + Send + 'static,
{
    let f = Arc::new(f);
    Arc::new(move |ctx: &mut MiddlewareContext, request: Request| -> BoxFuture<'static, Response> {
        let f = Arc::clone(&f);
        let params = ctx.params().clone();
        Box::pin(async move {
            let parts = RequestParts::from_request(params, request).await;
            f(parts).await.unwrap_or_else(ApiError::into_response)
        })
    })
}

/// Builds a JSON response; serialization failures become a 500.
pub fn json_response<T: Serialize + ?Sized>(status: StatusCode, value: &T) -> Response {
    match serde_json::to_vec(value) {
        Ok(body) => {
            let mut response = http::Response::new(Full::new(Bytes::from(body)));
            *response.status_mut() = status;
            response
                .headers_mut()
                .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
            response
        }
        Err(e) => ApiError::Internal(format!("failed to serialize response: {e}")).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;
    use serde::Deserialize;

    fn request(uri: &str, body: &'static str) -> Request {
        http::Request::builder()
            .method(Method::POST)
            .uri(uri)
            .body(Full::new(Bytes::from_static(body.as_bytes())))
            .unwrap()
    }

    async fn parts(uri: &str, body: &'static str) -> RequestParts {
        let mut params = HashMap::new();
        params.insert("id".to_string(), "17".to_string());
        RequestParts::from_request(params, request(uri, body)).await
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Paging {
        #[serde(default)]
        page: Option<u32>,
    }

    #[tokio::test]
    async fn test_params() {
        let parts = parts("/x", "").await;
        assert_eq!(parts.param("id").unwrap(), "17");
        assert_eq!(parts.parse_param::<u32>("id").unwrap(), 17);
        assert!(matches!(parts.param("other"), Err(ApiError::Internal(_))));
        assert!(matches!(
            parts.parse_param::<bool>("id"),
            Err(ApiError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_params_are_percent_decoded() {
        let mut params = HashMap::new();
        params.insert("who".to_string(), "John%20Doe".to_string());
        params.insert("accent".to_string(), "%C3%A9t%C3%A9".to_string());
        params.insert("broken".to_string(), "%FF%FE".to_string());
        let parts = RequestParts::from_request(params, request("/x", "")).await;

        assert_eq!(parts.param("who").unwrap(), "John Doe");
        assert_eq!(parts.param("accent").unwrap(), "été");
        assert!(matches!(parts.param("broken"), Err(ApiError::Validation(_))));
    }

    #[tokio::test]
    async fn test_query() {
        let with = parts("/x?page=3", "").await;
        assert_eq!(with.query::<Paging>().unwrap(), Paging { page: Some(3) });

        let without = parts("/x", "").await;
        assert_eq!(without.query::<Paging>().unwrap(), Paging { page: None });

        let bad = parts("/x?page=minus", "").await;
        assert!(matches!(bad.query::<Paging>(), Err(ApiError::Validation(_))));
    }

    #[tokio::test]
    async fn test_json_body() {
        let good = parts("/x", r#"{"page": 2}"#).await;
        assert_eq!(good.json::<Paging>().unwrap(), Paging { page: Some(2) });

        let bad = parts("/x", "{").await;
        assert!(matches!(bad.json::<Paging>(), Err(ApiError::Validation(_))));
    }

    #[tokio::test]
    async fn test_handler_fn_maps_errors() {
        let handler = handler_fn(|_parts| async { Err(ApiError::validation("nope")) });
        let mut ctx = MiddlewareContext::new();
        let response = handler(&mut ctx, request("/x", "")).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_handler_fn_sees_context_params() {
        let handler = handler_fn(|parts: RequestParts| async move {
            let who = parts.param("who")?.to_string();
            Ok(json_response(StatusCode::OK, &who))
        });
        let mut ctx = MiddlewareContext::new().with_param("who", "world");
        let response = handler(&mut ctx, request("/x", "")).await;

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], br#""world""#);
    }

    #[test]
    fn test_json_response_sets_content_type() {
        let response = json_response(StatusCode::OK, &[1, 2, 3]);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }
}
