//! Common types used throughout the middleware pipeline.

use bytes::Bytes;
use http::{header, HeaderValue, StatusCode};
use http_body_util::Full;

/// The HTTP request type used in the middleware pipeline.
///
/// Bodies are collected before the pipeline runs.
pub type Request = http::Request<Full<Bytes>>;

/// The HTTP response type used in the middleware pipeline.
pub type Response = http::Response<Full<Bytes>>;

/// Extension trait for building responses without a fallible builder.
pub trait ResponseExt {
    /// Creates an empty response with the given status code.
    fn empty(status: StatusCode) -> Response;

    /// Creates a plain-text error response.
    fn error(status: StatusCode, message: &str) -> Response;

    /// Creates a JSON error response:
    /// `{"error": {"code": ..., "message": ...}}`.
    fn json_error(status: StatusCode, code: &str, message: &str) -> Response;
}

fn with_body(status: StatusCode, content_type: &'static str, body: Bytes) -> Response {
    let mut response = http::Response::new(Full::new(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

impl ResponseExt for Response {
    fn empty(status: StatusCode) -> Response {
        let mut response = http::Response::new(Full::new(Bytes::new()));
        *response.status_mut() = status;
        response
    }

    fn error(status: StatusCode, message: &str) -> Response {
        with_body(
            status,
            "text/plain; charset=utf-8",
            Bytes::from(message.to_string()),
        )
    }

    fn json_error(status: StatusCode, code: &str, message: &str) -> Response {
        let body = serde_json::json!({
            "error": {
                "code": code,
                "message": message
            }
        });

        with_body(status, "application/json", Bytes::from(body.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[test]
    fn test_empty_response() {
        let response = Response::empty(StatusCode::NO_CONTENT);
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.headers().get(header::CONTENT_TYPE).is_none());
    }

    #[test]
    fn test_error_response() {
        let response = Response::error(StatusCode::BAD_REQUEST, "Invalid input");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/plain; charset=utf-8"
        );
    }

    #[tokio::test]
    async fn test_json_error_response() {
        let response = Response::json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            "internal server error",
        );
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["code"], "INTERNAL_ERROR");
    }
}
