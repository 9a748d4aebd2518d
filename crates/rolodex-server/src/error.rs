//! Server and request error types.

use http::StatusCode;
use rolodex_core::DomainError;
use rolodex_middleware::{Response, ResponseExt};
use thiserror::Error;

/// Errors that stop the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listener could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address that was requested.
        addr: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// I/O error while serving.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors a route handler can return.
///
/// Every variant maps to one status code and a JSON error envelope:
///
/// ```json
/// {"error": {"code": "NOT_FOUND", "message": "domain: not found"}}
/// ```
#[derive(Debug, Error)]
pub enum ApiError {
    /// Error reported by the contact service.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The request is well-formed HTTP but its content is not acceptable.
    #[error("{0}")]
    Validation(String),

    /// Anything else; the message is never sent to the client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Returns the HTTP status for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Domain(e) => e.status_code(),
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the machine readable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Domain(DomainError::NotFound) => "NOT_FOUND",
            Self::Domain(DomainError::Invalid(_)) | Self::Validation(_) => "VALIDATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Converts the error into a response.
    #[must_use]
    pub fn into_response(self) -> Response {
        let message = match &self {
            Self::Internal(detail) => {
                tracing::error!(error = %detail, "internal error");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };
        Response::json_error(self.status_code(), self.code(), &message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::from(DomainError::NotFound).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(DomainError::invalid("bad")).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::validation("bad").status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::Internal("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_internal_detail_is_hidden() {
        let response = ApiError::Internal("database password is hunter2".into()).into_response();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["error"]["code"], "INTERNAL_ERROR");
        assert_eq!(json["error"]["message"], "internal server error");
    }

    #[tokio::test]
    async fn test_not_found_envelope() {
        let response = ApiError::from(DomainError::NotFound).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["code"], "NOT_FOUND");
        assert_eq!(json["error"]["message"], "domain: not found");
    }

    #[test]
    fn test_bind_error_display() {
        let err = ServerError::Bind {
            addr: "0.0.0.0:80".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.to_string(), "failed to bind 0.0.0.0:80: denied");
    }
}
