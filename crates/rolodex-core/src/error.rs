//! Domain error types.
//!
//! Storage and service implementations report failures with [`DomainError`].
//! The HTTP boundary maps each kind to a status code with
//! [`DomainError::status_code`]; everything above the handlers only ever
//! sees that status.

use http::StatusCode;
use thiserror::Error;

/// Result type alias using [`DomainError`].
pub type DomainResult<T> = Result<T, DomainError>;

/// Errors returned by stores and services.
///
/// # Example
///
/// ```
/// use rolodex_core::DomainError;
/// use http::StatusCode;
///
/// let err = DomainError::NotFound;
/// assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
/// assert_eq!(err.to_string(), "domain: not found");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// The requested contact does not exist.
    #[error("domain: not found")]
    NotFound,

    /// An argument was rejected by the domain.
    #[error("domain: invalid argument: {0}")]
    Invalid(String),
}

impl DomainError {
    /// Creates an [`DomainError::Invalid`] error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }

    /// Returns the HTTP status code this error maps to.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    /// Returns `true` for [`DomainError::NotFound`].
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}
