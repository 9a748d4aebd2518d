//! Operation identity.
//!
//! An [`Operation`] names one endpoint: its method, its path template and a
//! stable identifier. Operations are created once when routes are registered
//! and shared behind `Arc` for the life of the process.

use http::Method;
use std::fmt;

/// The `{method, path, operation_id}` identity of an endpoint.
///
/// # Example
///
/// ```
/// use rolodex_core::Operation;
/// use http::Method;
///
/// let op = Operation::new(Method::GET, "/api/contacts/{id}");
/// assert_eq!(op.operation_id(), "get-api-contacts-by-id");
/// assert_eq!(op.path(), "/api/contacts/{id}");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Operation {
    method: Method,
    path: String,
    operation_id: String,
}

impl Operation {
    /// Creates an operation with an identifier derived from method and path.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        let path = path.into();
        let operation_id = generate_operation_id(&method, &path);
        Self {
            method,
            path,
            operation_id,
        }
    }

    /// Creates an operation with an explicit identifier.
    pub fn with_id(method: Method, path: impl Into<String>, operation_id: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            operation_id: operation_id.into(),
        }
    }

    /// Returns the HTTP method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the path template, e.g. `/api/contacts/{id}`.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the operation identifier.
    #[must_use]
    pub fn operation_id(&self) -> &str {
        &self.operation_id
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// Lowercase method followed by one slug per path segment; `{param}`
/// segments become `by-param`.
fn generate_operation_id(method: &Method, path: &str) -> String {
    let mut id = method.as_str().to_ascii_lowercase();

    for segment in path.split('/').filter(|s| !s.is_empty()) {
        id.push('-');
        if let Some(param) = segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            id.push_str("by-");
            push_slug(&mut id, param);
        } else {
            push_slug(&mut id, segment);
        }
    }

    id
}

fn push_slug(out: &mut String, segment: &str) {
    for c in segment.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else {
            out.push('-');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_generated_ids() {
        let cases = [
            (Method::POST, "/api/contacts", "post-api-contacts"),
            (Method::GET, "/api/contacts", "get-api-contacts"),
            (Method::PUT, "/api/contacts/{id}", "put-api-contacts-by-id"),
            (Method::DELETE, "/api/contacts/{id}", "delete-api-contacts-by-id"),
            (Method::GET, "/api/greet/{who}", "get-api-greet-by-who"),
            (Method::GET, "/teapot", "get-teapot"),
            (Method::GET, "/", "get"),
        ];

        for (method, path, expected) in cases {
            assert_eq!(Operation::new(method, path).operation_id(), expected);
        }
    }

    #[test]
    fn test_explicit_id() {
        let op = Operation::with_id(Method::GET, "/teapot", "brew");
        assert_eq!(op.operation_id(), "brew");
        assert_eq!(op.to_string(), "GET /teapot");
    }

    #[test]
    fn test_non_alphanumeric_segments_are_slugged() {
        let op = Operation::new(Method::GET, "/v1/user_profiles");
        assert_eq!(op.operation_id(), "get-v1-user-profiles");
    }

    proptest! {
        #[test]
        fn generated_ids_are_lowercase_slugs(segments in prop::collection::vec("[a-zA-Z0-9_]{1,8}", 0..5)) {
            let path = format!("/{}", segments.join("/"));
            let op = Operation::new(Method::PATCH, path);
            prop_assert!(op.operation_id().starts_with("patch"));
            prop_assert!(op
                .operation_id()
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
        }
    }
}
