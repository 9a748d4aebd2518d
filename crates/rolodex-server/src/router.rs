//! Request routing and path matching.
//!
//! The router maps a method and path to a registered [`Operation`] and its
//! handler. Path templates use `{param}` segments; the values are extracted
//! into the route match and later copied into the
//! [`MiddlewareContext`](rolodex_middleware::MiddlewareContext). Values are
//! kept as they appear in the request path; handlers decode them through
//! [`RequestParts::param`](crate::handler::RequestParts::param).
//!
//! Segments match exactly: a trailing slash or an empty segment is a
//! different path, and a parameter never matches an empty segment. `HEAD`
//! falls back to the `GET` route of the same path.
//!
//! Every route is mounted under the router's prefix, and the operation is
//! created from the full path so metrics carry the prefixed template.
//!
//! # Example
//!
//! ```rust
//! use rolodex_server::router::{Resolution, Router};
//! use rolodex_server::handler::handler_fn;
//! use rolodex_middleware::{Response, ResponseExt};
//! use http::{Method, StatusCode};
//!
//! let mut router = Router::with_prefix("/api");
//! let op = router.route(
//!     Method::GET,
//!     "/contacts/{id}",
//!     handler_fn(|_parts| async { Ok(Response::empty(StatusCode::OK)) }),
//! );
//! assert_eq!(op.path(), "/api/contacts/{id}");
//!
//! match router.resolve(&Method::GET, "/api/contacts/42") {
//!     Resolution::Found(m) => assert_eq!(m.param("id"), Some("42")),
//!     _ => unreachable!(),
//! }
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use http::Method;
use rolodex_core::Operation;

use crate::handler::BoxedHandler;

/// A matched route with extracted path parameters.
#[derive(Clone)]
pub struct RouteMatch {
    operation: Arc<Operation>,
    params: HashMap<String, String>,
    handler: BoxedHandler,
}

impl RouteMatch {
    /// Returns the matched operation.
    #[must_use]
    pub fn operation(&self) -> &Arc<Operation> {
        &self.operation
    }

    /// Returns the extracted path parameters.
    #[must_use]
    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    /// Returns a specific path parameter by name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Returns the route handler.
    #[must_use]
    pub fn handler(&self) -> &BoxedHandler {
        &self.handler
    }

    /// Splits the match into its parts.
    #[must_use]
    pub fn into_parts(self) -> (Arc<Operation>, HashMap<String, String>, BoxedHandler) {
        (self.operation, self.params, self.handler)
    }
}

impl fmt::Debug for RouteMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteMatch")
            .field("operation", &self.operation)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Outcome of resolving a request against the router.
#[derive(Debug)]
pub enum Resolution {
    /// A route matched method and path.
    Found(RouteMatch),

    /// The path matched, but only for other methods.
    MethodNotAllowed(Vec<Method>),

    /// No route matched the path.
    NotFound,
}

/// A segment of a path template.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PathSegment {
    /// A literal segment (e.g., "contacts")
    Literal(String),

    /// A parameter segment (e.g., "{id}")
    Param(String),
}

struct Route {
    operation: Arc<Operation>,
    segments: Vec<PathSegment>,
    handler: BoxedHandler,
}

impl Route {
    fn parse_segments(pattern: &str) -> Vec<PathSegment> {
        pattern
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| match s.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Some(name) => PathSegment::Param(name.to_string()),
                None => PathSegment::Literal(s.to_string()),
            })
            .collect()
    }

    /// Returns the extracted parameters if the route's template matches.
    fn match_path(&self, path_segments: &[&str]) -> Option<HashMap<String, String>> {
        if path_segments.len() != self.segments.len() {
            return None;
        }

        let mut params = HashMap::new();
        for (pattern, actual) in self.segments.iter().zip(path_segments) {
            match pattern {
                PathSegment::Literal(expected) if expected != actual => return None,
                PathSegment::Literal(_) => {}
                PathSegment::Param(_) if actual.is_empty() => return None,
                PathSegment::Param(name) => {
                    params.insert(name.clone(), (*actual).to_string());
                }
            }
        }
        Some(params)
    }

    fn found(&self, params: HashMap<String, String>) -> RouteMatch {
        RouteMatch {
            operation: Arc::clone(&self.operation),
            params,
            handler: Arc::clone(&self.handler),
        }
    }
}

/// HTTP request router.
///
/// Routes are checked in registration order; the first match wins.
#[derive(Default)]
pub struct Router {
    prefix: String,
    routes: Vec<Route>,
}

impl Router {
    /// Creates a router without a prefix.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a router mounting every route under `prefix`.
    ///
    /// Trailing slashes are ignored and a leading slash is added if missing.
    ///
    /// ```rust
    /// use rolodex_server::router::Router;
    ///
    /// assert_eq!(Router::with_prefix("api/").prefix(), "/api");
    /// assert_eq!(Router::with_prefix("/").prefix(), "");
    /// ```
    #[must_use]
    pub fn with_prefix(prefix: impl AsRef<str>) -> Self {
        Self {
            prefix: normalize_prefix(prefix.as_ref()),
            routes: Vec::new(),
        }
    }

    /// Returns the normalized prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Registers a handler for `method` and the prefixed `pattern`.
    ///
    /// Returns the operation created for the route.
    pub fn route(
        &mut self,
        method: Method,
        pattern: impl AsRef<str>,
        handler: BoxedHandler,
    ) -> Arc<Operation> {
        let full = join_path(&self.prefix, pattern.as_ref());
        let operation = Arc::new(Operation::new(method, full));
        tracing::debug!(operation = %operation, id = operation.operation_id(), "route registered");

        self.routes.push(Route {
            segments: Route::parse_segments(operation.path()),
            operation: Arc::clone(&operation),
            handler,
        });
        operation
    }

    /// Resolves a request path.
    #[must_use]
    pub fn resolve(&self, method: &Method, path: &str) -> Resolution {
        let path_segments = split_path(path);
        let mut allowed = Vec::new();
        let mut head_fallback = None;

        for route in &self.routes {
            let Some(params) = route.match_path(&path_segments) else {
                continue;
            };
            let route_method = route.operation.method();
            if route_method == method {
                return Resolution::Found(route.found(params));
            }
            if method == Method::HEAD && route_method == Method::GET && head_fallback.is_none() {
                head_fallback = Some(route.found(params));
                continue;
            }
            if !allowed.contains(route_method) {
                allowed.push(route_method.clone());
            }
            if route_method == Method::GET && !allowed.contains(&Method::HEAD) {
                allowed.push(Method::HEAD);
            }
        }

        if let Some(found) = head_fallback {
            Resolution::Found(found)
        } else if allowed.is_empty() {
            Resolution::NotFound
        } else {
            Resolution::MethodNotAllowed(allowed)
        }
    }

    /// Returns the number of registered routes.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Returns all registered operations in registration order.
    pub fn operations(&self) -> impl Iterator<Item = &Arc<Operation>> {
        self.routes.iter().map(|r| &r.operation)
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("prefix", &self.prefix)
            .field(
                "routes",
                &self.routes.iter().map(|r| r.operation.to_string()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Splits a request path into segments, keeping empty ones.
fn split_path(path: &str) -> Vec<&str> {
    match path.strip_prefix('/').unwrap_or(path) {
        "" => Vec::new(),
        rest => rest.split('/').collect(),
    }
}

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

fn join_path(prefix: &str, pattern: &str) -> String {
    let pattern = pattern.trim_start_matches('/');
    match (prefix.is_empty(), pattern.is_empty()) {
        (true, _) => format!("/{pattern}"),
        (false, true) => prefix.to_string(),
        (false, false) => format!("{prefix}/{pattern}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::handler_fn;
    use http::StatusCode;
    use proptest::prelude::*;
    use rolodex_middleware::{Response, ResponseExt};

    fn ok() -> BoxedHandler {
        handler_fn(|_parts| async { Ok(Response::empty(StatusCode::OK)) })
    }

    fn contacts_router() -> Router {
        let mut router = Router::with_prefix("/api");
        router.route(Method::POST, "/contacts", ok());
        router.route(Method::GET, "/contacts", ok());
        router.route(Method::GET, "/contacts/{id}", ok());
        router.route(Method::PUT, "/contacts/{id}", ok());
        router.route(Method::DELETE, "/contacts/{id}", ok());
        router.route(Method::GET, "/greet/{who}", ok());
        router
    }

    #[test]
    fn test_operations_use_prefixed_paths() {
        let router = contacts_router();
        let ids: Vec<_> = router.operations().map(|op| op.operation_id()).collect();
        assert_eq!(
            ids,
            vec![
                "post-api-contacts",
                "get-api-contacts",
                "get-api-contacts-by-id",
                "put-api-contacts-by-id",
                "delete-api-contacts-by-id",
                "get-api-greet-by-who",
            ]
        );
        assert_eq!(router.route_count(), 6);
    }

    #[test]
    fn test_resolve_found_with_params() {
        let router = contacts_router();
        match router.resolve(&Method::PUT, "/api/contacts/abc") {
            Resolution::Found(m) => {
                assert_eq!(m.operation().operation_id(), "put-api-contacts-by-id");
                assert_eq!(m.param("id"), Some("abc"));
            }
            other => panic!("expected a match, got {other:?}"),
        }
    }

    #[test]
    fn test_resolve_method_not_allowed() {
        let router = contacts_router();
        match router.resolve(&Method::PATCH, "/api/contacts/abc") {
            Resolution::MethodNotAllowed(allowed) => {
                assert_eq!(
                    allowed,
                    vec![Method::GET, Method::HEAD, Method::PUT, Method::DELETE]
                );
            }
            other => panic!("expected 405, got {other:?}"),
        }
    }

    #[test]
    fn test_resolve_not_found() {
        let router = contacts_router();
        assert!(matches!(router.resolve(&Method::GET, "/contacts"), Resolution::NotFound));
        assert!(matches!(
            router.resolve(&Method::GET, "/api/contacts/1/2"),
            Resolution::NotFound
        ));
        assert!(matches!(router.resolve(&Method::GET, "/"), Resolution::NotFound));
    }

    #[test]
    fn test_segments_match_exactly() {
        let router = contacts_router();
        for path in ["/api/contacts/", "//api//contacts", "/api//contacts", "/api/greet/"] {
            assert!(
                matches!(router.resolve(&Method::GET, path), Resolution::NotFound),
                "{path}"
            );
        }
        assert_eq!(split_path("/"), Vec::<&str>::new());
        assert_eq!(split_path("/a//b/"), vec!["a", "", "b", ""]);
    }

    #[test]
    fn test_head_falls_back_to_get() {
        let router = contacts_router();
        match router.resolve(&Method::HEAD, "/api/contacts/abc") {
            Resolution::Found(m) => {
                assert_eq!(m.operation().operation_id(), "get-api-contacts-by-id");
                assert_eq!(m.param("id"), Some("abc"));
            }
            other => panic!("expected the GET route, got {other:?}"),
        }

        let mut explicit = Router::new();
        explicit.route(Method::GET, "/ping", ok());
        explicit.route(Method::HEAD, "/ping", ok());
        match explicit.resolve(&Method::HEAD, "/ping") {
            Resolution::Found(m) => assert_eq!(m.operation().operation_id(), "head-ping"),
            other => panic!("expected the HEAD route, got {other:?}"),
        }
    }

    #[test]
    fn test_prefix_normalization() {
        assert_eq!(normalize_prefix(""), "");
        assert_eq!(normalize_prefix("/"), "");
        assert_eq!(normalize_prefix("api"), "/api");
        assert_eq!(normalize_prefix("/api/v1/"), "/api/v1");

        assert_eq!(join_path("", "/panic"), "/panic");
        assert_eq!(join_path("/api", "/"), "/api");
        assert_eq!(join_path("/api", "contacts"), "/api/contacts");
    }

    #[test]
    fn test_unprefixed_router() {
        let mut router = Router::new();
        let op = router.route(Method::GET, "/teapot", ok());
        assert_eq!(op.path(), "/teapot");
        assert_eq!(op.operation_id(), "get-teapot");
        assert!(matches!(router.resolve(&Method::GET, "/teapot"), Resolution::Found(_)));
    }

    proptest! {
        #[test]
        fn param_segments_capture_any_value(value in "[a-zA-Z0-9._~-]{1,40}") {
            let router = contacts_router();
            let path = format!("/api/greet/{value}");
            match router.resolve(&Method::GET, &path) {
                Resolution::Found(m) => prop_assert_eq!(m.param("who"), Some(value.as_str())),
                other => prop_assert!(false, "unexpected {:?}", other),
            }
        }

        #[test]
        fn unknown_first_segment_is_not_found(segment in "[a-z]{1,12}") {
            prop_assume!(segment != "api");
            let router = contacts_router();
            let path = format!("/{segment}/contacts");
            prop_assert!(matches!(router.resolve(&Method::GET, &path), Resolution::NotFound));
        }
    }
}
