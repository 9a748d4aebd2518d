//! Server configuration types.
//!
//! Configuration is built with [`ServerConfig::builder()`]; every setting has
//! a default matching the command line defaults of the `rolodex` binary.
//!
//! # Example
//!
//! ```rust
//! use rolodex_server::ServerConfig;
//! use std::time::Duration;
//!
//! let config = ServerConfig::builder()
//!     .host("127.0.0.1")
//!     .port(9000)
//!     .shutdown_timeout(Duration::from_secs(5))
//!     .build();
//!
//! assert_eq!(config.bind_addr(), "127.0.0.1:9000");
//! assert_eq!(config.endpoints_prefix(), "/api");
//! ```

use std::time::Duration;

/// Default listening host; empty means all interfaces.
pub const DEFAULT_HOST: &str = "";

/// Default listening port.
pub const DEFAULT_PORT: u16 = 8888;

/// Default time allowed to read request headers, in seconds.
pub const DEFAULT_READ_HEADER_TIMEOUT_SECS: u64 = 15;

/// Default prefix the REST endpoints are mounted at.
pub const DEFAULT_ENDPOINTS_PREFIX: &str = "/api";

/// Default graceful shutdown timeout, in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 60;

/// Server configuration.
///
/// Use [`ServerConfig::builder()`] to construct instances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Host to listen on (empty = all interfaces)
    host: String,

    /// Port to listen on
    port: u16,

    /// Time allowed to read request headers
    read_header_timeout: Duration,

    /// Prefix the REST endpoints are mounted at
    endpoints_prefix: String,

    /// How long to wait for open connections on shutdown
    shutdown_timeout: Duration,
}

impl ServerConfig {
    /// Creates a new server configuration builder.
    #[must_use]
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }

    /// Returns the listening host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the listening port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns the `host:port` address to bind, with an empty host
    /// replaced by the unspecified IPv4 address.
    ///
    /// ```rust
    /// use rolodex_server::ServerConfig;
    ///
    /// assert_eq!(ServerConfig::default().bind_addr(), "0.0.0.0:8888");
    /// ```
    #[must_use]
    pub fn bind_addr(&self) -> String {
        let host = if self.host.is_empty() {
            "0.0.0.0"
        } else {
            self.host.as_str()
        };
        format!("{host}:{}", self.port)
    }

    /// Returns the time allowed to read request headers.
    #[must_use]
    pub fn read_header_timeout(&self) -> Duration {
        self.read_header_timeout
    }

    /// Returns the prefix the REST endpoints are mounted at.
    #[must_use]
    pub fn endpoints_prefix(&self) -> &str {
        &self.endpoints_prefix
    }

    /// Returns the graceful shutdown timeout.
    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        self.shutdown_timeout
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Builder for [`ServerConfig`].
#[derive(Debug, Clone)]
pub struct ServerConfigBuilder {
    host: String,
    port: u16,
    read_header_timeout: Duration,
    endpoints_prefix: String,
    shutdown_timeout: Duration,
}

impl ServerConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            read_header_timeout: Duration::from_secs(DEFAULT_READ_HEADER_TIMEOUT_SECS),
            endpoints_prefix: DEFAULT_ENDPOINTS_PREFIX.to_string(),
            shutdown_timeout: Duration::from_secs(DEFAULT_SHUTDOWN_TIMEOUT_SECS),
        }
    }

    /// Sets the host to listen on. An empty host listens on all interfaces.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets the port to listen on. Port `0` picks a free port.
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the time allowed to read request headers.
    ///
    /// Connections that do not deliver complete headers in time are closed.
    #[must_use]
    pub fn read_header_timeout(mut self, timeout: Duration) -> Self {
        self.read_header_timeout = timeout;
        self
    }

    /// Sets the prefix the REST endpoints are mounted at.
    ///
    /// ```rust
    /// use rolodex_server::ServerConfigBuilder;
    ///
    /// let config = ServerConfigBuilder::new().endpoints_prefix("/v1").build();
    /// assert_eq!(config.endpoints_prefix(), "/v1");
    /// ```
    #[must_use]
    pub fn endpoints_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.endpoints_prefix = prefix.into();
        self
    }

    /// Sets the graceful shutdown timeout.
    ///
    /// This is the maximum time the server waits for open connections
    /// to finish after a shutdown signal.
    #[must_use]
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> ServerConfig {
        ServerConfig {
            host: self.host,
            port: self.port,
            read_header_timeout: self.read_header_timeout,
            endpoints_prefix: self.endpoints_prefix,
            shutdown_timeout: self.shutdown_timeout,
        }
    }
}

impl Default for ServerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
