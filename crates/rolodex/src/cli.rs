//! Command line and environment configuration.
//!
//! Every flag can also be set through a `ROLODEX_*` environment variable;
//! flags win over the environment.

use std::time::Duration;

use clap::Parser;
use rolodex_server::config::{
    ServerConfig, DEFAULT_ENDPOINTS_PREFIX, DEFAULT_HOST, DEFAULT_PORT,
};
use rolodex_telemetry::{LogConfig, LogFormat};

/// Rolodex: a contact service with Prometheus metrics.
#[derive(Parser, Debug, Clone)]
#[command(name = "rolodex")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Host address to bind to (empty binds all interfaces)
    #[arg(short = 'H', long, env = "ROLODEX_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "ROLODEX_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Time allowed to read request headers (e.g. "15s", "500ms")
    #[arg(
        long,
        env = "ROLODEX_READ_HEADER_TIMEOUT",
        default_value = "15s",
        value_parser = humantime::parse_duration
    )]
    pub read_header_timeout: Duration,

    /// Path prefix of the REST endpoints
    #[arg(long, env = "ROLODEX_ENDPOINTS_PREFIX", default_value = DEFAULT_ENDPOINTS_PREFIX)]
    pub endpoints_prefix: String,

    /// Time allowed for open connections to finish on shutdown
    #[arg(
        long,
        env = "ROLODEX_SHUTDOWN_TIMEOUT",
        default_value = "60s",
        value_parser = humantime::parse_duration
    )]
    pub shutdown_timeout: Duration,

    /// Log filter (trace, debug, info, warn, error or an env-filter directive)
    #[arg(long, env = "ROLODEX_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format (json, text)
    #[arg(long, env = "ROLODEX_LOG_FORMAT", default_value = "json")]
    pub log_format: LogFormat,
}

impl Cli {
    /// Parse configuration from CLI arguments and environment.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Server settings.
    pub fn to_server_config(&self) -> ServerConfig {
        ServerConfig::builder()
            .host(self.host.clone())
            .port(self.port)
            .read_header_timeout(self.read_header_timeout)
            .endpoints_prefix(self.endpoints_prefix.clone())
            .shutdown_timeout(self.shutdown_timeout)
            .build()
    }

    /// Logging settings.
    pub fn to_log_config(&self) -> LogConfig {
        LogConfig::default()
            .with_level(self.log_level.clone())
            .with_format(self.log_format)
    }
}
