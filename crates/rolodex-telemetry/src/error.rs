//! Telemetry error types.

use thiserror::Error;

/// Errors that can occur while setting up telemetry.
///
/// Recording and rendering metrics never fail; only initialization does.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Failed to initialize logging.
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
