//! Telemetry error types

use thiserror::Error;

/// Errors that can occur while setting up logging
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TelemetryError {
    /// A global subscriber is already installed, or installing one failed
    #[error("Failed to initialize telemetry: {0}")]
    InitializationFailed(String),

    /// The configuration cannot be used
    #[error("Invalid telemetry configuration: {0}")]
    InvalidConfiguration(String),
}

/// Result type for telemetry operations
pub type TelemetryResult<T> = Result<T, TelemetryError>;
