//! Error types for telemetry operations.

use thiserror::Error;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::util::TryInitError;

/// Result alias for telemetry operations.
pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Errors raised while installing logging.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The configured filter directive could not be parsed.
    #[error("invalid log filter directive")]
    InvalidFilter {
        /// Directive as configured.
        directive: String,
        /// Parser error.
        source: ParseError,
    },
    /// Installing the global tracing subscriber failed.
    #[error("failed to install tracing subscriber")]
    SubscriberInstall {
        /// Underlying subscriber error.
        source: TryInitError,
    },
}
