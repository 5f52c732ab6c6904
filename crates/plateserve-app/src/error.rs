//! Startup and shutdown failures of the gateway binary.
//!
//! Every variant names the boot step (`operation`) that failed; the wrapped crate error
//! stays reachable through `source()`.

use thiserror::Error;

/// Result alias for application operations.
pub type AppResult<T> = Result<T, AppError>;

/// Failure that stops the gateway.
#[derive(Debug, Error)]
pub enum AppError {
    /// The environment held an invalid setting.
    #[error("invalid gateway configuration")]
    Config {
        /// Operation identifier.
        operation: &'static str,
        /// Source configuration error.
        source: plateserve_config::ConfigError,
    },
    /// The tracing subscriber could not be installed.
    #[error("logging could not be initialised")]
    Telemetry {
        /// Operation identifier.
        operation: &'static str,
        /// Source telemetry error.
        source: plateserve_telemetry::TelemetryError,
    },
    /// Pipeline construction failed.
    #[error("pipeline setup failed")]
    Pipeline {
        /// Operation identifier.
        operation: &'static str,
        /// Source pipeline error.
        source: plateserve_pipeline::PipelineError,
    },
    /// The listener could not bind or stopped with an error.
    #[error("recognition listener failed")]
    ApiServer {
        /// Operation identifier.
        operation: &'static str,
        /// Source API server error.
        source: plateserve_api::ApiServerError,
    },
}

impl AppError {
    pub(crate) const fn config(
        operation: &'static str,
        source: plateserve_config::ConfigError,
    ) -> Self {
        Self::Config { operation, source }
    }

    pub(crate) const fn telemetry(
        operation: &'static str,
        source: plateserve_telemetry::TelemetryError,
    ) -> Self {
        Self::Telemetry { operation, source }
    }

    pub(crate) const fn pipeline(
        operation: &'static str,
        source: plateserve_pipeline::PipelineError,
    ) -> Self {
        Self::Pipeline { operation, source }
    }

    pub(crate) const fn api_server(
        operation: &'static str,
        source: plateserve_api::ApiServerError,
    ) -> Self {
        Self::ApiServer { operation, source }
    }
}
