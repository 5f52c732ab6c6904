//! Error-to-response mapping.
//!
//! Failures answer `503 Service Unavailable` with a plain-text message; unmatched
//! requests answer `404 Not Found` with an empty body.

use std::error::Error;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use plateserve_pipeline::PipelineError;
use plateserve_telemetry::RequestOutcome;
use tracing::warn;

/// Response-ready failure.
#[derive(Debug)]
pub(crate) struct ApiError {
    status: StatusCode,
    detail: Option<String>,
}

impl ApiError {
    pub(crate) const fn not_found() -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            detail: None,
        }
    }

    pub(crate) fn service_unavailable(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            detail: Some(detail.into()),
        }
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        RequestOutcome::Failed.record_current();
        warn!(
            stage = err.stage().as_str(),
            error = %err,
            detail = ?err.source(),
            "recognition request failed"
        );
        Self::service_unavailable(err.response_message())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.detail {
            Some(detail) => (self.status, detail).into_response(),
            None => self.status.into_response(),
        }
    }
}
