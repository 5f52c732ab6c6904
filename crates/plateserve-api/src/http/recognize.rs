//! Recognition request handler.
//!
//! Every request lands here: the method picks the request style, the validator decides
//! whether anything is served at the path, and matched requests run the pipeline.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Method, Uri, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use plateserve_pipeline::{
    ImageSource, PipelineError, RequestParams, RequestStyle, Validation,
};
use plateserve_telemetry::RequestOutcome;
use tracing::debug;

use crate::http::constants::CONTENT_TYPE_JSON;
use crate::http::errors::ApiError;
use crate::state::ApiState;

/// Dispatch one request through validation and, when matched, the recognition pipeline.
pub(crate) async fn recognize(
    State(state): State<Arc<ApiState>>,
    method: Method,
    uri: Uri,
    body: Body,
) -> Result<Response, ApiError> {
    let style = RequestStyle::from_method(method.as_str());
    let params = RequestParams::from_query(uri.query());
    let descriptor = match state.validator.validate(style, uri.path(), &params)? {
        Validation::Matched(descriptor) => descriptor,
        Validation::NoRoute => {
            RequestOutcome::NoRoute.record_current();
            return Err(ApiError::not_found());
        }
    };
    debug!(
        style = ?style,
        country_code = descriptor.country_code(),
        pattern = descriptor.pattern(),
        "request validated"
    );

    let upload = match descriptor.source() {
        ImageSource::Upload => Some(
            axum::body::to_bytes(body, state.max_upload_bytes)
                .await
                .map_err(|err| PipelineError::acquisition("upload.read", "request body", err))?,
        ),
        ImageSource::Remote { .. } => None,
    };

    let result = state.pipeline.run(&descriptor, upload).await?;
    RequestOutcome::Recognized.record_current();
    Ok(([(CONTENT_TYPE, CONTENT_TYPE_JSON)], result.into_bytes()).into_response())
}
