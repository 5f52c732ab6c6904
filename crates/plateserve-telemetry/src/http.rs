//! Request-scoped tracing for the HTTP surface.
//!
//! # Design
//! - Every request carries an `x-request-id`; one is generated when the caller sends none,
//!   and it is echoed on the response.
//! - Each request runs inside an `http.request` span that declares its fields up front:
//!   the handler fills in `outcome`, the response hook fills in status and latency.
//! - Failed responses are already logged by the handler, so the trace layer stays quiet
//!   about them.

use std::time::Duration;

use axum::http::{HeaderName, Request, Response};
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultOnBodyChunk, DefaultOnEos, MakeSpan, OnResponse, TraceLayer};
use tracing::Span;

use crate::init::build_sha;

/// Header that carries the request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// How a request ended, as recorded on its span.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestOutcome {
    /// The recognizer produced output.
    Recognized,
    /// A pipeline stage failed.
    Failed,
    /// Nothing is served at the method and path.
    NoRoute,
}

impl RequestOutcome {
    /// Stable label used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Recognized => "recognized",
            Self::Failed => "failed",
            Self::NoRoute => "no_route",
        }
    }

    /// Record this outcome on the current request span.
    pub fn record_current(self) {
        Span::current().record("outcome", self.as_str());
    }
}

/// Layer that assigns a UUID request id when the caller sent none.
#[must_use]
pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::new(HeaderName::from_static(REQUEST_ID_HEADER), MakeRequestUuid)
}

/// Layer that copies the request id onto the response.
#[must_use]
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(HeaderName::from_static(REQUEST_ID_HEADER))
}

/// Builds the `http.request` span.
#[derive(Clone, Copy, Debug, Default)]
pub struct RequestSpan;

impl<B> MakeSpan<B> for RequestSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        let request_id = request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        tracing::info_span!(
            "http.request",
            method = %request.method(),
            route = %request.uri().path(),
            request_id = %request_id,
            build_sha = %build_sha(),
            outcome = tracing::field::Empty,
            status_code = tracing::field::Empty,
            latency_ms = tracing::field::Empty
        )
    }
}

/// Records status and latency once the response is ready.
#[derive(Clone, Copy, Debug, Default)]
pub struct ResponseRecorder;

impl<B> OnResponse<B> for ResponseRecorder {
    fn on_response(self, response: &Response<B>, latency: Duration, span: &Span) {
        let latency_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
        span.record("status_code", response.status().as_u16());
        span.record("latency_ms", latency_ms);
        tracing::debug!(parent: span, "request finished");
    }
}

/// Trace layer used by the HTTP surface.
pub type HttpTraceLayer = TraceLayer<
    SharedClassifier<ServerErrorsAsFailures>,
    RequestSpan,
    (),
    ResponseRecorder,
    DefaultOnBodyChunk,
    DefaultOnEos,
    (),
>;

/// Trace layer that opens an [`RequestSpan`] per request and fills it via [`ResponseRecorder`].
#[must_use]
pub fn trace_layer() -> HttpTraceLayer {
    TraceLayer::new_for_http()
        .make_span_with(RequestSpan)
        .on_request(())
        .on_response(ResponseRecorder)
        .on_failure(())
}
