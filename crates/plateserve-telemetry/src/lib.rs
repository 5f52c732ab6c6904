#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Telemetry primitives shared across the plateserve workspace.
//!
//! Layout: `init.rs` (subscriber installation, build SHA), `context.rs` (process span),
//! `http.rs` (request ids, request spans, outcomes), `error.rs` (error types).

pub mod context;
pub mod error;
pub mod http;
pub mod init;

pub use context::GlobalContextGuard;
pub use error::{Result, TelemetryError};
pub use http::{
    HttpTraceLayer, REQUEST_ID_HEADER, RequestOutcome, RequestSpan, ResponseRecorder,
    propagate_request_id_layer, set_request_id_layer, trace_layer,
};
pub use init::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, build_sha, init_logging};
