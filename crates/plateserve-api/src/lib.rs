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

//! HTTP surface for the plate recognition service.
//!
//! Layout: `http/router.rs` (server host and middleware), `http/recognize.rs` (the single
//! dispatch handler), `http/errors.rs` (response mapping), `state.rs` (shared state),
//! `error.rs` (server lifecycle errors).

pub mod error;
pub mod http;
pub mod state;

pub use error::{ApiServerError, ApiServerResult};
pub use http::router::ApiServer;
pub use state::ApiState;
