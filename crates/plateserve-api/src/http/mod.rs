//! HTTP surface modules (router, handler, response mapping).

/// Shared constants for the HTTP surface.
pub mod constants;
/// Error-to-response mapping.
pub mod errors;
/// Recognition request handler.
pub mod recognize;
/// Router construction and server host.
pub mod router;
