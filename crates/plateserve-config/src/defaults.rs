//! Baseline values used when the environment does not override a setting.
//!
//! # Design
//! - Centralize defaults so the loader and the policy agree on them.
//! - Keep time-based defaults explicit in seconds.

/// Listener address used when `PLATESERVE_BIND_ADDR` is unset.
pub const BIND_ADDR: &str = "0.0.0.0";
/// Listener port used when `PLATESERVE_HTTP_PORT` is unset.
pub const HTTP_PORT: u16 = 8080;
/// External recognizer program.
pub const RECOGNIZER_PROGRAM: &str = "alpr";
/// Pattern-region hint passed to every recognizer invocation.
pub const RECOGNIZER_REGION: &str = "sk";
/// Upper bound for one recognizer invocation.
pub const RECOGNIZER_TIMEOUT_SECS: u64 = 60;
/// Upper bound for one remote image fetch.
pub const FETCH_TIMEOUT_SECS: u64 = 30;
/// Upper bound for a buffered upload body.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
/// Country codes accepted from callers.
pub const COUNTRY_CODES: &[&str] = &["us", "eu", "gb"];
/// Country code used when the caller supplies none (or an unknown one).
pub const DEFAULT_COUNTRY: &str = "eu";
/// Image types accepted for remote sources.
pub const SUPPORTED_TYPES: &[&str] = &["jpg", "jpeg"];
/// Extension given to buffered uploads and extension-less remote sources.
pub const DEFAULT_EXTENSION: &str = "jpg";
/// Default tracing filter.
pub const LOG_LEVEL: &str = "info";
