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

//! Process-wide configuration for the plate recognition service.
//!
//! Layout: `defaults.rs` (baseline values), `model.rs` (typed configuration and the
//! recognition policy), `loader.rs` (environment loading), `validate.rs` (value parsing).

pub mod defaults;
pub mod error;
pub mod loader;
pub mod model;
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use model::{ListenerConfig, LogSettings, RecognitionPolicy, RecognizerConfig, ServiceConfig};
