//! Global subscriber installation.
//!
//! # Design
//! - `RUST_LOG` wins over the configured directive; an invalid configured directive is an error.
//! - Output is JSON in release builds and human-readable in debug builds unless chosen explicitly.
//! - The build SHA is recorded once so every span reports the same value.

use once_cell::sync::OnceCell;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::{Result, TelemetryError};

/// Filter directive used when nothing else is configured.
pub const DEFAULT_LOG_LEVEL: &str = "info";

static BUILD_SHA: OnceCell<String> = OnceCell::new();

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event.
    Json,
    /// Compact human-readable lines.
    Pretty,
}

impl LogFormat {
    /// Format implied by the build profile.
    #[must_use]
    pub const fn for_build() -> Self {
        if cfg!(debug_assertions) {
            Self::Pretty
        } else {
            Self::Json
        }
    }

    /// Resolve a configured format name; unknown or absent names use [`LogFormat::for_build`].
    #[must_use]
    pub fn from_name(name: Option<&str>) -> Self {
        match name {
            Some("json") => Self::Json,
            Some("pretty") => Self::Pretty,
            _ => Self::for_build(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig<'a> {
    /// Filter directive, e.g. `info` or `plateserve_pipeline=debug,info`.
    pub directive: &'a str,
    /// Output format.
    pub format: LogFormat,
    /// Build identifier recorded on the process span.
    pub build_sha: &'a str,
}

impl Default for LoggingConfig<'_> {
    fn default() -> Self {
        Self {
            directive: DEFAULT_LOG_LEVEL,
            format: LogFormat::for_build(),
            build_sha: option_env!("PLATESERVE_BUILD_SHA").unwrap_or("dev"),
        }
    }
}

/// Install the global tracing subscriber.
///
/// # Errors
///
/// Returns an error when the directive does not parse or a global subscriber is
/// already installed.
pub fn init_logging(config: &LoggingConfig<'_>) -> Result<()> {
    let filter = resolve_filter(
        std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref(),
        config.directive,
    )?;
    let _ = BUILD_SHA.set(config.build_sha.to_string());

    let registry = tracing_subscriber::registry().with(filter);
    let installed = match config.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().flatten_event(true).with_target(false))
            .try_init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().compact().with_target(false))
            .try_init(),
    };
    installed.map_err(|source| TelemetryError::SubscriberInstall { source })
}

/// Build SHA recorded at initialisation, or `dev` before logging is installed.
#[must_use]
pub fn build_sha() -> &'static str {
    BUILD_SHA.get().map_or("dev", String::as_str)
}

fn resolve_filter(from_env: Option<&str>, directive: &str) -> Result<EnvFilter> {
    if let Some(filter) = from_env.and_then(|raw| EnvFilter::try_new(raw).ok()) {
        return Ok(filter);
    }
    EnvFilter::try_new(directive).map_err(|source| TelemetryError::InvalidFilter {
        directive: directive.to_string(),
        source,
    })
}
