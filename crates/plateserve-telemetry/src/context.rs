//! Process-wide span context.

use tracing::{Span, span::Entered};

use crate::init::build_sha;

/// Keeps the process span entered so every event carries the service version and build.
pub struct GlobalContextGuard {
    _entered: Entered<'static>,
}

impl GlobalContextGuard {
    /// Enter the `plateserve` span, tagged with the lifecycle `phase`.
    #[must_use]
    pub fn enter(phase: &str) -> Self {
        let span: &'static Span = Box::leak(Box::new(tracing::info_span!(
            "plateserve",
            phase = %phase,
            version = env!("CARGO_PKG_VERSION"),
            build_sha = %build_sha()
        )));
        Self {
            _entered: span.enter(),
        }
    }
}
