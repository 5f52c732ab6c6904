//! # Design
//!
//! - One error enum for every pipeline stage; messages are constant.
//! - Context (parameter names, urls, paths, recognizer output) lives in fields.
//! - `response_message` renders the caller-facing text; `stage` tells logs where it failed.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Boxed source error used where several client libraries can fail the same stage.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result alias for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Pipeline stages, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    /// Parameter validation.
    Validate,
    /// Temporary file creation.
    AcquireResource,
    /// Remote fetch or upload write into the temporary file.
    AcquireImage,
    /// External recognizer invocation.
    Recognize,
    /// Temporary file removal.
    Cleanup,
}

impl Stage {
    /// Stable label used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validate => "validate",
            Self::AcquireResource => "acquire_resource",
            Self::AcquireImage => "acquire_image",
            Self::Recognize => "recognize",
            Self::Cleanup => "cleanup",
        }
    }
}

/// Errors produced while serving a recognition request.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A required request parameter was absent or empty.
    #[error("Missing required parameter")]
    MissingParameter {
        /// Name of the missing parameter.
        name: &'static str,
    },
    /// The remote image's extension is not a supported image type.
    #[error("Unsupported type")]
    UnsupportedType {
        /// Lower-cased extension taken from the image location.
        extension: String,
    },
    /// Staging the image failed (scratch file, network, or disk).
    #[error("image acquisition failed")]
    AcquisitionFailed {
        /// Operation that failed.
        operation: &'static str,
        /// Url or path the operation targeted.
        target: String,
        /// Underlying error.
        source: BoxError,
    },
    /// The external recognizer could not produce a result.
    #[error("recognizer failed")]
    RecognizerFailed {
        /// What went wrong with the invocation.
        #[source]
        reason: RecognizerFailure,
    },
    /// Removing a temporary file failed. Logged only; never returned to callers.
    #[error("temporary file cleanup failed")]
    CleanupFailed {
        /// File that could not be removed.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// The request validator could not be built.
    #[error("request validator setup failed")]
    ValidatorSetup {
        /// Pattern that failed to compile.
        pattern: &'static str,
        /// Underlying regex error.
        source: regex::Error,
    },
}

/// Reasons a recognizer invocation failed.
#[derive(Debug, Error)]
pub enum RecognizerFailure {
    /// The program could not be started.
    #[error("failed to launch recognizer")]
    Launch {
        /// Program that was spawned.
        program: PathBuf,
        /// Underlying spawn error.
        source: io::Error,
    },
    /// The program wrote to its error stream.
    #[error("recognizer wrote to its error stream")]
    ErrorOutput {
        /// First chunk observed on the error stream.
        output: String,
    },
    /// Reading one of the program's output streams failed.
    #[error("failed to read recognizer output")]
    Stream {
        /// `stdout` or `stderr`.
        stream: &'static str,
        /// Underlying IO error.
        source: io::Error,
    },
    /// Waiting for the program to exit failed.
    #[error("failed to wait for recognizer exit")]
    Wait {
        /// Underlying IO error.
        source: io::Error,
    },
    /// The program did not finish within the configured bound.
    #[error("recognizer timed out")]
    TimedOut {
        /// Bound that elapsed.
        after: Duration,
    },
}

impl RecognizerFailure {
    fn detail(&self) -> String {
        match self {
            Self::Launch { program, source } => {
                format!("{self} '{}': {source}", program.display())
            }
            Self::ErrorOutput { output } => output.trim_end().to_string(),
            Self::Stream { stream, source } => format!("{self} ({stream}): {source}"),
            Self::Wait { source } => format!("{self}: {source}"),
            Self::TimedOut { after } => format!("{self} after {}s", after.as_secs()),
        }
    }
}

impl PipelineError {
    /// Build an acquisition failure for `operation` against `target`.
    pub fn acquisition(
        operation: &'static str,
        target: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::AcquisitionFailed {
            operation,
            target: target.into(),
            source: source.into(),
        }
    }

    pub(crate) const fn recognizer(reason: RecognizerFailure) -> Self {
        Self::RecognizerFailed { reason }
    }

    /// Stage that produced the error.
    #[must_use]
    pub fn stage(&self) -> Stage {
        match self {
            Self::MissingParameter { .. }
            | Self::UnsupportedType { .. }
            | Self::ValidatorSetup { .. } => Stage::Validate,
            Self::AcquisitionFailed { operation, .. } if operation.starts_with("scratch.") => {
                Stage::AcquireResource
            }
            Self::AcquisitionFailed { .. } => Stage::AcquireImage,
            Self::RecognizerFailed { .. } => Stage::Recognize,
            Self::CleanupFailed { .. } => Stage::Cleanup,
        }
    }

    /// Plain-text message returned to the caller.
    #[must_use]
    pub fn response_message(&self) -> String {
        match self {
            Self::MissingParameter { name } => format!("{self}: {name}"),
            Self::UnsupportedType { extension } => format!("{self}: {extension}"),
            Self::AcquisitionFailed { source, .. } => format!("{self}: {source}"),
            Self::RecognizerFailed { reason } => format!("{self}: {}", reason.detail()),
            Self::CleanupFailed { .. } | Self::ValidatorSetup { .. } => self.to_string(),
        }
    }
}
