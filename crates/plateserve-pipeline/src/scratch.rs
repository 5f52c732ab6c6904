//! Scoped temporary files for staged images.
//!
//! # Design
//! - Every request gets its own uniquely named file; names never collide across tasks.
//! - [`TempResource::release`] is the normal cleanup path and is idempotent.
//! - Dropping an unreleased resource removes the file synchronously so cancelled requests
//!   do not leak scratch files.
//! - Cleanup failures are logged and never surface to callers.

use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{PipelineError, PipelineResult, Stage};

const SCRATCH_PREFIX: &str = "plate-";

/// Directory that hosts per-request temporary images.
#[derive(Clone, Debug)]
pub struct ScratchSpace {
    root: PathBuf,
}

impl ScratchSpace {
    /// Scratch space rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory the temporary files are created in.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Ensure the scratch directory exists.
    ///
    /// # Errors
    ///
    /// Returns an error when the directory cannot be created.
    pub async fn prepare(&self) -> PipelineResult<()> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|err| PipelineError::acquisition("scratch.prepare", self.display(), err))
    }

    /// Create a fresh, empty file whose name ends in `.{extension}`.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be created in the scratch directory.
    pub async fn acquire(&self, extension: &str) -> PipelineResult<TempResource> {
        let root = self.root.clone();
        let suffix = format!(".{extension}");
        let created = tokio::task::spawn_blocking(move || {
            tempfile::Builder::new()
                .prefix(SCRATCH_PREFIX)
                .suffix(&suffix)
                .tempfile_in(&root)
        })
        .await
        .map_err(|err| PipelineError::acquisition("scratch.join", self.display(), err))?
        .map_err(|err| PipelineError::acquisition("scratch.create", self.display(), err))?;

        let path = created
            .into_temp_path()
            .keep()
            .map_err(|err| PipelineError::acquisition("scratch.keep", self.display(), err.error))?;
        debug!(
            stage = Stage::AcquireResource.as_str(),
            path = %path.display(),
            "temporary image created"
        );
        Ok(TempResource {
            path,
            released: false,
        })
    }

    fn display(&self) -> String {
        self.root.display().to_string()
    }
}

/// Exclusively owned temporary file for one request.
#[derive(Debug)]
pub struct TempResource {
    path: PathBuf,
    released: bool,
}

impl TempResource {
    /// Location of the file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether cleanup already ran.
    #[must_use]
    pub const fn is_released(&self) -> bool {
        self.released
    }

    /// Remove the file. Runs at most once; an already missing file counts as removed.
    pub async fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        let outcome = tokio::fs::remove_file(&self.path).await;
        self.report(outcome);
    }

    fn report(&self, outcome: io::Result<()>) {
        match outcome {
            Ok(()) => debug!(
                stage = Stage::Cleanup.as_str(),
                path = %self.path.display(),
                "temporary image removed"
            ),
            Err(err) if err.kind() == io::ErrorKind::NotFound => debug!(
                stage = Stage::Cleanup.as_str(),
                path = %self.path.display(),
                "temporary image already absent"
            ),
            Err(source) => {
                let err = PipelineError::CleanupFailed {
                    path: self.path.clone(),
                    source,
                };
                warn!(
                    stage = Stage::Cleanup.as_str(),
                    path = %self.path.display(),
                    error = %err,
                    detail = ?std::error::Error::source(&err),
                    "temporary image cleanup failed"
                );
            }
        }
    }
}

impl Drop for TempResource {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        let outcome = std::fs::remove_file(&self.path);
        self.report(outcome);
    }
}
