//! External recognizer invocation.
//!
//! # Design
//! - The recognizer is a separate program: `<program> -j -c <country> -p <region> <image>`.
//! - Standard output is collected verbatim and becomes the response body.
//! - Any data on standard error fails the invocation immediately; the child is killed.
//! - A non-zero exit without error output still yields the collected output.
//! - Invocations are bounded by a timeout; an abandoned child is killed on drop.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use plateserve_config::RecognizerConfig;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{PipelineError, PipelineResult, RecognizerFailure, Stage};

const STDOUT_CHUNK: usize = 8 * 1024;
const STDERR_CHUNK: usize = 1024;

/// Raw recognizer output, passed through unparsed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecognitionResult {
    body: Bytes,
}

impl RecognitionResult {
    /// Wrap recognizer output.
    #[must_use]
    pub fn new(body: impl Into<Bytes>) -> Self {
        Self { body: body.into() }
    }

    /// Output bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.body
    }

    /// Output length in bytes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.body.len()
    }

    /// Whether the recognizer printed nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Consume into the underlying buffer.
    #[must_use]
    pub fn into_bytes(self) -> Bytes {
        self.body
    }
}

/// Turns a staged image into recognition output.
#[async_trait]
pub trait Recognizer: Send + Sync {
    /// Recognize plates in `image` using `country_code` rules.
    async fn recognize(&self, image: &Path, country_code: &str)
    -> PipelineResult<RecognitionResult>;
}

/// [`Recognizer`] that runs an external program per request.
#[derive(Clone, Debug)]
pub struct CommandRecognizer {
    program: PathBuf,
    region_hint: String,
    timeout: Duration,
}

impl CommandRecognizer {
    /// Recognizer configured from `config`.
    #[must_use]
    pub fn new(config: &RecognizerConfig) -> Self {
        Self {
            program: config.program.clone(),
            region_hint: config.region_hint.clone(),
            timeout: config.timeout,
        }
    }

    /// Program that will be spawned.
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Argument list for one invocation.
    #[must_use]
    pub fn arguments(&self, image: &Path, country_code: &str) -> Vec<OsString> {
        vec![
            OsString::from("-j"),
            OsString::from("-c"),
            OsString::from(country_code),
            OsString::from("-p"),
            OsString::from(&self.region_hint),
            image.as_os_str().to_os_string(),
        ]
    }

    async fn run(&self, image: &Path, country_code: &str) -> Result<Bytes, RecognizerFailure> {
        let mut child = Command::new(&self.program)
            .args(self.arguments(image, country_code))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| RecognizerFailure::Launch {
                program: self.program.clone(),
                source,
            })?;
        let mut stdout = child.stdout.take().ok_or_else(|| uncaptured("stdout"))?;
        let mut stderr = child.stderr.take().ok_or_else(|| uncaptured("stderr"))?;

        let output = collect_output(&mut stdout, &mut stderr).await?;
        let status = child
            .wait()
            .await
            .map_err(|source| RecognizerFailure::Wait { source })?;
        if !status.success() {
            warn!(
                stage = Stage::Recognize.as_str(),
                program = %self.program.display(),
                code = ?status.code(),
                "recognizer exited unsuccessfully without error output"
            );
        }
        Ok(Bytes::from(output))
    }
}

#[async_trait]
impl Recognizer for CommandRecognizer {
    async fn recognize(
        &self,
        image: &Path,
        country_code: &str,
    ) -> PipelineResult<RecognitionResult> {
        debug!(
            stage = Stage::Recognize.as_str(),
            program = %self.program.display(),
            image = %image.display(),
            country_code,
            "invoking recognizer"
        );
        let body = tokio::time::timeout(self.timeout, self.run(image, country_code))
            .await
            .map_err(|_| RecognizerFailure::TimedOut {
                after: self.timeout,
            })
            .and_then(|outcome| outcome)
            .map_err(PipelineError::recognizer)?;
        debug!(
            stage = Stage::Recognize.as_str(),
            bytes = body.len(),
            "recognizer finished"
        );
        Ok(RecognitionResult::new(body))
    }
}

/// Read both streams until they close, failing on the first error output.
async fn collect_output<O, E>(stdout: &mut O, stderr: &mut E) -> Result<Vec<u8>, RecognizerFailure>
where
    O: AsyncRead + Unpin,
    E: AsyncRead + Unpin,
{
    let mut output = Vec::new();
    let mut out_chunk = [0_u8; STDOUT_CHUNK];
    let mut err_chunk = [0_u8; STDERR_CHUNK];
    let mut stdout_open = true;
    let mut stderr_open = true;

    while stdout_open || stderr_open {
        tokio::select! {
            read = stdout.read(&mut out_chunk), if stdout_open => {
                let read = read.map_err(|source| RecognizerFailure::Stream {
                    stream: "stdout",
                    source,
                })?;
                if read == 0 {
                    stdout_open = false;
                } else {
                    output.extend_from_slice(&out_chunk[..read]);
                }
            }
            read = stderr.read(&mut err_chunk), if stderr_open => {
                let read = read.map_err(|source| RecognizerFailure::Stream {
                    stream: "stderr",
                    source,
                })?;
                if read == 0 {
                    stderr_open = false;
                } else {
                    return Err(RecognizerFailure::ErrorOutput {
                        output: String::from_utf8_lossy(&err_chunk[..read]).into_owned(),
                    });
                }
            }
        }
    }
    Ok(output)
}

fn uncaptured(stream: &'static str) -> RecognizerFailure {
    RecognizerFailure::Stream {
        stream,
        source: io::Error::other("stream was not captured"),
    }
}
