//! Stage composition for one recognition request.
//!
//! # Design
//! - Stages run strictly in order: resource, image, recognizer, cleanup.
//! - Cleanup runs exactly once on every path that acquired a resource, success or not.
//! - Defaults for country and extension are applied here, after validation.

use std::sync::Arc;

use bytes::Bytes;
use plateserve_config::RecognitionPolicy;
use tracing::debug;

use crate::acquire::{AcquiredImage, ImageFetcher, write_upload};
use crate::error::{PipelineError, PipelineResult, Stage};
use crate::recognizer::{RecognitionResult, Recognizer};
use crate::request::{ImageSource, RequestDescriptor};
use crate::scratch::{ScratchSpace, TempResource};

/// Runs validated requests through acquisition and recognition.
#[derive(Clone)]
pub struct RecognitionPipeline {
    scratch: ScratchSpace,
    policy: Arc<RecognitionPolicy>,
    fetcher: Arc<dyn ImageFetcher>,
    recognizer: Arc<dyn Recognizer>,
}

impl RecognitionPipeline {
    /// Assemble a pipeline from its collaborators.
    #[must_use]
    pub fn new(
        scratch: ScratchSpace,
        policy: Arc<RecognitionPolicy>,
        fetcher: Arc<dyn ImageFetcher>,
        recognizer: Arc<dyn Recognizer>,
    ) -> Self {
        Self {
            scratch,
            policy,
            fetcher,
            recognizer,
        }
    }

    /// Scratch space the pipeline stages images in.
    #[must_use]
    pub const fn scratch(&self) -> &ScratchSpace {
        &self.scratch
    }

    /// Recognize the image described by `descriptor`.
    ///
    /// `upload` carries the request body for upload-style requests and is ignored for
    /// remote sources.
    ///
    /// # Errors
    ///
    /// Returns the first stage failure. The temporary file has been removed by the time
    /// this resolves, whatever the outcome.
    pub async fn run(
        &self,
        descriptor: &RequestDescriptor,
        upload: Option<Bytes>,
    ) -> PipelineResult<RecognitionResult> {
        let extension = descriptor
            .file_extension()
            .unwrap_or(self.policy.default_extension());
        let mut resource = self.scratch.acquire(extension).await?;

        let outcome = self.recognize_staged(descriptor, upload, &resource).await;
        resource.release().await;
        outcome
    }

    async fn recognize_staged(
        &self,
        descriptor: &RequestDescriptor,
        upload: Option<Bytes>,
        resource: &TempResource,
    ) -> PipelineResult<RecognitionResult> {
        let image = self.acquire_image(descriptor, upload, resource).await?;
        debug!(
            stage = Stage::AcquireImage.as_str(),
            path = %image.path.display(),
            bytes = image.bytes,
            country_code = image.country_code,
            pattern = descriptor.pattern(),
            "image staged"
        );
        self.recognizer
            .recognize(image.path, image.country_code)
            .await
    }

    /// Fill `resource` with the request's image and resolve the effective country code.
    ///
    /// # Errors
    ///
    /// Returns an acquisition failure when the image cannot be fetched or written, and
    /// [`PipelineError::MissingParameter`] when an upload-style request has no body.
    pub async fn acquire_image<'a>(
        &'a self,
        descriptor: &'a RequestDescriptor,
        upload: Option<Bytes>,
        resource: &'a TempResource,
    ) -> PipelineResult<AcquiredImage<'a>> {
        let bytes = match (descriptor.source(), upload) {
            (ImageSource::Remote { url }, _) => self.fetcher.fetch(url, resource.path()).await?,
            (ImageSource::Upload, Some(body)) => write_upload(&body, resource.path()).await?,
            (ImageSource::Upload, None) => {
                return Err(PipelineError::MissingParameter { name: "body" });
            }
        };
        Ok(AcquiredImage {
            path: resource.path(),
            country_code: descriptor
                .country_code()
                .unwrap_or_else(|| self.policy.default_country()),
            bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RecognizerFailure;
    use crate::request::{RequestParams, RequestStyle, RequestValidator, Validation};
    use async_trait::async_trait;
    use plateserve_test_support::fixtures::{SAMPLE_JPEG, scratch_dir};
    use std::error::Error;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    #[derive(Default)]
    struct StubFetcher {
        fail: bool,
    }

    #[async_trait]
    impl ImageFetcher for StubFetcher {
        async fn fetch(&self, url: &str, destination: &Path) -> PipelineResult<u64> {
            if self.fail {
                return Err(PipelineError::acquisition(
                    "fetch.send",
                    url,
                    std::io::Error::other("connection refused"),
                ));
            }
            write_upload(SAMPLE_JPEG, destination).await
        }
    }

    #[derive(Default)]
    struct RecordingRecognizer {
        fail: bool,
        calls: Mutex<Vec<(PathBuf, String, Vec<u8>)>>,
    }

    #[async_trait]
    impl Recognizer for RecordingRecognizer {
        async fn recognize(
            &self,
            image: &Path,
            country_code: &str,
        ) -> PipelineResult<RecognitionResult> {
            let contents = std::fs::read(image).unwrap_or_default();
            self.calls
                .lock()
                .expect("calls lock")
                .push((image.to_path_buf(), country_code.to_string(), contents));
            if self.fail {
                return Err(PipelineError::recognizer(RecognizerFailure::ErrorOutput {
                    output: "boom".to_string(),
                }));
            }
            Ok(RecognitionResult::new(Bytes::from_static(b"{\"results\":[]}")))
        }
    }

    fn pipeline(
        dir: &Path,
        fetcher: StubFetcher,
        recognizer: Arc<RecordingRecognizer>,
    ) -> RecognitionPipeline {
        RecognitionPipeline::new(
            ScratchSpace::new(dir),
            Arc::new(RecognitionPolicy::default()),
            Arc::new(fetcher),
            recognizer,
        )
    }

    fn descriptor(style: RequestStyle, query: &str) -> Result<RequestDescriptor, Box<dyn Error>> {
        let validator = RequestValidator::new(Arc::new(RecognitionPolicy::default()))?;
        match validator.validate(style, "/", &RequestParams::from_query(Some(query)))? {
            Validation::Matched(descriptor) => Ok(descriptor),
            Validation::NoRoute => Err("request was not routed".into()),
        }
    }

    fn leftover_files(dir: &Path) -> std::io::Result<usize> {
        Ok(std::fs::read_dir(dir)?.count())
    }

    #[tokio::test]
    async fn remote_request_uses_default_country_and_cleans_up() -> Result<(), Box<dyn Error>> {
        let dir = scratch_dir()?;
        let recognizer = Arc::new(RecordingRecognizer::default());
        let pipeline = pipeline(dir.path(), StubFetcher::default(), Arc::clone(&recognizer));
        let descriptor = descriptor(RequestStyle::Read, "image_url=http://x/plate.jpeg")?;

        let result = pipeline.run(&descriptor, None).await?;
        assert_eq!(result.as_bytes(), b"{\"results\":[]}");

        let calls = recognizer.calls.lock().expect("calls lock");
        assert_eq!(calls.len(), 1);
        let (path, country, contents) = &calls[0];
        assert_eq!(country, "eu");
        assert_eq!(contents.as_slice(), SAMPLE_JPEG);
        assert_eq!(path.extension().and_then(|ext| ext.to_str()), Some("jpeg"));
        assert!(!path.exists());
        assert_eq!(leftover_files(dir.path())?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn upload_is_staged_as_jpg_with_requested_country() -> Result<(), Box<dyn Error>> {
        let dir = scratch_dir()?;
        let recognizer = Arc::new(RecordingRecognizer::default());
        let pipeline = pipeline(dir.path(), StubFetcher::default(), Arc::clone(&recognizer));
        let descriptor = descriptor(RequestStyle::Write, "country_code=us")?;

        pipeline
            .run(&descriptor, Some(Bytes::from_static(b"raw-upload")))
            .await?;

        let calls = recognizer.calls.lock().expect("calls lock");
        let (path, country, contents) = &calls[0];
        assert_eq!(country, "us");
        assert_eq!(contents.as_slice(), b"raw-upload");
        assert_eq!(path.extension().and_then(|ext| ext.to_str()), Some("jpg"));
        assert_eq!(leftover_files(dir.path())?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn fetch_failure_skips_recognizer_and_cleans_up() -> Result<(), Box<dyn Error>> {
        let dir = scratch_dir()?;
        let recognizer = Arc::new(RecordingRecognizer::default());
        let pipeline = pipeline(dir.path(), StubFetcher { fail: true }, Arc::clone(&recognizer));
        let descriptor = descriptor(RequestStyle::Read, "image_url=http://x/plate.jpg")?;

        let err = pipeline.run(&descriptor, None).await.err();
        assert_eq!(err.map(|err| err.stage()), Some(Stage::AcquireImage));
        assert!(recognizer.calls.lock().expect("calls lock").is_empty());
        assert_eq!(leftover_files(dir.path())?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn recognizer_failure_still_cleans_up() -> Result<(), Box<dyn Error>> {
        let dir = scratch_dir()?;
        let recognizer = Arc::new(RecordingRecognizer {
            fail: true,
            ..RecordingRecognizer::default()
        });
        let pipeline = pipeline(dir.path(), StubFetcher::default(), Arc::clone(&recognizer));
        let descriptor = descriptor(RequestStyle::Read, "image_url=http://x/plate.jpg")?;

        let err = pipeline.run(&descriptor, None).await.err();
        assert_eq!(
            err.map(|err| err.response_message()),
            Some("recognizer failed: boom".to_string())
        );
        assert_eq!(leftover_files(dir.path())?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn upload_without_body_is_rejected_after_cleanup() -> Result<(), Box<dyn Error>> {
        let dir = scratch_dir()?;
        let recognizer = Arc::new(RecordingRecognizer::default());
        let pipeline = pipeline(dir.path(), StubFetcher::default(), recognizer);
        let descriptor = descriptor(RequestStyle::Write, "")?;

        let err = pipeline.run(&descriptor, None).await.err();
        assert!(matches!(
            err,
            Some(PipelineError::MissingParameter { name: "body" })
        ));
        assert_eq!(leftover_files(dir.path())?, 0);
        assert_eq!(pipeline.scratch().root(), dir.path());
        Ok(())
    }

    #[tokio::test]
    async fn concurrent_requests_use_distinct_files() -> Result<(), Box<dyn Error>> {
        let dir = scratch_dir()?;
        let recognizer = Arc::new(RecordingRecognizer::default());
        let pipeline = pipeline(dir.path(), StubFetcher::default(), Arc::clone(&recognizer));
        let descriptor = descriptor(RequestStyle::Read, "image_url=http://x/plate.jpg")?;

        let runs = (0..8).map(|_| pipeline.run(&descriptor, None));
        for outcome in futures_util::future::join_all(runs).await {
            outcome?;
        }

        let calls = recognizer.calls.lock().expect("calls lock");
        let mut paths: Vec<_> = calls.iter().map(|(path, _, _)| path.clone()).collect();
        paths.sort();
        paths.dedup();
        assert_eq!(paths.len(), 8);
        assert_eq!(leftover_files(dir.path())?, 0);
        Ok(())
    }
}
