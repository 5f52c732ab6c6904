//! Image acquisition into a temporary resource.
//!
//! Remote images are streamed chunk by chunk; uploads are written in one go. In both
//! cases the file is flushed and synced before the recognizer is allowed to read it.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::{PipelineError, PipelineResult, Stage};

/// A staged image ready for recognition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AcquiredImage<'a> {
    /// File holding the complete image.
    pub path: &'a Path,
    /// Country code to recognize with, defaults applied.
    pub country_code: &'a str,
    /// Bytes written.
    pub bytes: u64,
}

/// Downloads remote images.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// Stream the resource at `url` into `destination`. Resolves only after every chunk
    /// has been written and flushed.
    async fn fetch(&self, url: &str, destination: &Path) -> PipelineResult<u64>;
}

/// [`ImageFetcher`] backed by a shared `reqwest` client.
#[derive(Clone, Debug)]
pub struct HttpImageFetcher {
    client: reqwest::Client,
}

impl HttpImageFetcher {
    /// Fetcher whose requests are bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error when the HTTP client cannot be constructed.
    pub fn new(timeout: Duration) -> PipelineResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| PipelineError::acquisition("fetch.client", "http client", err))?;
        Ok(Self { client })
    }

    /// Fetcher over an existing client.
    #[must_use]
    pub const fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str, destination: &Path) -> PipelineResult<u64> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| PipelineError::acquisition("fetch.send", url, err))?
            .error_for_status()
            .map_err(|err| PipelineError::acquisition("fetch.status", url, err))?;

        let mut file = open_destination(destination).await?;
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|err| PipelineError::acquisition("fetch.read", url, err))?;
            file.write_all(&chunk)
                .await
                .map_err(|err| write_failed("fetch.write", destination, err))?;
            written += chunk.len() as u64;
        }
        finish(file, destination).await?;
        debug!(
            stage = Stage::AcquireImage.as_str(),
            url,
            bytes = written,
            "remote image stored"
        );
        Ok(written)
    }
}

/// Write an uploaded body to `destination`.
///
/// # Errors
///
/// Returns an error when the file cannot be opened, written, or synced.
pub async fn write_upload(body: &[u8], destination: &Path) -> PipelineResult<u64> {
    let mut file = open_destination(destination).await?;
    file.write_all(body)
        .await
        .map_err(|err| write_failed("upload.write", destination, err))?;
    finish(file, destination).await?;
    debug!(
        stage = Stage::AcquireImage.as_str(),
        bytes = body.len(),
        "uploaded image stored"
    );
    Ok(body.len() as u64)
}

async fn open_destination(destination: &Path) -> PipelineResult<File> {
    File::create(destination)
        .await
        .map_err(|err| write_failed("image.open", destination, err))
}

async fn finish(mut file: File, destination: &Path) -> PipelineResult<()> {
    file.flush()
        .await
        .map_err(|err| write_failed("image.flush", destination, err))?;
    file.sync_all()
        .await
        .map_err(|err| write_failed("image.sync", destination, err))
}

fn write_failed(operation: &'static str, destination: &Path, err: std::io::Error) -> PipelineError {
    PipelineError::acquisition(operation, destination.display().to_string(), err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use plateserve_test_support::fixtures::{SAMPLE_JPEG, scratch_dir};
    use std::error::Error;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    async fn serve_once(response: &'static [u8]) -> Result<String, Box<dyn Error>> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut request = [0_u8; 1024];
                let _ = socket.read(&mut request).await;
                let _ = socket.write_all(response).await;
                let _ = socket.shutdown().await;
            }
        });
        Ok(format!("http://{addr}/plate.jpg"))
    }

    #[tokio::test]
    async fn upload_is_written_completely() -> Result<(), Box<dyn Error>> {
        let dir = scratch_dir()?;
        let path = dir.path().join("upload.jpg");
        let written = write_upload(SAMPLE_JPEG, &path).await?;
        assert_eq!(written, SAMPLE_JPEG.len() as u64);
        assert_eq!(std::fs::read(&path)?, SAMPLE_JPEG);
        Ok(())
    }

    #[tokio::test]
    async fn upload_into_missing_directory_fails() -> Result<(), Box<dyn Error>> {
        let dir = scratch_dir()?;
        let path = dir.path().join("missing").join("upload.jpg");
        let err = write_upload(SAMPLE_JPEG, &path).await.err();
        assert!(matches!(
            err,
            Some(PipelineError::AcquisitionFailed {
                operation: "image.open",
                ..
            })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn remote_image_is_streamed_to_disk() -> Result<(), Box<dyn Error>> {
        let url = serve_once(
            b"HTTP/1.1 200 OK\r\nContent-Length: 9\r\nConnection: close\r\n\r\nplatedata",
        )
        .await?;
        let dir = scratch_dir()?;
        let path = dir.path().join("remote.jpg");
        let fetcher = HttpImageFetcher::new(Duration::from_secs(5))?;
        let written = fetcher.fetch(&url, &path).await?;
        assert_eq!(written, 9);
        assert_eq!(std::fs::read(&path)?, b"platedata");
        Ok(())
    }

    #[tokio::test]
    async fn error_status_is_an_acquisition_failure() -> Result<(), Box<dyn Error>> {
        let url = serve_once(
            b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        )
        .await?;
        let dir = scratch_dir()?;
        let fetcher = HttpImageFetcher::with_client(reqwest::Client::new());
        let err = fetcher.fetch(&url, &dir.path().join("remote.jpg")).await.err();
        assert!(matches!(
            err,
            Some(PipelineError::AcquisitionFailed {
                operation: "fetch.status",
                ..
            })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn unreachable_host_is_an_acquisition_failure() -> Result<(), Box<dyn Error>> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        drop(listener);
        let dir = scratch_dir()?;
        let fetcher = HttpImageFetcher::new(Duration::from_secs(5))?;
        let err = fetcher
            .fetch(&format!("http://{addr}/plate.jpg"), &dir.path().join("x.jpg"))
            .await
            .err();
        assert_eq!(err.map(|err| err.stage()), Some(Stage::AcquireImage));
        Ok(())
    }
}
