//! Service wiring: configuration, logging, pipeline collaborators, and the HTTP server.

use std::sync::Arc;

use plateserve_api::{ApiServer, ApiState};
use plateserve_config::ServiceConfig;
use plateserve_pipeline::{
    CommandRecognizer, HttpImageFetcher, RecognitionPipeline, RequestValidator, ScratchSpace,
};
use plateserve_telemetry::{GlobalContextGuard, LogFormat, LoggingConfig, init_logging};
use tracing::{info, warn};

use crate::error::{AppError, AppResult};

/// Entry point for the gateway boot sequence.
///
/// # Errors
///
/// Returns an error if configuration is invalid, logging cannot be installed, the
/// scratch directory cannot be prepared, or the server fails to bind or serve.
pub async fn run_app() -> AppResult<()> {
    let config = ServiceConfig::from_env().map_err(|err| AppError::config("config.load", err))?;

    let logging = LoggingConfig {
        directive: &config.logging.level,
        format: LogFormat::from_name(config.logging.format.as_deref()),
        ..LoggingConfig::default()
    };
    init_logging(&logging).map_err(|err| AppError::telemetry("telemetry.init", err))?;
    let _context = GlobalContextGuard::enter("serve");

    info!(
        addr = %config.listener.socket_addr(),
        recognizer = %config.recognizer.program.display(),
        "plateserve starting"
    );

    let server = build_server(&config).await?;
    server
        .serve(config.listener.socket_addr(), shutdown_signal())
        .await
        .map_err(|err| AppError::api_server("api.serve", err))?;

    info!("plateserve stopped");
    Ok(())
}

/// Assemble the validator, pipeline, and router described by `config`.
pub(crate) async fn build_server(config: &ServiceConfig) -> AppResult<ApiServer> {
    let scratch = ScratchSpace::new(&config.scratch_dir);
    scratch
        .prepare()
        .await
        .map_err(|err| AppError::pipeline("scratch.prepare", err))?;

    let policy = Arc::new(config.policy.clone());
    let validator = RequestValidator::new(Arc::clone(&policy))
        .map_err(|err| AppError::pipeline("validator.new", err))?;
    let fetcher = HttpImageFetcher::new(config.fetch_timeout)
        .map_err(|err| AppError::pipeline("fetcher.new", err))?;
    let recognizer = CommandRecognizer::new(&config.recognizer);

    let pipeline =
        RecognitionPipeline::new(scratch, policy, Arc::new(fetcher), Arc::new(recognizer));
    Ok(ApiServer::new(ApiState::new(
        validator,
        pipeline,
        config.max_upload_bytes,
    )))
}

/// Resolves on Ctrl-C or, on unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to listen for terminate signal");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("ctrl-c received, shutting down"),
        () = terminate => info!("terminate signal received, shutting down"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plateserve_config::RecognizerConfig;
    use plateserve_test_support::fixtures::scratch_dir;
    use std::error::Error;
    use std::time::Duration;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn build_server_creates_missing_scratch_dir() -> Result<(), Box<dyn Error>> {
        let dir = scratch_dir()?;
        let nested = dir.path().join("plates").join("scratch");
        let config = ServiceConfig {
            scratch_dir: nested.clone(),
            ..ServiceConfig::default()
        };
        build_server(&config).await?;
        assert!(nested.is_dir());
        Ok(())
    }

    #[tokio::test]
    async fn build_server_fails_when_scratch_dir_is_a_file() -> Result<(), Box<dyn Error>> {
        let dir = scratch_dir()?;
        let blocker = dir.path().join("occupied");
        std::fs::write(&blocker, b"not a directory")?;
        let config = ServiceConfig {
            scratch_dir: blocker.join("scratch"),
            ..ServiceConfig::default()
        };
        let err = build_server(&config).await.err();
        assert!(matches!(
            err,
            Some(AppError::Pipeline {
                operation: "scratch.prepare",
                ..
            })
        ));
        Ok(())
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn wired_server_runs_the_recognizer_end_to_end() -> Result<(), Box<dyn Error>> {
        use plateserve_test_support::fixtures::write_stub_program;

        let dir = scratch_dir()?;
        let program = write_stub_program(
            dir.path(),
            "alpr",
            "printf '{\"country\":\"%s\",\"region\":\"%s\"}' \"$3\" \"$5\"",
        )?;
        let scratch = dir.path().join("scratch");
        let config = ServiceConfig {
            scratch_dir: scratch.clone(),
            recognizer: RecognizerConfig {
                program,
                region_hint: "sk".to_string(),
                timeout: Duration::from_secs(10),
            },
            ..ServiceConfig::default()
        };
        let server = build_server(&config).await?;

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
        let handle = tokio::spawn(server.serve_on(listener, async move {
            let _ = stop_rx.await;
        }));

        let client = reqwest::Client::new();
        let response = client
            .post(format!("http://{addr}/?country_code=gb"))
            .body(vec![0xFF_u8, 0xD8, 0xFF, 0xD9])
            .send()
            .await?;
        assert_eq!(response.status().as_u16(), 200);
        assert_eq!(
            response.text().await?,
            "{\"country\":\"gb\",\"region\":\"sk\"}"
        );

        let missing = client.get(format!("http://{addr}/elsewhere")).send().await?;
        assert_eq!(missing.status().as_u16(), 404);
        assert!(missing.bytes().await?.is_empty());

        assert_eq!(std::fs::read_dir(&scratch)?.count(), 0);
        let _ = stop_tx.send(());
        handle.await??;
        Ok(())
    }
}
