//! Router construction and server host for the API.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use plateserve_telemetry::{propagate_request_id_layer, set_request_id_layer, trace_layer};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tracing::info;

use crate::error::{ApiServerError, ApiServerResult};
use crate::http::recognize::recognize;
use crate::state::ApiState;

/// Axum router wrapper that hosts the recognition endpoint.
pub struct ApiServer {
    router: Router,
}

impl ApiServer {
    /// Build the router around shared state.
    #[must_use]
    pub fn new(state: ApiState) -> Self {
        let layered = ServiceBuilder::new()
            .layer(set_request_id_layer())
            .layer(propagate_request_id_layer())
            .layer(trace_layer());

        let router = Router::new()
            .fallback(recognize)
            .layer(layered)
            .with_state(Arc::new(state));

        Self { router }
    }

    /// Bind `addr` and serve until `shutdown` resolves, then drain in-flight requests.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener fails to bind or the server terminates unexpectedly.
    pub async fn serve<F>(self, addr: SocketAddr, shutdown: F) -> ApiServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ApiServerError::Bind { addr, source })?;
        self.serve_on(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener address cannot be read or the server terminates
    /// unexpectedly.
    pub async fn serve_on<F>(self, listener: TcpListener, shutdown: F) -> ApiServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener
            .local_addr()
            .map_err(|source| ApiServerError::ListenerAddr { source })?;
        info!(%addr, "accepting recognition requests");
        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|source| ApiServerError::Serve { addr, source })?;
        info!(%addr, "listener drained");
        Ok(())
    }

    #[cfg(test)]
    pub(crate) const fn router(&self) -> &Router {
        &self.router
    }
}
