//! HTTP server lifecycle.

use std::future::Future;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::error::ApiError;
use crate::routes::create_router;
use crate::state::AppState;

pub struct ApiServer {
    bind_address: String,
    state: Arc<AppState>,
}

impl ApiServer {
    #[must_use]
    pub fn new(bind_address: impl Into<String>, state: Arc<AppState>) -> Self {
        Self {
            bind_address: bind_address.into(),
            state,
        }
    }

    #[must_use]
    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Serve until `shutdown_signal` resolves.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot bind or the server fails.
    pub async fn run_with_shutdown(
        self,
        shutdown_signal: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), ApiError> {
        let app = create_router(self.state);

        let listener = TcpListener::bind(&self.bind_address)
            .await
            .map_err(|e| {
                ApiError::Internal(format!("Failed to bind to {}: {e}", self.bind_address))
            })?;

        info!(address = %self.bind_address, "API server listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| ApiError::Internal(format!("Server error: {e}")))?;

        warn!("API server shutting down");
        Ok(())
    }
}

/// Resolves on Ctrl-C.
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
