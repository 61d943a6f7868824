//! SpaceHub server entry point.

use std::path::PathBuf;
use std::sync::Arc;

use spacehub_db::{DbPool, migrate};
use spacehub_server::server::shutdown_signal;
use spacehub_server::{ApiServer, AppState, ServerConfig};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("spacehub=info,tower_http=info")),
        )
        .json()
        .init();

    if let Err(e) = run().await {
        error!(error = %e, "SpaceHub server failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting SpaceHub server...");

    let config_path = std::env::var_os("SPACEHUB_CONFIG").map(PathBuf::from);
    let config = ServerConfig::load(config_path.as_deref())?;

    let pool = DbPool::connect(&config.database.to_db_config()).await?;
    migrate(&pool).await?;

    let state = Arc::new(AppState::new(pool, config.auth.clone()));

    if config.repair_namespaces_on_startup {
        let repaired = state.provisioner.repair_all().await?;
        info!(count = repaired.len(), "Namespace repair complete");
    }

    match state.auth.purge_expired().await {
        Ok(purged) => info!(purged, "Expired refresh tokens purged"),
        Err(e) => warn!(error = %e, "Refresh token purge failed"),
    }

    ApiServer::new(config.bind_address(), state)
        .run_with_shutdown(shutdown_signal())
        .await?;

    info!("SpaceHub server stopped.");
    Ok(())
}
