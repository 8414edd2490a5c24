//! Stride Tracker server
//!
//! Serves the workout API and the dashboard WebSocket.

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use stride_tracker::api::{create_router, AppState};
use stride_tracker::config::Config;
use stride_tracker::database::DatabaseManager;
use stride_tracker::logging::{init_logging, log_startup};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;

    init_logging(&config.log_level, config.is_production());
    log_startup();
    config.log_config();

    config.ensure_data_dir()?;

    let database = DatabaseManager::new(&config.resolved_database_url()).await?;
    database.migrate().await?;
    database.test_connection().await?;

    let addr = config.bind_address();
    let state = AppState::new(config, database.pool.clone())?;
    let timer = state.timer.clone();
    let app = create_router(state);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("Stride Tracker listening on http://{}", addr);
    info!("API available at http://{}/api/", addr);
    info!("Dashboard WebSocket at ws://{}/ws", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    timer.shutdown().await;
    info!("Stride Tracker stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
