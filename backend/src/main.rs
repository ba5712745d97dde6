use axum::Router;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

use cexwatch_backend::api::create_cex_router;
use cexwatch_backend::config::AppConfig;
use cexwatch_backend::services::CexServices;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let config = AppConfig::load()?;
    let bind_addr = config.bind_addr.clone();
    let services = CexServices::from_config(config).await?;

    // Startup collection; a failure here leaves retrying to the scheduled cycles
    match services.scheduler.run_startup().await {
        Ok(report) => info!(
            "Startup collection finished: {} tokens in {}ms",
            report.tokens_processed, report.elapsed_ms
        ),
        Err(e) => error!("Startup collection failed: {}", e),
    }
    services.scheduler.start().await;

    let app = Router::new()
        .merge(create_cex_router().with_state(services.api_state()))
        .layer(CorsLayer::permissive());

    info!("Starting server on {}", bind_addr);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    services.scheduler.stop().await;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
