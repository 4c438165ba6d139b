use anyhow::{anyhow, Result};
use internal_arbitrage_scanner::{api, config::Config};
use std::net::SocketAddr;
use tracing::{error, info, Level};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    let config = Config::load().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    let addr: SocketAddr = format!("{}:{}", config.api.bind, config.api.port)
        .parse()
        .map_err(|e| anyhow!("Invalid API bind address: {}", e))?;

    let app = api::router(config.output.results_path.clone(), &config.exchange.name);

    info!(
        "Results API listening on http://{}{} (serving {})",
        addr,
        api::RESULTS_ROUTE,
        config.output.results_path.display()
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Results API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, stopping results API");
}
