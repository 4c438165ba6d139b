use anyhow::Result;
use internal_arbitrage_scanner::{bot::ScannerBot, config::Config};
use tokio::sync::watch;
use tracing::{error, info, Level};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    info!("Starting internal arbitrage scanner");

    // Load configuration
    let config = Config::load().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!("Configuration loaded successfully");

    let mut bot = ScannerBot::new(config).map_err(|e| {
        error!("Failed to initialize scanner: {}", e);
        e
    })?;

    // The running cycle completes before the loop observes shutdown.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
            // A dropped sender would read as shutdown.
            std::future::pending::<()>().await;
        }
        info!("Shutdown signal received, finishing current cycle");
        let _ = shutdown_tx.send(true);
    });

    if let Err(e) = bot.start(shutdown_rx).await {
        error!("Scanner error: {}", e);
    }

    info!("Internal arbitrage scanner shutdown complete");
    Ok(())
}
