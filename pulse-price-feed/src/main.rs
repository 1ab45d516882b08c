use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use dotenv::dotenv;
use tokio::{net::TcpListener, signal};

use pulse_price_feed::{config::PriceFeedConfig, routes, storage::MemTokenStore};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    let port = std::env::var("PULSE_PORT").context("PULSE_PORT must be set")?;

    let mut config = PriceFeedConfig::new();
    if let Ok(interval_ms) = std::env::var("PULSE_TICK_INTERVAL_MS") {
        let interval_ms: u64 = interval_ms
            .parse()
            .context("PULSE_TICK_INTERVAL_MS must be an integer")?;
        config = config.with_tick_interval(Duration::from_millis(interval_ms));
    }

    let store = Arc::new(MemTokenStore::with_mock_data());

    let app = routes::create_router(store, config);
    let addr = SocketAddr::from(([0, 0, 0, 0], port.parse::<u16>()?));
    tracing::info!("pulse price feed listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app.into_make_service()).await {
            tracing::error!("server error: {}", e);
        }
    });

    // Handle shutdown signals
    let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;

    tokio::select! {
        _ = signal::ctrl_c() => {
            tracing::info!("received Ctrl+C, shutting down");
        }
        _ = sigterm.recv() => {
            tracing::info!("received termination signal, shutting down");
        }
    }

    Ok(())
}
