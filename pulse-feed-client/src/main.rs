use anyhow::{Context, Result};
use dotenv::dotenv;
use tokio::signal;

use pulse_common::models::{Token, TokenCategory};
use pulse_feed_client::{
    config::{endpoint_from_http, FeedClientConfig},
    subscriber::FeedSubscriber,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    let base_url =
        std::env::var("PULSE_API_URL").unwrap_or_else(|_| "http://127.0.0.1:5000".to_string());

    let config = FeedClientConfig::new(endpoint_from_http(&base_url));
    let subscriber = FeedSubscriber::new(config);
    let state = subscriber.state();

    // Prime the cached lists before going live so updates have rows to patch.
    let client = reqwest::Client::new();
    for category in TokenCategory::ALL {
        let tokens: Vec<Token> = client
            .get(format!("{}/api/tokens/{}", base_url, category))
            .send()
            .await
            .context("initial token fetch failed")?
            .json()
            .await
            .context("initial token fetch returned invalid JSON")?;

        tracing::info!("fetched {} tokens for {}", tokens.len(), category);
        state.write().prime_list(category, tokens);
    }

    let handle = subscriber.spawn();

    signal::ctrl_c().await?;
    tracing::info!("received Ctrl+C, shutting down");
    handle.shutdown().await;

    Ok(())
}
