use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use tokio::time;

use pulse_common::{
    error::AppError,
    models::{PriceUpdate, TokenCategory},
};

use crate::{config::PriceFeedConfig, storage::TokenStore};

/// One tick of the simulated market: for every category, perturb one random
/// token's price and 24h change, persist it, and collect the resulting
/// updates in category order. Empty categories are skipped.
pub async fn tick_once<R: Rng>(
    store: &dyn TokenStore,
    config: &PriceFeedConfig,
    rng: &mut R,
) -> Result<Vec<PriceUpdate>, AppError> {
    let mut updates = Vec::with_capacity(TokenCategory::ALL.len());

    for category in TokenCategory::ALL {
        let tokens = store.get_all_tokens(category).await?;
        let Some(token) = tokens.choose(rng) else {
            continue;
        };

        let delta = rng.gen_range(-config.price_jitter..=config.price_jitter);
        let new_price = token.price * (1.0 + delta);
        // unbounded walk, matching the demo data's observed behavior
        let new_change =
            token.price_change_24h + rng.gen_range(-config.change_jitter..=config.change_jitter);

        // Token can disappear between the read and the write; skip this
        // category's emit and let the rest of the tick proceed.
        if store
            .update_token_price(&token.id, new_price, new_change)
            .await?
            .is_none()
        {
            continue;
        }

        updates.push(PriceUpdate {
            token_id: token.id.clone(),
            price: new_price,
            price_change_24h: new_change,
            timestamp: Utc::now().timestamp_millis(),
        });
    }

    Ok(updates)
}

/// Drives one subscriber connection: a periodic timer mutates the store and
/// pushes each update as a text frame. The timer lives exactly as long as the
/// connection; a failed send or a close frame ends the loop and drops it.
pub async fn run(socket: WebSocket, store: Arc<dyn TokenStore>, config: PriceFeedConfig) {
    let (mut sender, mut receiver) = socket.split();
    let mut ticker = time::interval_at(
        time::Instant::now() + config.tick_interval,
        config.tick_interval,
    );
    let mut rng = StdRng::from_entropy();

    tracing::info!("price feed subscriber connected");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let updates = match tick_once(store.as_ref(), &config, &mut rng).await {
                    Ok(updates) => updates,
                    Err(e) => {
                        tracing::error!("price tick failed: {}", e);
                        continue;
                    }
                };

                for update in updates {
                    let payload = match serde_json::to_string(&update) {
                        Ok(payload) => payload,
                        Err(e) => {
                            tracing::error!("failed to serialize price update: {}", e);
                            continue;
                        }
                    };

                    if let Err(e) = sender.send(Message::Text(payload.into())).await {
                        tracing::info!("price feed subscriber dropped: {}", e);
                        return;
                    }
                }
            }
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::info!("price feed subscriber disconnected");
                        return;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::error!("price feed receive error: {}", e);
                        return;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemTokenStore;
    use pulse_common::models::{InsertToken, RiskLevel, Token};

    fn insert(symbol: &str, category: TokenCategory, price: f64) -> InsertToken {
        InsertToken {
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            contract_address: symbol.to_string(),
            logo: None,
            age: 60.0,
            market_cap: 100_000.0,
            liquidity: 20_000.0,
            volume_24h: 5_000.0,
            price,
            price_change_24h: 0.0,
            holder_count: 100,
            top_holder_percentage: 10.0,
            snipers_percentage: 2.0,
            tx_count: 500,
            bonding_curve_progress: None,
            risk_level: RiskLevel::Low,
            is_verified: true,
            category,
            timestamp: Some(1),
        }
    }

    #[tokio::test]
    async fn test_empty_store_is_a_silent_skip() {
        let store = MemTokenStore::new();
        let config = PriceFeedConfig::default();
        let mut rng = StdRng::seed_from_u64(7);

        let updates = tick_once(&store, &config, &mut rng).await.unwrap();
        assert!(updates.is_empty());
    }

    #[tokio::test]
    async fn test_single_member_category_always_selected() {
        let store = MemTokenStore::new();
        let only = store
            .create_token(insert("ONLY", TokenCategory::Migrated, 1.0))
            .await
            .unwrap();
        let config = PriceFeedConfig::default();
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..20 {
            let updates = tick_once(&store, &config, &mut rng).await.unwrap();
            assert_eq!(updates.len(), 1);
            assert_eq!(updates[0].token_id, only.id);
        }
    }

    #[tokio::test]
    async fn test_perturbation_is_bounded_and_persisted() {
        let store = MemTokenStore::new();
        let token = store
            .create_token(insert("T", TokenCategory::NewPairs, 1.0))
            .await
            .unwrap();
        let config = PriceFeedConfig::default();
        let mut rng = StdRng::seed_from_u64(42);

        let mut previous: Token = token;
        for _ in 0..50 {
            let updates = tick_once(&store, &config, &mut rng).await.unwrap();
            assert_eq!(updates.len(), 1);
            let update = &updates[0];

            let ratio = update.price / previous.price;
            assert!(
                (ratio - 1.0).abs() <= config.price_jitter + 1e-12,
                "price moved {} in one tick",
                ratio - 1.0
            );
            assert!(
                (update.price_change_24h - previous.price_change_24h).abs()
                    <= config.change_jitter + 1e-12
            );

            // emitted values match the store
            let stored = store
                .get_token_by_id(&update.token_id)
                .await
                .unwrap()
                .unwrap();
            assert_eq!(stored.price, update.price);
            assert_eq!(stored.price_change_24h, update.price_change_24h);
            previous = stored;
        }
    }

    #[tokio::test]
    async fn test_one_update_per_populated_category_in_fixed_order() {
        let store = MemTokenStore::new();
        let new_pair = store
            .create_token(insert("NP", TokenCategory::NewPairs, 0.5))
            .await
            .unwrap();
        let migrated = store
            .create_token(insert("MG", TokenCategory::Migrated, 2.0))
            .await
            .unwrap();
        // final_stretch intentionally left empty
        let config = PriceFeedConfig::default();
        let mut rng = StdRng::seed_from_u64(3);

        let updates = tick_once(&store, &config, &mut rng).await.unwrap();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].token_id, new_pair.id);
        assert_eq!(updates[1].token_id, migrated.id);
        assert!(updates[0].timestamp <= updates[1].timestamp);
    }
}
