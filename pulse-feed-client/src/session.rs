use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

use pulse_common::models::{PriceUpdate, Token, TokenCategory};

/// Direction of a token's most recent price change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashDirection {
    Increase,
    Decrease,
}

#[derive(Debug, Clone)]
struct FlashEntry {
    direction: FlashDirection,
    set_at: Instant,
}

/// Per-connection subscriber state: the latest-price cache, the flash-state
/// map, and the cached category lists reconciled in place on every update.
/// Mutated only by the subscriber task; consumers read snapshots through the
/// shared lock.
#[derive(Debug, Default)]
pub struct SessionState {
    latest: HashMap<String, PriceUpdate>,
    flashes: HashMap<String, FlashEntry>,
    lists: HashMap<TokenCategory, Vec<Token>>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one inbound update. Overwrites the latest-price cache entry,
    /// raises a flash marker when a previously known price changed, and
    /// patches the matching row of every cached list (price and 24h change
    /// only, order untouched). Returns the flash direction raised, if any.
    pub fn apply_update(&mut self, update: PriceUpdate, now: Instant) -> Option<FlashDirection> {
        let previous = self.latest.insert(update.token_id.clone(), update.clone());

        let mut raised = None;
        if let Some(previous) = previous {
            if previous.price != update.price {
                let direction = if update.price > previous.price {
                    FlashDirection::Increase
                } else {
                    FlashDirection::Decrease
                };
                self.flashes.insert(
                    update.token_id.clone(),
                    FlashEntry {
                        direction,
                        set_at: now,
                    },
                );
                raised = Some(direction);
            }
        }

        for tokens in self.lists.values_mut() {
            if let Some(token) = tokens.iter_mut().find(|t| t.id == update.token_id) {
                token.price = update.price;
                token.price_change_24h = update.price_change_24h;
            }
        }

        raised
    }

    pub fn latest_price(&self, token_id: &str) -> Option<&PriceUpdate> {
        self.latest.get(token_id)
    }

    pub fn latest_count(&self) -> usize {
        self.latest.len()
    }

    pub fn flash(&self, token_id: &str) -> Option<FlashDirection> {
        self.flashes.get(token_id).map(|entry| entry.direction)
    }

    /// Consumer acknowledgement that a flash was rendered.
    pub fn clear_flash(&mut self, token_id: &str) {
        self.flashes.remove(token_id);
    }

    /// Drops flash markers older than `ttl`. Run by the subscriber's own
    /// sweep so markers expire even if no consumer ever acknowledges them.
    pub fn expire_flashes(&mut self, now: Instant, ttl: Duration) {
        self.flashes
            .retain(|_, entry| now.duration_since(entry.set_at) < ttl);
    }

    /// Installs a fetched list for a category, replacing any previous one.
    pub fn prime_list(&mut self, category: TokenCategory, tokens: Vec<Token>) {
        self.lists.insert(category, tokens);
    }

    pub fn list(&self, category: TokenCategory) -> Option<&[Token]> {
        self.lists.get(&category).map(|tokens| tokens.as_slice())
    }

    /// Starts a fresh session on (re)connect. Cached lists survive; they are
    /// owned by the query layer, not the connection.
    pub fn reset(&mut self) {
        self.latest.clear();
        self.flashes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_common::models::RiskLevel;

    fn update(token_id: &str, price: f64, change: f64, timestamp: i64) -> PriceUpdate {
        PriceUpdate {
            token_id: token_id.to_string(),
            price,
            price_change_24h: change,
            timestamp,
        }
    }

    fn token(id: &str, price: f64) -> Token {
        Token {
            id: id.to_string(),
            symbol: format!("SYM-{}", id),
            name: format!("Token {}", id),
            contract_address: format!("contract-{}", id),
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
            category: TokenCategory::NewPairs,
            timestamp: 1,
        }
    }

    #[test]
    fn test_cache_is_last_write_wins() {
        let mut state = SessionState::new();
        let now = Instant::now();

        state.apply_update(update("t1", 1.0, 0.0, 1), now);
        state.apply_update(update("t2", 2.0, 1.0, 2), now);
        state.apply_update(update("t1", 1.5, 0.5, 3), now);
        state.apply_update(update("t1", 0.8, -0.5, 4), now);

        assert_eq!(state.latest_count(), 2);
        assert_eq!(state.latest_price("t1").unwrap().price, 0.8);
        assert_eq!(state.latest_price("t1").unwrap().timestamp, 4);
        assert_eq!(state.latest_price("t2").unwrap().price, 2.0);
    }

    #[test]
    fn test_first_update_never_flashes() {
        let mut state = SessionState::new();
        let raised = state.apply_update(update("t1", 1.0, 0.0, 1), Instant::now());
        assert_eq!(raised, None);
        assert_eq!(state.flash("t1"), None);
    }

    #[test]
    fn test_flash_direction_tracks_price_change() {
        let mut state = SessionState::new();
        let now = Instant::now();

        state.apply_update(update("t1", 1.0, 0.0, 1), now);
        let up = state.apply_update(update("t1", 1.2, 0.0, 2), now);
        assert_eq!(up, Some(FlashDirection::Increase));
        assert_eq!(state.flash("t1"), Some(FlashDirection::Increase));

        let down = state.apply_update(update("t1", 0.9, 0.0, 3), now);
        assert_eq!(down, Some(FlashDirection::Decrease));
        assert_eq!(state.flash("t1"), Some(FlashDirection::Decrease));
    }

    #[test]
    fn test_equal_price_does_not_create_or_disturb_flash() {
        let mut state = SessionState::new();
        let now = Instant::now();

        // no prior flash, equal price: still none
        state.apply_update(update("t1", 1.0, 0.0, 1), now);
        assert_eq!(state.apply_update(update("t1", 1.0, 2.0, 2), now), None);
        assert_eq!(state.flash("t1"), None);

        // existing flash survives an equal-price update
        state.apply_update(update("t1", 1.05, 3.2, 3), now);
        assert_eq!(state.flash("t1"), Some(FlashDirection::Increase));
        assert_eq!(state.apply_update(update("t1", 1.05, 3.2, 4), now), None);
        assert_eq!(state.flash("t1"), Some(FlashDirection::Increase));
        // cache was still overwritten
        assert_eq!(state.latest_price("t1").unwrap().timestamp, 4);
    }

    #[test]
    fn test_end_to_end_scenario_from_one_dollar() {
        // t1 cached at 1.00, then 1.05 arrives, then the same 1.05 again
        let mut state = SessionState::new();
        let now = Instant::now();

        state.apply_update(update("t1", 1.00, 0.0, 999), now);
        state.apply_update(update("t1", 1.05, 3.2, 1000), now);
        assert_eq!(state.latest_price("t1").unwrap().price, 1.05);
        assert_eq!(state.flash("t1"), Some(FlashDirection::Increase));

        state.apply_update(update("t1", 1.05, 3.2, 1002), now);
        assert_eq!(state.latest_price("t1").unwrap().timestamp, 1002);
        assert_eq!(state.flash("t1"), Some(FlashDirection::Increase));
    }

    #[test]
    fn test_unknown_token_is_cached_without_flash() {
        // weak reference: no local token required
        let mut state = SessionState::new();
        state.prime_list(TokenCategory::NewPairs, vec![token("a", 1.0)]);

        let raised = state.apply_update(update("ghost", 5.0, 1.0, 1), Instant::now());
        assert_eq!(raised, None);
        assert_eq!(state.latest_price("ghost").unwrap().price, 5.0);
        assert_eq!(state.list(TokenCategory::NewPairs).unwrap().len(), 1);
    }

    #[test]
    fn test_list_reconciliation_patches_in_place() {
        let mut state = SessionState::new();
        state.prime_list(
            TokenCategory::NewPairs,
            vec![token("a", 1.0), token("b", 2.0), token("c", 3.0)],
        );
        state.prime_list(TokenCategory::Migrated, vec![token("b", 2.0)]);

        state.apply_update(update("b", 9.0, -1.5, 1), Instant::now());

        let new_pairs = state.list(TokenCategory::NewPairs).unwrap();
        // order preserved, only the matching row's market fields changed
        assert_eq!(new_pairs[0].id, "a");
        assert_eq!(new_pairs[1].id, "b");
        assert_eq!(new_pairs[2].id, "c");
        assert_eq!(new_pairs[0].price, 1.0);
        assert_eq!(new_pairs[1].price, 9.0);
        assert_eq!(new_pairs[1].price_change_24h, -1.5);
        assert_eq!(new_pairs[1].symbol, "SYM-b");
        assert_eq!(new_pairs[2].price, 3.0);

        // every cached list is reconciled
        assert_eq!(state.list(TokenCategory::Migrated).unwrap()[0].price, 9.0);
    }

    #[test]
    fn test_flash_expiry_and_acknowledgement() {
        let mut state = SessionState::new();
        let ttl = Duration::from_millis(500);
        let start = Instant::now();

        state.apply_update(update("t1", 1.0, 0.0, 1), start);
        state.apply_update(update("t1", 1.1, 0.0, 2), start);
        state.apply_update(update("t2", 1.0, 0.0, 3), start);
        state.apply_update(update("t2", 0.9, 0.0, 4), start + Duration::from_millis(300));

        // only t1 is past the ttl at start+600ms
        state.expire_flashes(start + Duration::from_millis(600), ttl);
        assert_eq!(state.flash("t1"), None);
        assert_eq!(state.flash("t2"), Some(FlashDirection::Decrease));

        // a fresh update refreshes the marker's clock
        state.apply_update(update("t2", 1.2, 0.0, 5), start + Duration::from_millis(700));
        state.expire_flashes(start + Duration::from_millis(900), ttl);
        assert_eq!(state.flash("t2"), Some(FlashDirection::Increase));

        // explicit acknowledgement removes it early
        state.clear_flash("t2");
        assert_eq!(state.flash("t2"), None);
    }

    #[test]
    fn test_reset_rebuilds_session_but_keeps_lists() {
        let mut state = SessionState::new();
        let now = Instant::now();
        state.prime_list(TokenCategory::Migrated, vec![token("a", 1.0)]);
        state.apply_update(update("a", 1.0, 0.0, 1), now);
        state.apply_update(update("a", 2.0, 0.0, 2), now);

        state.reset();
        assert_eq!(state.latest_count(), 0);
        assert_eq!(state.flash("a"), None);
        assert!(state.list(TokenCategory::Migrated).is_some());

        // after reset the next update counts as first-seen again
        let raised = state.apply_update(update("a", 3.0, 0.0, 3), now);
        assert_eq!(raised, None);
    }
}
