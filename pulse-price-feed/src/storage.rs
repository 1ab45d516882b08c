use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use tokio::sync::RwLock;
use uuid::Uuid;

use pulse_common::{
    error::AppError,
    models::{InsertToken, RiskLevel, Token, TokenCategory},
};

/// Authoritative token store. The feed generator is the only writer of the
/// market fields; concurrent generators are serialized per call by the
/// implementation's lock (last write wins per token).
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Tokens in a category, newest first.
    async fn get_all_tokens(&self, category: TokenCategory) -> Result<Vec<Token>, AppError>;
    async fn get_token_by_id(&self, id: &str) -> Result<Option<Token>, AppError>;
    async fn create_token(&self, token: InsertToken) -> Result<Token, AppError>;
    /// Single read-modify-write of the two market fields. Returns the updated
    /// token, or None when the id is unknown.
    async fn update_token_price(
        &self,
        id: &str,
        price: f64,
        price_change_24h: f64,
    ) -> Result<Option<Token>, AppError>;
}

pub struct MemTokenStore {
    tokens: RwLock<HashMap<String, Token>>,
}

impl MemTokenStore {
    pub fn new() -> Self {
        Self {
            tokens: RwLock::new(HashMap::new()),
        }
    }

    /// Store pre-seeded with demo tokens across all categories.
    pub fn with_mock_data() -> Self {
        let mut tokens = HashMap::new();
        for token in generate_mock_tokens() {
            tokens.insert(token.id.clone(), token);
        }
        Self {
            tokens: RwLock::new(tokens),
        }
    }
}

impl Default for MemTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenStore for MemTokenStore {
    async fn get_all_tokens(&self, category: TokenCategory) -> Result<Vec<Token>, AppError> {
        let tokens = self.tokens.read().await;
        let mut result: Vec<Token> = tokens
            .values()
            .filter(|token| token.category == category)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(result)
    }

    async fn get_token_by_id(&self, id: &str) -> Result<Option<Token>, AppError> {
        let tokens = self.tokens.read().await;
        Ok(tokens.get(id).cloned())
    }

    async fn create_token(&self, insert: InsertToken) -> Result<Token, AppError> {
        let token = Token {
            id: Uuid::new_v4().to_string(),
            symbol: insert.symbol,
            name: insert.name,
            contract_address: insert.contract_address,
            logo: insert.logo,
            age: insert.age,
            market_cap: insert.market_cap,
            liquidity: insert.liquidity,
            volume_24h: insert.volume_24h,
            price: insert.price,
            price_change_24h: insert.price_change_24h,
            holder_count: insert.holder_count,
            top_holder_percentage: insert.top_holder_percentage,
            snipers_percentage: insert.snipers_percentage,
            tx_count: insert.tx_count,
            bonding_curve_progress: insert.bonding_curve_progress,
            risk_level: insert.risk_level,
            is_verified: insert.is_verified,
            category: insert.category,
            timestamp: insert
                .timestamp
                .unwrap_or_else(|| Utc::now().timestamp_millis()),
        };

        let mut tokens = self.tokens.write().await;
        tokens.insert(token.id.clone(), token.clone());
        Ok(token)
    }

    async fn update_token_price(
        &self,
        id: &str,
        price: f64,
        price_change_24h: f64,
    ) -> Result<Option<Token>, AppError> {
        let mut tokens = self.tokens.write().await;
        match tokens.get_mut(id) {
            Some(token) => {
                token.price = price;
                token.price_change_24h = price_change_24h;
                Ok(Some(token.clone()))
            }
            None => Ok(None),
        }
    }
}

const TOKENS_PER_CATEGORY: usize = 20;

const TOKEN_NAMES: [(&str, &str); 20] = [
    ("PEPE", "Pepe Coin"),
    ("DOGE", "Doge Inu"),
    ("SHIB", "Shiba Token"),
    ("FLOKI", "Floki Inu"),
    ("MOON", "Moon Shot"),
    ("ROCKET", "Rocket Finance"),
    ("SAFE", "Safe Moon"),
    ("APE", "Ape Token"),
    ("WOJAK", "Wojak Coin"),
    ("GIGA", "Giga Chad"),
    ("CHAD", "Chad Token"),
    ("BASED", "Based Finance"),
    ("LAMBO", "Lambo Dreams"),
    ("FROG", "Frog Token"),
    ("CAT", "Cat Coin"),
    ("DOG", "Dog Finance"),
    ("BEAR", "Bear Market"),
    ("BULL", "Bull Run"),
    ("PUMP", "Pump Token"),
    ("DUMP", "Dump Coin"),
];

fn generate_mock_tokens() -> Vec<Token> {
    let mut rng = rand::thread_rng();
    let now = Utc::now().timestamp_millis();
    let mut tokens = Vec::with_capacity(TokenCategory::ALL.len() * TOKENS_PER_CATEGORY);

    for (cat_index, category) in TokenCategory::ALL.iter().enumerate() {
        for i in 0..TOKENS_PER_CATEGORY {
            let (symbol, name) = TOKEN_NAMES[i % TOKEN_NAMES.len()];
            let base_price = rng.gen::<f64>() * 0.1;
            let price_change = (rng.gen::<f64>() - 0.5) * 100.0;
            let market_cap = rng.gen::<f64>() * 5_000_000.0;
            let age = match category {
                TokenCategory::NewPairs => rng.gen::<f64>() * 3_600.0,
                TokenCategory::FinalStretch => rng.gen::<f64>() * 86_400.0 + 3_600.0,
                TokenCategory::Migrated => rng.gen::<f64>() * 604_800.0 + 86_400.0,
            };

            let risk_roll = rng.gen::<f64>();
            let risk_level = if risk_roll > 0.7 {
                RiskLevel::High
            } else if risk_roll > 0.4 {
                RiskLevel::Medium
            } else {
                RiskLevel::Low
            };

            tokens.push(Token {
                id: Uuid::new_v4().to_string(),
                symbol: format!("{}{}{}", symbol, cat_index, i),
                name: format!("{} {}{}", name, cat_index, i),
                contract_address: Uuid::new_v4().simple().to_string(),
                logo: Some(format!(
                    "https://api.dicebear.com/7.x/identicon/svg?seed={}{}",
                    symbol, i
                )),
                age,
                market_cap,
                liquidity: market_cap * (0.1 + rng.gen::<f64>() * 0.3),
                volume_24h: market_cap * (0.05 + rng.gen::<f64>() * 0.2),
                price: base_price,
                price_change_24h: price_change,
                holder_count: 50 + rng.gen_range(0..1000),
                top_holder_percentage: 5.0 + rng.gen::<f64>() * 40.0,
                snipers_percentage: rng.gen::<f64>() * 30.0,
                tx_count: 100 + rng.gen_range(0..5000),
                bonding_curve_progress: match category {
                    TokenCategory::FinalStretch => Some(75.0 + rng.gen::<f64>() * 24.0),
                    _ => None,
                },
                risk_level,
                is_verified: rng.gen::<f64>() > 0.5,
                category: *category,
                timestamp: now - (age * 1000.0) as i64,
            });
        }
    }

    tokens
}
