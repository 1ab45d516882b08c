use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Lifecycle bucket a token currently sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenCategory {
    NewPairs,
    FinalStretch,
    Migrated,
}

impl TokenCategory {
    /// Fixed iteration order used by the feed generator.
    pub const ALL: [TokenCategory; 3] = [
        TokenCategory::NewPairs,
        TokenCategory::FinalStretch,
        TokenCategory::Migrated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TokenCategory::NewPairs => "new_pairs",
            TokenCategory::FinalStretch => "final_stretch",
            TokenCategory::Migrated => "migrated",
        }
    }
}

impl fmt::Display for TokenCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenCategory {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new_pairs" => Ok(TokenCategory::NewPairs),
            "final_stretch" => Ok(TokenCategory::FinalStretch),
            "migrated" => Ok(TokenCategory::Migrated),
            other => Err(AppError::BadRequest(format!(
                "Invalid category '{}'. Must be one of: new_pairs, final_stretch, migrated",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// A tradeable token as served to the dashboard. Market fields (`price`,
/// `price_change_24h`) are the only ones the feed generator mutates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub contract_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    /// Age in seconds since the pair was created.
    pub age: f64,
    pub market_cap: f64,
    pub liquidity: f64,
    pub volume_24h: f64,
    pub price: f64,
    pub price_change_24h: f64,
    pub holder_count: u32,
    pub top_holder_percentage: f64,
    pub snipers_percentage: f64,
    pub tx_count: u32,
    /// Only present for `final_stretch` tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bonding_curve_progress: Option<f64>,
    pub risk_level: RiskLevel,
    pub is_verified: bool,
    pub category: TokenCategory,
    /// Creation time, ms epoch.
    pub timestamp: i64,
}

/// Token payload without a server-assigned id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertToken {
    pub symbol: String,
    pub name: String,
    pub contract_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    pub age: f64,
    pub market_cap: f64,
    pub liquidity: f64,
    pub volume_24h: f64,
    pub price: f64,
    pub price_change_24h: f64,
    pub holder_count: u32,
    pub top_holder_percentage: f64,
    pub snipers_percentage: f64,
    pub tx_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bonding_curve_progress: Option<f64>,
    pub risk_level: RiskLevel,
    pub is_verified: bool,
    pub category: TokenCategory,
    /// Defaults to now when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

/// Wire message pushed over the feed channel for every mutated token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceUpdate {
    pub token_id: String,
    pub price: f64,
    pub price_change_24h: f64,
    /// Emission time, ms epoch. Non-decreasing per connection.
    pub timestamp: i64,
}
