pub mod error;
pub mod models;

pub use error::AppError;
pub use models::{InsertToken, PriceUpdate, RiskLevel, Token, TokenCategory};
