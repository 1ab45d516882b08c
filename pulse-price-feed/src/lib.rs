pub mod config;
pub mod feed;
pub mod routes;
pub mod storage;

pub use config::PriceFeedConfig;
pub use storage::{MemTokenStore, TokenStore};
