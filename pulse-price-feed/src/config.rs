use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceFeedConfig {
    /// Interval between feed generator ticks for one connection.
    pub tick_interval: Duration,
    /// Symmetric bound on the per-tick price perturbation factor.
    pub price_jitter: f64,
    /// Symmetric bound, in percentage points, on the per-tick 24h-change walk.
    pub change_jitter: f64,
}

impl Default for PriceFeedConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(2000),
            price_jitter: 0.025,
            change_jitter: 2.5,
        }
    }
}

impl PriceFeedConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    pub fn with_price_jitter(mut self, jitter: f64) -> Self {
        self.price_jitter = jitter;
        self
    }

    pub fn with_change_jitter(mut self, jitter: f64) -> Self {
        self.change_jitter = jitter;
        self
    }
}
