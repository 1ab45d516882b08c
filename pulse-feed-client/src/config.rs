use std::time::Duration;

#[derive(Debug, Clone)]
pub struct FeedClientConfig {
    /// WebSocket endpoint of the price feed, e.g. `ws://127.0.0.1:5000/ws`.
    pub endpoint: String,
    /// Fixed delay before a single reconnect attempt after a closure.
    pub reconnect_delay: Duration,
    /// How long a flash marker stays visible before the core expires it.
    pub flash_duration: Duration,
    /// Cadence of the expiry sweep over the flash-state map.
    pub flash_sweep_interval: Duration,
}

impl Default for FeedClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "ws://127.0.0.1:5000/ws".to_string(),
            reconnect_delay: Duration::from_millis(3000),
            flash_duration: Duration::from_millis(500),
            flash_sweep_interval: Duration::from_millis(100),
        }
    }
}

impl FeedClientConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    pub fn with_flash_duration(mut self, duration: Duration) -> Self {
        self.flash_duration = duration;
        self
    }

    pub fn with_flash_sweep_interval(mut self, interval: Duration) -> Self {
        self.flash_sweep_interval = interval;
        self
    }
}

/// Derives the feed endpoint from an HTTP base URL, matching the transport
/// security of the origin (`http` -> `ws`, `https` -> `wss`).
pub fn endpoint_from_http(base_url: &str) -> String {
    let ws_base = if let Some(rest) = base_url.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = base_url.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        base_url.to_string()
    };

    format!("{}/ws", ws_base.trim_end_matches('/'))
}
