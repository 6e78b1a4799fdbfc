//! Application Configuration

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct MarketConfig {
    /// Public base URL used in mailed links
    pub base_url: String,
    /// Time between live feed snapshots
    pub feed_interval: Duration,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:31113".to_string(),
            feed_interval: Duration::from_secs(120),
        }
    }
}

impl MarketConfig {
    /// Create config for development
    pub fn development() -> Self {
        Self {
            feed_interval: Duration::from_secs(10),
            ..Default::default()
        }
    }

    pub fn item_link(&self, item_id: &kernel::id::ItemId) -> String {
        format!("{}/api/items?id={}", self.base_url.trim_end_matches('/'), item_id)
    }
}
