use std::time::Duration;

use pdpx_core::{AppConfig, PricingConfig};

/// Timing and pricing knobs for one engine run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeSettings {
    pub nav_timeout: Duration,
    pub nav_max_retries: u32,
    pub nav_backoff_base_ms: u64,
    pub identity_timeout: Duration,
    pub op_timeout: Duration,
    pub click_timeout: Duration,
    pub image_change_timeout: Duration,
    pub secondary_cooldown: Duration,
    /// Pause after a no-op selection, letting late scripts finish.
    pub residual_pause: Duration,
    pub network_idle_timeout: Duration,
    pub poll_interval: Duration,
    pub pricing: PricingConfig,
    pub vendor: Option<String>,
    pub product_type: Option<String>,
}

impl Default for ScrapeSettings {
    fn default() -> Self {
        Self {
            nav_timeout: Duration::from_secs(45),
            nav_max_retries: 3,
            nav_backoff_base_ms: 2000,
            identity_timeout: Duration::from_secs(15),
            op_timeout: Duration::from_secs(10),
            click_timeout: Duration::from_secs(5),
            image_change_timeout: Duration::from_secs(5),
            secondary_cooldown: Duration::from_secs(1),
            residual_pause: Duration::from_millis(300),
            network_idle_timeout: Duration::from_secs(10),
            poll_interval: Duration::from_millis(250),
            pricing: PricingConfig::default(),
            vendor: None,
            product_type: None,
        }
    }
}

impl From<&AppConfig> for ScrapeSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            nav_timeout: Duration::from_secs(config.nav_timeout_secs),
            nav_max_retries: config.nav_max_retries,
            nav_backoff_base_ms: config.nav_backoff_base_ms,
            identity_timeout: Duration::from_millis(config.identity_timeout_ms),
            op_timeout: Duration::from_millis(config.op_timeout_ms),
            click_timeout: Duration::from_millis(config.click_timeout_ms),
            image_change_timeout: Duration::from_millis(config.image_change_timeout_ms),
            secondary_cooldown: Duration::from_millis(config.secondary_cooldown_ms),
            residual_pause: Duration::from_millis(config.residual_pause_ms),
            network_idle_timeout: Duration::from_millis(config.network_idle_timeout_ms),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            pricing: config.pricing,
            vendor: config.vendor.clone(),
            product_type: config.product_type.clone(),
        }
    }
}
