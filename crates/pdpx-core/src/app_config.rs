use std::path::PathBuf;

use crate::pricing::PricingConfig;

/// Process-wide settings read from the environment.
///
/// Every timeout is an upper bound on a single browser interaction; nothing
/// the engine waits on is unbounded.
#[derive(Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub sites_path: PathBuf,
    pub webdriver_url: String,
    pub output_dir: PathBuf,
    pub nav_timeout_secs: u64,
    /// Additional navigation attempts after the first failure.
    pub nav_max_retries: u32,
    /// Base delay for navigation backoff: `base * 2^attempt` milliseconds.
    pub nav_backoff_base_ms: u64,
    /// How long to wait for the title element before declaring the page unusable.
    pub identity_timeout_ms: u64,
    pub click_timeout_ms: u64,
    pub image_change_timeout_ms: u64,
    pub secondary_cooldown_ms: u64,
    pub residual_pause_ms: u64,
    pub network_idle_timeout_ms: u64,
    /// Upper bound on any single page read (query, text, attribute).
    pub op_timeout_ms: u64,
    /// Interval between checks while waiting for a page condition.
    pub poll_interval_ms: u64,
    pub pricing: PricingConfig,
    /// Overrides the brand read from the page when set.
    pub vendor: Option<String>,
    pub product_type: Option<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("log_level", &self.log_level)
            .field("sites_path", &self.sites_path)
            .field("webdriver_url", &redact_userinfo(&self.webdriver_url))
            .field("output_dir", &self.output_dir)
            .field("nav_timeout_secs", &self.nav_timeout_secs)
            .field("nav_max_retries", &self.nav_max_retries)
            .field("nav_backoff_base_ms", &self.nav_backoff_base_ms)
            .field("identity_timeout_ms", &self.identity_timeout_ms)
            .field("click_timeout_ms", &self.click_timeout_ms)
            .field("image_change_timeout_ms", &self.image_change_timeout_ms)
            .field("secondary_cooldown_ms", &self.secondary_cooldown_ms)
            .field("residual_pause_ms", &self.residual_pause_ms)
            .field("network_idle_timeout_ms", &self.network_idle_timeout_ms)
            .field("op_timeout_ms", &self.op_timeout_ms)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("pricing", &self.pricing)
            .field("vendor", &self.vendor)
            .field("product_type", &self.product_type)
            .finish()
    }
}

/// Hides `user:pass@` in a remote WebDriver URL (hosted grids embed credentials there).
fn redact_userinfo(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    let authority_end = rest.find('/').unwrap_or(rest.len());
    match rest[..authority_end].rfind('@') {
        Some(at) => format!("{scheme}://[redacted]@{}", &rest[at + 1..]),
        None => url.to_string(),
    }
}
