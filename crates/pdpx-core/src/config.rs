use std::path::PathBuf;
use std::str::FromStr;

use rust_decimal::Decimal;

use crate::app_config::AppConfig;
use crate::pricing::{CompareAtPolicy, PricingConfig};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can pass a `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_multiplier = |var: &str, raw: &str| -> Result<Decimal, ConfigError> {
        let value = Decimal::from_str(raw.trim()).map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })?;
        if value <= Decimal::ZERO {
            return Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: format!("multiplier must be positive, got {value}"),
            });
        }
        Ok(value)
    };

    let log_level = or_default("PDPX_LOG_LEVEL", "info");
    let sites_path = PathBuf::from(or_default("PDPX_SITES_PATH", "./config/sites.yaml"));
    let webdriver_url = or_default("PDPX_WEBDRIVER_URL", "http://localhost:4444");
    let output_dir = PathBuf::from(or_default("PDPX_OUTPUT_DIR", "./output"));

    let nav_timeout_secs = parse_u64("PDPX_NAV_TIMEOUT_SECS", "45")?;
    let nav_max_retries = parse_u32("PDPX_NAV_MAX_RETRIES", "3")?;
    let nav_backoff_base_ms = parse_u64("PDPX_NAV_BACKOFF_BASE_MS", "2000")?;
    let identity_timeout_ms = parse_u64("PDPX_IDENTITY_TIMEOUT_MS", "15000")?;
    let click_timeout_ms = parse_u64("PDPX_CLICK_TIMEOUT_MS", "5000")?;
    let image_change_timeout_ms = parse_u64("PDPX_IMAGE_CHANGE_TIMEOUT_MS", "5000")?;
    let secondary_cooldown_ms = parse_u64("PDPX_SECONDARY_COOLDOWN_MS", "1000")?;
    let residual_pause_ms = parse_u64("PDPX_RESIDUAL_PAUSE_MS", "300")?;
    let network_idle_timeout_ms = parse_u64("PDPX_NETWORK_IDLE_TIMEOUT_MS", "10000")?;
    let op_timeout_ms = parse_u64("PDPX_OP_TIMEOUT_MS", "10000")?;
    let poll_interval_ms = parse_u64("PDPX_POLL_INTERVAL_MS", "250")?;

    let multiplier = parse_multiplier(
        "PDPX_PRICE_MULTIPLIER",
        &or_default("PDPX_PRICE_MULTIPLIER", "1.3"),
    )?;
    let compare_at = match or_default("PDPX_COMPARE_AT_POLICY", "none")
        .trim()
        .to_lowercase()
        .as_str()
    {
        "none" => CompareAtPolicy::None,
        "displayed" => CompareAtPolicy::DisplayedPrice,
        "multiplier" => {
            let raw = lookup("PDPX_COMPARE_AT_MULTIPLIER")
                .map_err(|_| ConfigError::MissingEnvVar("PDPX_COMPARE_AT_MULTIPLIER".into()))?;
            CompareAtPolicy::Multiplier(parse_multiplier("PDPX_COMPARE_AT_MULTIPLIER", &raw)?)
        }
        other => {
            return Err(ConfigError::InvalidEnvVar {
                var: "PDPX_COMPARE_AT_POLICY".to_string(),
                reason: format!("expected none, displayed, or multiplier; got '{other}'"),
            })
        }
    };

    Ok(AppConfig {
        log_level,
        sites_path,
        webdriver_url,
        output_dir,
        nav_timeout_secs,
        nav_max_retries,
        nav_backoff_base_ms,
        identity_timeout_ms,
        click_timeout_ms,
        image_change_timeout_ms,
        secondary_cooldown_ms,
        residual_pause_ms,
        network_idle_timeout_ms,
        op_timeout_ms,
        poll_interval_ms,
        pricing: PricingConfig {
            multiplier,
            compare_at,
        },
        vendor: optional("PDPX_VENDOR"),
        product_type: optional("PDPX_PRODUCT_TYPE"),
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
