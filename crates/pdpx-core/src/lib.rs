pub mod app_config;
pub mod config;
pub mod pricing;
pub mod rows;
pub mod selectors;
pub mod targets;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use pricing::{CompareAtPolicy, PricingConfig};
pub use rows::OutputRow;
pub use selectors::{load_sites, OptionRole, OptionRoles, SiteConfig, SiteSelectors, SitesFile};
pub use targets::{load_targets, ScrapeTarget, TargetsFile};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read {path}: {source}")]
    FileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    FileParse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("configuration validation failed: {0}")]
    Validation(String),
}
