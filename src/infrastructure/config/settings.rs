//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all application settings.
//! Configuration is loaded from a TOML file with environment variable overrides
//! for deployment-specific values: `DCABOT_DATABASE` replaces the database
//! path and `DCABOT_SIGNER_URL` the signing relay.
//!
//! # Example
//!
//! ```no_run
//! use dcabot::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::path::Path;

use serde::Deserialize;

use super::logging::LoggingConfig;
use super::scheduler::SchedulerConfig;
use crate::adapter::outbound::lcd::ChainConfig;
use crate::error::{ConfigError, Result};

/// Route search limits.
#[derive(Debug, Clone, Deserialize)]
pub struct RoutingConfig {
    /// Longest route the path index enumerates. Orders asking for more hops
    /// are clamped to this.
    #[serde(default = "default_max_hops")]
    pub max_hops: usize,
}

const fn default_max_hops() -> usize {
    3
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            max_hops: default_max_hops(),
        }
    }
}

/// USD price lookups.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PricesConfig {
    /// Prices older than this count as missing. Unset accepts any age.
    #[serde(default)]
    pub max_age_secs: Option<u64>,
}

impl PricesConfig {
    #[must_use]
    pub fn max_age(&self) -> Option<chrono::Duration> {
        self.max_age_secs
            .and_then(|secs| i64::try_from(secs).ok())
            .map(chrono::Duration::seconds)
    }
}

/// Main application configuration.
///
/// Load from a TOML file using [`Config::load`] or parse directly with
/// [`Config::parse_toml`].
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,

    /// SQLite database path.
    #[serde(default = "default_database_path")]
    pub database: String,

    /// LCD endpoint, contract address and signing relay.
    pub chain: ChainConfig,

    #[serde(default)]
    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub routing: RoutingConfig,

    #[serde(default)]
    pub prices: PricesConfig,
}

fn default_database_path() -> String {
    "dcabot.db".to_string()
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn parse_toml(content: &str) -> Result<Self> {
        Self::parse_toml_with(content, |_| {})
    }

    /// Parse, apply environment overrides, then `overrides`, and validate.
    #[allow(clippy::result_large_err)]
    pub fn parse_toml_with(content: &str, overrides: impl FnOnce(&mut Self)) -> Result<Self> {
        let mut config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.apply_env_overrides();
        overrides(&mut config);
        config.validate()?;
        Ok(config)
    }

    #[allow(clippy::result_large_err)]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load_with(path, |_| {})
    }

    /// [`Config::load`] with command-line overrides applied before
    /// validation.
    #[allow(clippy::result_large_err)]
    pub fn load_with<P: AsRef<Path>>(path: P, overrides: impl FnOnce(&mut Self)) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml_with(&content, overrides)
    }

    fn apply_env_overrides(&mut self) {
        if let Some(database) = non_empty_env("DCABOT_DATABASE") {
            self.database = database;
        }
        if let Some(signer) = non_empty_env("DCABOT_SIGNER_URL") {
            self.chain.signer_url = Some(signer);
        }
    }

    #[allow(clippy::result_large_err)]
    fn validate(&self) -> Result<()> {
        if self.database.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "database" }.into());
        }
        if !self.logging.is_known_format() {
            return Err(ConfigError::InvalidValue {
                field: "logging.format",
                reason: format!("expected `json` or `pretty`, got `{}`", self.logging.format),
            }
            .into());
        }
        if self.routing.max_hops == 0 {
            return Err(ConfigError::InvalidValue {
                field: "routing.max_hops",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.prices.max_age_secs == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "prices.max_age_secs",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        self.chain.validate()?;
        self.scheduler.validate()?;
        Ok(())
    }

    /// Initialize logging with the configured settings.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
