//! Fetcher configuration loaded from TOML.
//!
//! Every field has a default, so an empty file is a valid configuration.
//! Per-call settings (timeouts, TLS, proxy) are not configured here: they
//! belong to a slot and are set by the embedding engine on each transaction.

use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::pool::DEFAULT_SLOTS;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FetchConfig {
    /// Slots pre-allocated before the first transaction arrives.
    pub initial_slots: usize,
    pub user_agent: String,
    /// Redirects followed by the transport. 0 hands 3xx responses back as-is.
    pub max_redirects: u32,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            initial_slots: DEFAULT_SLOTS,
            user_agent: concat!("fetch-core/", env!("CARGO_PKG_VERSION")).to_string(),
            max_redirects: 0,
        }
    }
}

impl FetchConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: FetchConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_slots == 0 {
            return Err(ConfigError::Validation(
                "initial_slots must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
