use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::{parse_coin_list, CoinId, CurrencyCode, OutputMode, RetryConfig};

pub const DEFAULT_COINS: &str = "bitcoin,ethereum";
pub const DEFAULT_CURRENCY: &str = "usd";
pub const DEFAULT_ENDPOINT: &str = "https://api.coingecko.com/api/v3/simple/price";
pub const DEFAULT_REPORTS_DIR: &str = "logs";
pub const DEFAULT_LOG_DIR: &str = "logs";

/// Resolved run configuration.
///
/// Every field is optional in the config file; missing keys fall back to
/// the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub coins: Vec<CoinId>,
    pub currency: CurrencyCode,
    pub retry: RetryConfig,
    pub endpoint: String,
    pub reports_dir: PathBuf,
    pub log_dir: PathBuf,
    pub output: OutputMode,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            coins: parse_coin_list(DEFAULT_COINS),
            currency: DEFAULT_CURRENCY.to_string(),
            retry: RetryConfig::default(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            reports_dir: PathBuf::from(DEFAULT_REPORTS_DIR),
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            output: OutputMode::default(),
        }
    }
}

impl Settings {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Coin list as sent to the quote service.
    pub fn coins_csv(&self) -> String {
        self.coins.join(",")
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.coins.iter().all(|coin| coin.trim().is_empty()) {
            return Err(ConfigError::Invalid("coin list is empty".to_string()));
        }
        if self.currency.trim().is_empty() {
            return Err(ConfigError::Invalid("currency is empty".to_string()));
        }
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid("endpoint is empty".to_string()));
        }
        self.retry.validate()
    }
}
