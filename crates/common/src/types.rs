use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConfigError;

/// Identifier of a priceable asset, e.g. `"bitcoin"`.
pub type CoinId = String;

/// Quote currency code, e.g. `"usd"`.
pub type CurrencyCode = String;

/// Timezone every report timestamp and report filename is stamped in.
pub const REPORT_TIMEZONE: Tz = chrono_tz::US::Pacific;

/// Name of the 24h change field for a currency.
///
/// This is a stable contract with the quote service: `usd` maps to
/// `usd_24h_change`. Both the schema generator and the payload reads go
/// through this function.
pub fn change_field(currency: &str) -> String {
    format!("{currency}_24h_change")
}

/// Splits a comma-separated coin list, trimming whitespace and dropping
/// empty tokens. Order and duplicates are preserved.
pub fn parse_coin_list(csv: &str) -> Vec<CoinId> {
    csv.split(',')
        .map(str::trim)
        .filter(|coin| !coin.is_empty())
        .map(str::to_string)
        .collect()
}

/// Current time in [`REPORT_TIMEZONE`].
pub fn now_in_report_timezone() -> DateTime<Tz> {
    Utc::now().with_timezone(&REPORT_TIMEZONE)
}

/// ISO-8601 rendering used for `ValidationReport::timestamp`.
pub fn format_report_timestamp(at: &DateTime<Tz>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, false)
}

/// Raw body returned by the quote service.
///
/// Decoded JSON only; nothing about its shape is guaranteed until the
/// validator has looked at it.
#[derive(Debug, Clone, PartialEq)]
pub struct PricePayload(Value);

impl PricePayload {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Entry for a coin, if the payload is an object containing it.
    pub fn coin(&self, coin: &str) -> Option<&Value> {
        self.0.as_object().and_then(|entries| entries.get(coin))
    }
}

/// Retry budget for a single fetch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub delay_seconds: f64,
    pub timeout_seconds: f64,
}

impl RetryConfig {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
    pub const DEFAULT_DELAY_SECONDS: f64 = 2.0;
    pub const DEFAULT_TIMEOUT_SECONDS: f64 = 10.0;

    pub fn new(
        max_attempts: u32,
        delay_seconds: f64,
        timeout_seconds: f64,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            max_attempts,
            delay_seconds,
            timeout_seconds,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts < 1 {
            return Err(ConfigError::Invalid(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        if !self.delay_seconds.is_finite() || self.delay_seconds < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "delay_seconds must be a non-negative number, got {}",
                self.delay_seconds
            )));
        }
        if !self.timeout_seconds.is_finite() || self.timeout_seconds <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "timeout_seconds must be a positive number, got {}",
                self.timeout_seconds
            )));
        }
        Ok(())
    }

    pub fn delay(&self) -> Duration {
        Duration::from_secs_f64(self.delay_seconds)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeout_seconds)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
            delay_seconds: Self::DEFAULT_DELAY_SECONDS,
            timeout_seconds: Self::DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ValidationStatus {
    Pass,
    Fail,
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationStatus::Pass => write!(f, "PASS"),
            ValidationStatus::Fail => write!(f, "FAIL"),
        }
    }
}

/// Validated quote for one coin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinSummary {
    pub price: f64,
    pub currency: CurrencyCode,
    #[serde(rename = "24h_change")]
    pub change_24h: Option<f64>,
}

/// Outcome of one fetch-and-validate run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub timestamp: String,
    pub status: ValidationStatus,
    pub details: Vec<String>,
    pub coins_requested: Vec<CoinId>,
    pub currency: CurrencyCode,
    pub summary: BTreeMap<CoinId, CoinSummary>,
}

impl ValidationReport {
    pub fn is_pass(&self) -> bool {
        self.status == ValidationStatus::Pass
    }
}

/// How the final report is printed to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    #[default]
    Json,
    Summary,
}

impl FromStr for OutputMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(OutputMode::Json),
            "summary" | "text" => Ok(OutputMode::Summary),
            other => Err(ConfigError::Invalid(format!(
                "unknown output mode: {other}"
            ))),
        }
    }
}
