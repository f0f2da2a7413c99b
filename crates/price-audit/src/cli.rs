use std::path::PathBuf;

use clap::Parser;
use price_audit_common::{parse_coin_list, ConfigError, OutputMode, Settings};

/// Fetch spot prices from the quote service and write a validation report.
#[derive(Parser, Debug)]
#[command(name = "price-audit", author, version, about, long_about = None)]
pub struct Cli {
    /// Comma-separated list of coins to fetch [default: bitcoin,ethereum]
    #[arg(long)]
    pub coins: Option<String>,

    /// Currency for price comparison [default: usd]
    #[arg(long)]
    pub currency: Option<String>,

    /// Maximum number of request attempts [default: 3]
    #[arg(long, alias = "retries")]
    pub max_attempts: Option<u32>,

    /// Seconds to wait between attempts [default: 2]
    #[arg(long)]
    pub delay: Option<f64>,

    /// Per-attempt request timeout in seconds [default: 10]
    #[arg(long)]
    pub timeout: Option<f64>,

    /// Print the report as `json` or as a human `summary` [default: json]
    #[arg(long)]
    pub output: Option<OutputMode>,

    /// TOML config file; flags override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory validation reports are written to [default: logs]
    #[arg(long)]
    pub reports_dir: Option<PathBuf>,

    /// Directory for the log file [default: logs]
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Quote service endpoint
    #[arg(long)]
    pub endpoint: Option<String>,
}

impl Cli {
    /// Resolves defaults, then the config file, then flags.
    pub fn into_settings(self) -> Result<Settings, ConfigError> {
        let mut settings = match &self.config {
            Some(path) => Settings::load(path)?,
            None => Settings::default(),
        };

        if let Some(coins) = self.coins {
            settings.coins = parse_coin_list(&coins);
        }
        if let Some(currency) = self.currency {
            settings.currency = currency.trim().to_string();
        }
        if let Some(max_attempts) = self.max_attempts {
            settings.retry.max_attempts = max_attempts;
        }
        if let Some(delay) = self.delay {
            settings.retry.delay_seconds = delay;
        }
        if let Some(timeout) = self.timeout {
            settings.retry.timeout_seconds = timeout;
        }
        if let Some(output) = self.output {
            settings.output = output;
        }
        if let Some(reports_dir) = self.reports_dir {
            settings.reports_dir = reports_dir;
        }
        if let Some(log_dir) = self.log_dir {
            settings.log_dir = log_dir;
        }
        if let Some(endpoint) = self.endpoint {
            settings.endpoint = endpoint;
        }

        settings.validate()?;
        Ok(settings)
    }
}
