//! Report assembly and rendering.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use chrono::DateTime;
use chrono_tz::Tz;
use price_audit_common::{
    format_report_timestamp, CoinId, CoinSummary, CurrencyCode, OutputMode, ValidationReport,
    ValidationStatus,
};

/// Builds a [`ValidationReport`] while validation runs.
///
/// The timestamp and request metadata are fixed when assembly begins.
/// Once a failure has been recorded the report can no longer pass.
#[derive(Debug)]
pub struct ReportAssembler {
    timestamp: String,
    failed: bool,
    details: Vec<String>,
    coins_requested: Vec<CoinId>,
    currency: CurrencyCode,
    summary: BTreeMap<CoinId, CoinSummary>,
    validated: usize,
}

impl ReportAssembler {
    pub fn begin(coins: &[CoinId], currency: &str, at: &DateTime<Tz>) -> Self {
        Self {
            timestamp: format_report_timestamp(at),
            failed: false,
            details: Vec::new(),
            coins_requested: coins.to_vec(),
            currency: currency.to_string(),
            summary: BTreeMap::new(),
            validated: 0,
        }
    }

    /// Appends an informational detail line.
    pub fn pass(&mut self, detail: impl Into<String>) {
        self.details.push(detail.into());
    }

    /// Appends a failure detail line and marks the report failed.
    pub fn fail(&mut self, detail: impl Into<String>) {
        self.failed = true;
        self.details.push(detail.into());
    }

    /// Records a successfully validated coin.
    pub fn record(&mut self, coin: &str, summary: CoinSummary) {
        self.validated += 1;
        self.summary.insert(coin.to_string(), summary);
    }

    /// Number of successful validations so far, duplicates included.
    pub fn validated(&self) -> usize {
        self.validated
    }

    pub fn status(&self) -> ValidationStatus {
        if self.failed || self.validated < self.coins_requested.len() {
            ValidationStatus::Fail
        } else {
            ValidationStatus::Pass
        }
    }

    pub fn finish(self) -> ValidationReport {
        let status = self.status();
        ValidationReport {
            timestamp: self.timestamp,
            status,
            details: self.details,
            coins_requested: self.coins_requested,
            currency: self.currency,
            summary: self.summary,
        }
    }
}

/// Renders a report for stdout in the requested mode.
pub fn render(report: &ValidationReport, mode: OutputMode) -> serde_json::Result<String> {
    match mode {
        OutputMode::Json => serde_json::to_string_pretty(report),
        OutputMode::Summary => Ok(render_summary(report)),
    }
}

/// Human-readable rendering of a report.
pub fn render_summary(report: &ValidationReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Price validation: {}", report.status);
    let _ = writeln!(out, "Timestamp: {}", report.timestamp);
    let _ = writeln!(
        out,
        "Requested: {} ({})",
        report.coins_requested.join(", "),
        report.currency.to_uppercase()
    );
    let validated = report
        .coins_requested
        .iter()
        .filter(|coin| report.summary.contains_key(coin.as_str()))
        .count();
    let _ = writeln!(
        out,
        "Validated: {}/{}",
        validated,
        report.coins_requested.len()
    );
    for detail in &report.details {
        let _ = writeln!(out, "  - {detail}");
    }
    out
}
