use std::fmt;

use chrono::DateTime;
use chrono_tz::Tz;
use price_audit_common::{
    change_field, now_in_report_timezone, CoinId, CoinSummary, PricePayload, ValidationReport,
    ValidationStatus,
};
use serde_json::Value;
use tracing::{info, warn};

use crate::report::ReportAssembler;
use crate::schema::{check_structure, generate_schema, SchemaOutcome};

/// Why a single coin failed semantic validation.
#[derive(Debug, Clone, PartialEq)]
enum CoinProblem {
    Missing,
    InvalidPrice(Option<Value>),
    InvalidChange(Value),
}

struct CoinFailure<'a> {
    coin: &'a str,
    problem: CoinProblem,
}

impl fmt::Display for CoinFailure<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.problem {
            CoinProblem::Missing => write!(f, "Missing data for {}", self.coin),
            CoinProblem::InvalidPrice(Some(value)) => {
                write!(f, "Invalid or missing price for {}: {}", self.coin, value)
            }
            CoinProblem::InvalidPrice(None) => {
                write!(f, "Invalid or missing price for {}: missing", self.coin)
            }
            CoinProblem::InvalidChange(value) => {
                write!(f, "Invalid 24h change for {}: {}", self.coin, value)
            }
        }
    }
}

/// Validates a payload against the requested coins, stamped with the
/// current time.
///
/// Never fails: every problem, including a missing payload, ends up as a
/// detail line in the returned report.
pub fn validate(
    payload: Option<&PricePayload>,
    coins: &[CoinId],
    currency: &str,
) -> ValidationReport {
    validate_at(payload, coins, currency, &now_in_report_timezone())
}

/// Same as [`validate`] with an explicit validation start time.
pub fn validate_at(
    payload: Option<&PricePayload>,
    coins: &[CoinId],
    currency: &str,
    started_at: &DateTime<Tz>,
) -> ValidationReport {
    let mut report = ReportAssembler::begin(coins, currency, started_at);

    let Some(payload) = payload else {
        warn!("No data received from API, skipping validation");
        report.fail("No data received from API.");
        return report.finish();
    };

    let schema = generate_schema(coins, currency);
    match check_structure(&schema, payload.as_value()) {
        SchemaOutcome::Valid => report.pass("Schema validation passed."),
        SchemaOutcome::Invalid(message) => {
            warn!("Schema validation failed: {}", message);
            report.fail(format!("Schema validation error: {message}"));
        }
    }

    for coin in coins {
        match check_coin(payload, coin, currency) {
            Ok(summary) => {
                let line = describe_quote(coin, &summary);
                info!("✅ {}", line);
                report.pass(line);
                report.record(coin, summary);
            }
            Err(problem) => {
                let failure = CoinFailure { coin, problem };
                warn!("❌ {}", failure);
                report.fail(failure.to_string());
            }
        }
    }

    let total = coins.len();
    let valid = report.validated();
    if valid == total && report.status() == ValidationStatus::Pass {
        report.pass(format!("All {total} coins validated successfully."));
    } else {
        report.fail(format!("{valid}/{total} coins validated."));
    }

    let report = report.finish();
    info!("Validation finished: {} ({}/{})", report.status, valid, total);
    report
}

/// Semantic checks for one coin: positive price, numeric change if present.
fn check_coin(
    payload: &PricePayload,
    coin: &str,
    currency: &str,
) -> Result<CoinSummary, CoinProblem> {
    let entry = payload.coin(coin).ok_or(CoinProblem::Missing)?;

    let price = match entry.get(currency) {
        Some(value) => match value.as_f64() {
            Some(price) if price.is_finite() && price > 0.0 => price,
            _ => return Err(CoinProblem::InvalidPrice(Some(value.clone()))),
        },
        None => return Err(CoinProblem::InvalidPrice(None)),
    };

    let change_24h = match entry.get(change_field(currency)) {
        Some(value) => Some(
            value
                .as_f64()
                .ok_or_else(|| CoinProblem::InvalidChange(value.clone()))?,
        ),
        None => None,
    };

    Ok(CoinSummary {
        price,
        currency: currency.to_string(),
        change_24h,
    })
}

fn describe_quote(coin: &str, summary: &CoinSummary) -> String {
    let currency = summary.currency.to_uppercase();
    match summary.change_24h {
        Some(change) => format!(
            "{coin}: {:.2} {currency} (24h change: {change:+.2}%)",
            summary.price
        ),
        None => format!("{coin}: {:.2} {currency}", summary.price),
    }
}
