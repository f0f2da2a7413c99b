use anyhow::{Context, Result};
use price_audit_common::{Settings, ValidationReport};
use tracing::{error, info};

use crate::fetcher::{PriceFetcher, QuoteTransport};
use crate::store::ReportStore;
use crate::validator::validate;

/// Exit code for a passing run.
pub const EXIT_PASS: u8 = 0;
/// Exit code for a failing report or an unrecoverable fault.
pub const EXIT_FAIL: u8 = 1;
/// Exit code when the user interrupts the run.
pub const EXIT_INTERRUPTED: u8 = 130;

pub fn exit_code(report: &ValidationReport) -> u8 {
    if report.is_pass() {
        EXIT_PASS
    } else {
        EXIT_FAIL
    }
}

/// One fetch, one validation, one persisted report.
pub struct PriceAudit<T> {
    settings: Settings,
    fetcher: PriceFetcher<T>,
    store: ReportStore,
}

impl<T: QuoteTransport> PriceAudit<T> {
    pub fn new(settings: Settings, transport: T) -> Self {
        let store = ReportStore::new(settings.reports_dir.clone());
        Self {
            settings,
            fetcher: PriceFetcher::new(transport),
            store,
        }
    }

    /// Runs the workflow and returns the persisted report.
    ///
    /// A failed fetch still produces a (failing) report. Only a report that
    /// cannot be written is returned as an error.
    pub async fn execute(&self) -> Result<ValidationReport> {
        let settings = &self.settings;
        info!("Starting price validation workflow");

        let payload = match self
            .fetcher
            .fetch(&settings.coins_csv(), &settings.currency, &settings.retry)
            .await
        {
            Ok(payload) => Some(payload),
            Err(err) => {
                error!("❌ {}", err);
                None
            }
        };

        let report = validate(payload.as_ref(), &settings.coins, &settings.currency);

        self.store
            .save(&report)
            .context("Failed to persist validation report")?;

        info!("Price validation workflow completed: {}", report.status);
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::MockQuoteTransport;
    use price_audit_common::{RetryConfig, TransportError};
    use serde_json::json;
    use std::fs;

    fn settings() -> Settings {
        Settings {
            retry: RetryConfig::new(2, 0.0, 1.0).unwrap(),
            reports_dir: std::env::temp_dir()
                .join(format!("price-audit-{}", uuid::Uuid::new_v4())),
            ..Settings::default()
        }
    }

    #[tokio::test]
    async fn test_passing_run_persists_report() {
        // Given
        let mut transport = MockQuoteTransport::new();
        transport.expect_get_quotes().times(1).returning(|_| {
            Ok(json!({
                "bitcoin": {"usd": 20000, "usd_24h_change": 1.5},
                "ethereum": {"usd": 1500, "usd_24h_change": -0.5}
            }))
        });
        let settings = settings();
        let reports_dir = settings.reports_dir.clone();
        let audit = PriceAudit::new(settings, transport);

        // When
        let report = audit.execute().await.unwrap();

        // Then
        assert_eq!(exit_code(&report), EXIT_PASS);
        assert_eq!(fs::read_dir(&reports_dir).unwrap().count(), 1);
        fs::remove_dir_all(&reports_dir).unwrap();
    }

    #[tokio::test]
    async fn test_exhausted_fetch_still_reports_failure() {
        let mut transport = MockQuoteTransport::new();
        transport
            .expect_get_quotes()
            .times(2)
            .returning(|_| Err(TransportError::Connection("refused".into())));
        let settings = settings();
        let reports_dir = settings.reports_dir.clone();
        let audit = PriceAudit::new(settings, transport);

        let report = audit.execute().await.unwrap();

        assert_eq!(exit_code(&report), EXIT_FAIL);
        assert_eq!(report.details, vec!["No data received from API."]);
        assert_eq!(report.coins_requested, vec!["bitcoin", "ethereum"]);
        fs::remove_dir_all(&reports_dir).unwrap();
    }

    #[tokio::test]
    async fn test_unwritable_reports_dir_is_fatal() {
        let blocker = std::env::temp_dir().join(format!("price-audit-{}", uuid::Uuid::new_v4()));
        fs::write(&blocker, b"file").unwrap();

        let mut transport = MockQuoteTransport::new();
        transport
            .expect_get_quotes()
            .returning(|_| Ok(json!({"bitcoin": {"usd": 1}, "ethereum": {"usd": 1}})));
        let settings = Settings {
            reports_dir: blocker.join("reports"),
            ..settings()
        };
        let audit = PriceAudit::new(settings, transport);

        assert!(audit.execute().await.is_err());
        fs::remove_file(&blocker).unwrap();
    }
}
