use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use price_audit_common::{ApiError, PricePayload, RetryConfig, TransportError};
use reqwest::Client;
use serde_json::Value;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// User agent sent with every quote request
const USER_AGENT: &str = concat!("price-audit/", env!("CARGO_PKG_VERSION"));

/// Query for one batched quote request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteRequest {
    pub coins_csv: String,
    pub currency: String,
}

impl QuoteRequest {
    pub fn new(coins_csv: impl Into<String>, currency: impl Into<String>) -> Self {
        Self {
            coins_csv: coins_csv.into(),
            currency: currency.into(),
        }
    }

    /// Query string pairs understood by `/simple/price`.
    pub fn query_params(&self) -> [(&'static str, &str); 3] {
        [
            ("ids", self.coins_csv.as_str()),
            ("vs_currencies", self.currency.as_str()),
            ("include_24hr_change", "true"),
        ]
    }
}

/// One attempt against the quote service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuoteTransport: Send + Sync {
    /// Performs a single request and decodes the body as JSON.
    async fn get_quotes(&self, request: &QuoteRequest) -> Result<Value, TransportError>;
}

/// HTTP transport for the CoinGecko simple price endpoint.
pub struct CoinGeckoTransport {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl CoinGeckoTransport {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn classify(&self, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout(self.timeout)
        } else {
            TransportError::Connection(err.to_string())
        }
    }
}

#[async_trait]
impl QuoteTransport for CoinGeckoTransport {
    async fn get_quotes(&self, request: &QuoteRequest) -> Result<Value, TransportError> {
        info!("🌐 Calling quote service: {}", self.endpoint);

        let response = self
            .client
            .get(&self.endpoint)
            .header("accept", "application/json")
            .query(&request.query_params())
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let body = response.text().await.map_err(|e| self.classify(e))?;
        serde_json::from_str(&body).map_err(|e| TransportError::MalformedBody(e.to_string()))
    }
}

/// Fetches quote payloads with a fixed-delay retry budget.
pub struct PriceFetcher<T> {
    transport: T,
}

impl<T: QuoteTransport> PriceFetcher<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Requests quotes for `coins_csv` in `currency`.
    ///
    /// Retryable failures are attempted again after `retry.delay()` until
    /// `retry.max_attempts` attempts have been made. A malformed body ends
    /// the call straight away. The payload is returned undecoded beyond
    /// JSON; checking its shape is the validator's job.
    pub async fn fetch(
        &self,
        coins_csv: &str,
        currency: &str,
        retry: &RetryConfig,
    ) -> Result<PricePayload, ApiError> {
        let request = QuoteRequest::new(coins_csv, currency);
        let max_attempts = retry.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            info!(
                "Fetching quotes for [{}] in {} (attempt {}/{})",
                coins_csv, currency, attempt, max_attempts
            );

            match self.transport.get_quotes(&request).await {
                Ok(body) => {
                    info!("✅ Quotes fetched on attempt {}", attempt);
                    return Ok(PricePayload::new(body));
                }
                Err(cause) if !cause.is_retryable() => {
                    error!("❌ Unusable response on attempt {}: {}", attempt, cause);
                    return Err(ApiError {
                        attempts: attempt,
                        cause,
                    });
                }
                Err(cause) if attempt < max_attempts => {
                    warn!(
                        "❌ Attempt {} failed: {}. Retrying in {:?}...",
                        attempt,
                        cause,
                        retry.delay()
                    );
                    sleep(retry.delay()).await;
                }
                Err(cause) => {
                    error!("❌ All {} attempts failed: {}", max_attempts, cause);
                    return Err(ApiError {
                        attempts: attempt,
                        cause,
                    });
                }
            }
        }

        unreachable!("max_attempts is at least 1")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;
    use serde_json::json;
    use tokio::time::Instant;

    fn retry(max_attempts: u32, delay_seconds: f64) -> RetryConfig {
        RetryConfig::new(max_attempts, delay_seconds, 10.0).unwrap()
    }

    fn unavailable() -> TransportError {
        TransportError::Status {
            status: 503,
            body: "unavailable".to_string(),
        }
    }

    #[test]
    fn test_query_params_request_24h_change() {
        let request = QuoteRequest::new("bitcoin,ethereum", "usd");
        assert_eq!(
            request.query_params(),
            [
                ("ids", "bitcoin,ethereum"),
                ("vs_currencies", "usd"),
                ("include_24hr_change", "true"),
            ]
        );
    }

    #[test]
    fn test_transport_creation() {
        let transport =
            CoinGeckoTransport::new("http://localhost:1/simple/price", Duration::from_secs(1))
                .unwrap();
        assert_eq!(transport.endpoint(), "http://localhost:1/simple/price");
    }

    #[tokio::test]
    async fn test_fetch_returns_payload_on_first_success() {
        // Given
        let mut transport = MockQuoteTransport::new();
        transport
            .expect_get_quotes()
            .with(eq(QuoteRequest::new("bitcoin", "usd")))
            .times(1)
            .returning(|_| Ok(json!({"bitcoin": {"usd": 30000}})));
        let fetcher = PriceFetcher::new(transport);

        // When
        let payload = fetcher.fetch("bitcoin", "usd", &retry(3, 0.0)).await.unwrap();

        // Then
        assert_eq!(payload.as_value()["bitcoin"]["usd"], 30000);
    }

    #[tokio::test]
    async fn test_fetch_makes_exactly_max_attempts() {
        for max_attempts in [1, 2, 5] {
            let mut transport = MockQuoteTransport::new();
            transport
                .expect_get_quotes()
                .times(max_attempts as usize)
                .returning(|_| Err(unavailable()));
            let fetcher = PriceFetcher::new(transport);

            let err = fetcher
                .fetch("bitcoin", "usd", &retry(max_attempts, 0.0))
                .await
                .unwrap_err();

            assert_eq!(err.attempts, max_attempts);
            assert!(matches!(err.cause, TransportError::Status { status: 503, .. }));
        }
    }

    #[tokio::test]
    async fn test_fetch_recovers_after_transient_failures() {
        let mut transport = MockQuoteTransport::new();
        let mut seq = mockall::Sequence::new();
        transport
            .expect_get_quotes()
            .times(2)
            .in_sequence(&mut seq)
            .returning(|_| Err(TransportError::Timeout(Duration::from_secs(10))));
        transport
            .expect_get_quotes()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(json!({"bitcoin": {"usd": 1.0}})));
        let fetcher = PriceFetcher::new(transport);

        let payload = fetcher.fetch("bitcoin", "usd", &retry(3, 0.0)).await;

        assert!(payload.is_ok());
    }

    #[tokio::test]
    async fn test_malformed_body_is_not_retried() {
        let mut transport = MockQuoteTransport::new();
        transport
            .expect_get_quotes()
            .times(1)
            .returning(|_| Err(TransportError::MalformedBody("expected value".into())));
        let fetcher = PriceFetcher::new(transport);

        let err = fetcher.fetch("bitcoin", "usd", &retry(3, 0.0)).await.unwrap_err();

        assert_eq!(err.attempts, 1);
        assert!(matches!(err.cause, TransportError::MalformedBody(_)));
    }

    #[tokio::test]
    async fn test_malformed_body_after_retry_keeps_attempt_count() {
        let mut transport = MockQuoteTransport::new();
        let mut seq = mockall::Sequence::new();
        transport
            .expect_get_quotes()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(TransportError::Connection("reset".into())));
        transport
            .expect_get_quotes()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(TransportError::MalformedBody("eof".into())));
        let fetcher = PriceFetcher::new(transport);

        let err = fetcher.fetch("bitcoin", "usd", &retry(5, 0.0)).await.unwrap_err();

        assert_eq!(err.attempts, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_between_attempts_only() {
        let mut transport = MockQuoteTransport::new();
        transport
            .expect_get_quotes()
            .times(3)
            .returning(|_| Err(unavailable()));
        let fetcher = PriceFetcher::new(transport);

        let started = Instant::now();
        let result = fetcher.fetch("bitcoin", "usd", &retry(3, 2.0)).await;

        assert!(result.is_err());
        // two sleeps, none after the final attempt
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(4));
        assert!(elapsed < Duration::from_secs(6));
    }
}
