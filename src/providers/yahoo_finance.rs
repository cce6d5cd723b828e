use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::core::cache::Cache;
use crate::core::currency::CurrencyRateProvider;
use crate::core::error::{MetricsError, Result};
use crate::providers::util::with_retry;

const RETRIES: usize = 2;
const RETRY_DELAY_MS: u64 = 200;

/// Live exchange rates from the Yahoo Finance chart endpoint.
pub struct YahooCurrencyProvider {
    base_url: String,
    cache: Arc<Cache<String, Decimal>>,
}

impl YahooCurrencyProvider {
    pub fn new(base_url: &str, cache: Arc<Cache<String, Decimal>>) -> Self {
        YahooCurrencyProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            cache,
        }
    }
}

#[derive(Debug, Deserialize)]
struct YahooCurrencyResponse {
    chart: CurrencyChartResult,
}

#[derive(Debug, Deserialize)]
struct CurrencyChartResult {
    result: Vec<CurrencyChartItem>,
}

#[derive(Debug, Deserialize)]
struct CurrencyChartItem {
    meta: CurrencyChartMeta,
}

#[derive(Debug, Deserialize)]
struct CurrencyChartMeta {
    #[serde(alias = "regularMarketPrice", with = "rust_decimal::serde::float")]
    regular_market_price: Decimal,
}

#[async_trait]
impl CurrencyRateProvider for YahooCurrencyProvider {
    #[instrument(name = "YahooRateFetch", skip(self))]
    async fn get_rate(&self, from: &str, to: &str) -> Result<Decimal> {
        let symbol = format!("{from}{to}=X");
        if let Some(cached) = self.cache.get(&symbol).await {
            return Ok(cached);
        }
        let unavailable = |reason: String| MetricsError::RateUnavailable {
            pair: symbol.clone(),
            reason,
        };

        let url = format!("{}/v8/finance/chart/{symbol}", self.base_url);
        debug!("Requesting currency rate from {}", url);

        let client = reqwest::Client::builder()
            .user_agent("bizmetrics/1.0")
            .build()
            .map_err(|e| unavailable(format!("client error: {e}")))?;

        let response = with_retry(|| client.get(&url).send(), RETRIES, RETRY_DELAY_MS)
            .await
            .map_err(|e| unavailable(format!("request error: {e}")))?;

        if !response.status().is_success() {
            return Err(unavailable(format!("HTTP error: {}", response.status())));
        }

        let text = response
            .text()
            .await
            .map_err(|e| unavailable(format!("body error: {e}")))?;

        let data: YahooCurrencyResponse = serde_json::from_str(&text)
            .map_err(|e| unavailable(format!("failed to parse JSON response: {e}")))?;

        let item = data
            .chart
            .result
            .into_iter()
            .next()
            .ok_or_else(|| MetricsError::UnknownCurrency(from.to_string()))?;

        let rate = item.meta.regular_market_price;
        if rate <= Decimal::ZERO {
            return Err(unavailable(format!("non-positive rate {rate}")));
        }
        self.cache.put(symbol, rate).await;
        Ok(rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ENDPOINT: &str = "/v8/finance/chart/USDEUR=X";

    async fn mount(mock_server: &MockServer, response: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path(ENDPOINT))
            .respond_with(response)
            .mount(mock_server)
            .await;
    }

    #[tokio::test]
    async fn test_successful_rate_fetch() {
        let mock_server = MockServer::start().await;
        let provider = YahooCurrencyProvider::new(&mock_server.uri(), Arc::new(Cache::new()));

        let mock_response = r#"{
            "chart": {
                "result": [
                    {
                        "meta": {
                            "regularMarketPrice": 1.2345
                        }
                    }
                ]
            }
        }"#;
        mount(
            &mock_server,
            ResponseTemplate::new(200).set_body_string(mock_response),
        )
        .await;

        let rate = provider
            .get_rate("USD", "EUR")
            .await
            .expect("Failed to get rate");
        assert_eq!(rate.round_dp(4), Decimal::new(12345, 4));
    }

    #[tokio::test]
    async fn test_rate_is_cached() {
        let mock_server = MockServer::start().await;
        let provider = YahooCurrencyProvider::new(&mock_server.uri(), Arc::new(Cache::new()));

        Mock::given(method("GET"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"chart": {"result": [{"meta": {"regularMarketPrice": 0.9}}]}}"#,
            ))
            .expect(1)
            .mount(&mock_server)
            .await;

        let first = provider.get_rate("USD", "EUR").await.unwrap();
        let second = provider.get_rate("USD", "EUR").await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_no_currency_rate_found() {
        let mock_server = MockServer::start().await;
        let provider = YahooCurrencyProvider::new(&mock_server.uri(), Arc::new(Cache::new()));
        mount(
            &mock_server,
            ResponseTemplate::new(200).set_body_string(r#"{"chart": {"result": []}}"#),
        )
        .await;

        let result = provider.get_rate("USD", "EUR").await;
        assert_eq!(result, Err(MetricsError::UnknownCurrency("USD".to_string())));
    }

    #[tokio::test]
    async fn test_yahoo_currency_api_error_response() {
        let mock_server = MockServer::start().await;
        let provider = YahooCurrencyProvider::new(&mock_server.uri(), Arc::new(Cache::new()));
        mount(&mock_server, ResponseTemplate::new(500)).await;

        let result = provider.get_rate("USD", "EUR").await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "exchange rate unavailable for USDEUR=X: HTTP error: 500 Internal Server Error"
        );
    }

    #[tokio::test]
    async fn test_yahoo_currency_api_malformed_response() {
        let mock_server = MockServer::start().await;
        let provider = YahooCurrencyProvider::new(&mock_server.uri(), Arc::new(Cache::new()));
        // "results" instead of "result"
        mount(
            &mock_server,
            ResponseTemplate::new(200).set_body_string(r#"{"chart": {"results": []}}"#),
        )
        .await;

        let result = provider.get_rate("USD", "EUR").await;
        match result {
            Err(MetricsError::RateUnavailable { pair, reason }) => {
                assert_eq!(pair, "USDEUR=X");
                assert!(reason.contains("failed to parse JSON response"));
            }
            other => panic!("expected RateUnavailable, got {other:?}"),
        }
    }
}
