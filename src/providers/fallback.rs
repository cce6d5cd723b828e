use crate::core::currency::CurrencyRateProvider;
use crate::core::error::{MetricsError, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::debug;

/// Asks `primary` first and falls back to `secondary` only for currencies the
/// primary does not know. Other primary failures are returned as is.
pub struct FallbackRateProvider {
    primary: Arc<dyn CurrencyRateProvider>,
    secondary: Arc<dyn CurrencyRateProvider>,
}

impl FallbackRateProvider {
    pub fn new(
        primary: Arc<dyn CurrencyRateProvider>,
        secondary: Arc<dyn CurrencyRateProvider>,
    ) -> Self {
        Self { primary, secondary }
    }
}

#[async_trait]
impl CurrencyRateProvider for FallbackRateProvider {
    async fn get_rate(&self, from: &str, to: &str) -> Result<Decimal> {
        match self.primary.get_rate(from, to).await {
            Err(MetricsError::UnknownCurrency(code)) => {
                debug!("No primary rate for {code}, trying fallback for {from}->{to}");
                self.secondary.get_rate(from, to).await
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::static_rates::StaticRateProvider;
    use std::collections::BTreeMap;

    struct FixedRate(Result<Decimal>);

    #[async_trait]
    impl CurrencyRateProvider for FixedRate {
        async fn get_rate(&self, _from: &str, _to: &str) -> Result<Decimal> {
            self.0.clone()
        }
    }

    fn static_table() -> Arc<dyn CurrencyRateProvider> {
        let table = BTreeMap::from([("USD".to_string(), Decimal::new(1500, 0))]);
        Arc::new(StaticRateProvider::new("NGN", &table).unwrap())
    }

    #[tokio::test]
    async fn test_primary_wins_when_known() {
        let provider =
            FallbackRateProvider::new(static_table(), Arc::new(FixedRate(Ok(Decimal::ONE))));
        assert_eq!(
            provider.get_rate("USD", "NGN").await.unwrap(),
            Decimal::new(1500, 0)
        );
    }

    #[tokio::test]
    async fn test_unknown_currency_falls_back() {
        let provider = FallbackRateProvider::new(
            static_table(),
            Arc::new(FixedRate(Ok(Decimal::new(2000, 0)))),
        );
        assert_eq!(
            provider.get_rate("GBP", "NGN").await.unwrap(),
            Decimal::new(2000, 0)
        );
    }

    #[tokio::test]
    async fn test_other_errors_do_not_fall_back() {
        let unavailable = MetricsError::RateUnavailable {
            pair: "GBPNGN=X".to_string(),
            reason: "timeout".to_string(),
        };
        let provider = FallbackRateProvider::new(
            Arc::new(FixedRate(Err(unavailable.clone()))),
            Arc::new(FixedRate(Ok(Decimal::ONE))),
        );
        assert_eq!(provider.get_rate("GBP", "NGN").await, Err(unavailable));
    }
}
