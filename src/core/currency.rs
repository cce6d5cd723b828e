//! Currency conversion abstractions

use crate::core::error::{MetricsError, Result};
use crate::core::records::normalize_currency_code;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::debug;

/// Supplies the multiplier converting one unit of `from` into `to`.
#[async_trait]
pub trait CurrencyRateProvider: Send + Sync {
    async fn get_rate(&self, from: &str, to: &str) -> Result<Decimal>;
}

/// Converts amounts into the platform's single reporting currency.
#[derive(Clone)]
pub struct CurrencyNormalizer {
    provider: Arc<dyn CurrencyRateProvider>,
    reporting_currency: String,
}

impl CurrencyNormalizer {
    pub fn new(provider: Arc<dyn CurrencyRateProvider>, reporting_currency: &str) -> Result<Self> {
        Ok(Self {
            provider,
            reporting_currency: normalize_currency_code(reporting_currency)?,
        })
    }

    pub fn reporting_currency(&self) -> &str {
        &self.reporting_currency
    }

    pub async fn convert(&self, amount: Decimal, source_currency: &str) -> Result<Decimal> {
        let source = normalize_currency_code(source_currency)?;
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(MetricsError::NegativeAmount {
                amount,
                currency: source,
            });
        }

        if source == self.reporting_currency {
            return Ok(amount);
        }

        let rate = self
            .provider
            .get_rate(&source, &self.reporting_currency)
            .await?;
        let converted = amount * rate;
        debug!(
            "Converted {amount} {source} to {converted} {} at rate {rate}",
            self.reporting_currency
        );
        Ok(converted)
    }
}
