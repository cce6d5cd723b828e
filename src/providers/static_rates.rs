use crate::core::currency::CurrencyRateProvider;
use crate::core::error::{MetricsError, Result};
use crate::core::records::normalize_currency_code;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Exchange rates from a fixed table quoted against the reporting currency.
///
/// Each entry is the number of reporting-currency units one unit of the keyed
/// currency buys. Conversions out of the reporting currency use the inverse,
/// and two table currencies convert through the reporting currency.
#[derive(Debug, Clone)]
pub struct StaticRateProvider {
    reporting_currency: String,
    rates: HashMap<String, Decimal>,
}

impl StaticRateProvider {
    pub fn new(reporting_currency: &str, table: &BTreeMap<String, Decimal>) -> Result<Self> {
        let mut rates = HashMap::with_capacity(table.len());
        for (code, rate) in table {
            let code = normalize_currency_code(code)?;
            if *rate <= Decimal::ZERO {
                return Err(MetricsError::invalid(format!(
                    "rate for {code} must be positive, got {rate}"
                )));
            }
            rates.insert(code, *rate);
        }
        Ok(Self {
            reporting_currency: normalize_currency_code(reporting_currency)?,
            rates,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Reporting-currency units per unit of `code`.
    fn quote(&self, code: &str) -> Result<Decimal> {
        if code == self.reporting_currency {
            return Ok(Decimal::ONE);
        }
        self.rates
            .get(code)
            .copied()
            .ok_or_else(|| MetricsError::UnknownCurrency(code.to_string()))
    }
}

#[async_trait]
impl CurrencyRateProvider for StaticRateProvider {
    async fn get_rate(&self, from: &str, to: &str) -> Result<Decimal> {
        let from = normalize_currency_code(from)?;
        let to = normalize_currency_code(to)?;
        if from == to {
            return Ok(Decimal::ONE);
        }
        let rate = self.quote(&from)? / self.quote(&to)?;
        debug!("Static rate {from}->{to}: {rate}");
        Ok(rate)
    }
}
