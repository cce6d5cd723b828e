//! Error taxonomy for metrics computation.

use rust_decimal::Decimal;
use thiserror::Error;

/// Result type used across the metrics core.
pub type Result<T> = std::result::Result<T, MetricsError>;

/// Failures the metrics core can surface.
///
/// None of these are retried inside the core. A caller either receives the
/// complete metrics object or one of these errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MetricsError {
    /// A currency code is malformed or the rate source does not know it.
    #[error("unknown currency: {0}")]
    UnknownCurrency(String),

    /// Monetary amounts must be non-negative.
    #[error("negative amount {amount} {currency}")]
    NegativeAmount { amount: Decimal, currency: String },

    /// The live exchange rate source could not answer.
    #[error("exchange rate unavailable for {pair}: {reason}")]
    RateUnavailable { pair: String, reason: String },

    /// The record store failed or returned undecodable data.
    #[error("data store unavailable: {0}")]
    DataStoreUnavailable(String),

    /// An imported record violates the data model.
    #[error("invalid record: {0}")]
    InvalidRecord(String),
}

impl MetricsError {
    pub fn store(msg: impl Into<String>) -> Self {
        Self::DataStoreUnavailable(msg.into())
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidRecord(msg.into())
    }
}

impl From<fjall::Error> for MetricsError {
    fn from(e: fjall::Error) -> Self {
        Self::DataStoreUnavailable(e.to_string())
    }
}

impl From<serde_json::Error> for MetricsError {
    fn from(e: serde_json::Error) -> Self {
        Self::DataStoreUnavailable(format!("undecodable record: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            MetricsError::UnknownCurrency("XYZ".to_string()).to_string(),
            "unknown currency: XYZ"
        );
        assert_eq!(
            MetricsError::NegativeAmount {
                amount: Decimal::new(-150, 2),
                currency: "USD".to_string()
            }
            .to_string(),
            "negative amount -1.50 USD"
        );
        assert_eq!(
            MetricsError::store("keyspace locked").to_string(),
            "data store unavailable: keyspace locked"
        );
    }
}
