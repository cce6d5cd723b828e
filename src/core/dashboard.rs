use crate::core::activity::{Activity, ActivityFeed};
use crate::core::analytics::{MetricsAggregator, MetricsSummary};
use crate::core::config::DEFAULT_ACTIVITY_LIMIT;
use crate::core::currency::CurrencyNormalizer;
use crate::core::error::Result;
use crate::core::records::BusinessId;
use crate::core::repository::BusinessRepository;
use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use tracing::{info, instrument};

/// The object the dashboard renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardMetrics {
    #[serde(flatten)]
    pub summary: MetricsSummary,
    pub recent_activities: Vec<Activity>,
}

pub struct DashboardService<'a> {
    repository: &'a dyn BusinessRepository,
    normalizer: &'a CurrencyNormalizer,
    timezone: FixedOffset,
    activity_limit: usize,
}

impl<'a> DashboardService<'a> {
    pub fn new(
        repository: &'a dyn BusinessRepository,
        normalizer: &'a CurrencyNormalizer,
        timezone: FixedOffset,
    ) -> Self {
        Self {
            repository,
            normalizer,
            timezone,
            activity_limit: DEFAULT_ACTIVITY_LIMIT,
        }
    }

    pub fn with_activity_limit(mut self, limit: usize) -> Self {
        self.activity_limit = limit;
        self
    }

    /// Metrics and the recent activity feed for `business` as of `now`.
    /// Either half failing fails the whole call.
    #[instrument(name = "DashboardMetrics", skip(self, business), fields(business = %business))]
    pub async fn metrics(
        &self,
        business: &BusinessId,
        now: DateTime<Utc>,
    ) -> Result<DashboardMetrics> {
        let aggregator = MetricsAggregator::new(self.repository, self.normalizer, self.timezone);
        let feed = ActivityFeed::new(self.repository);

        let (summary, recent_activities) = futures::try_join!(
            aggregator.summarize(business, now),
            feed.recent(business, self.activity_limit)
        )?;

        info!(
            "Dashboard for {}: {} customers, {} activities",
            business,
            summary.total_customers,
            recent_activities.len()
        );
        Ok(DashboardMetrics {
            summary,
            recent_activities,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::currency::CurrencyRateProvider;
    use crate::core::error::MetricsError;
    use crate::core::records::{Customer, Dataset, Invoice, Payment};
    use crate::store::memory::MemoryRepository;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use rust_decimal::Decimal;
    use std::sync::Arc;

    struct UsdOnly;

    #[async_trait]
    impl CurrencyRateProvider for UsdOnly {
        async fn get_rate(&self, from: &str, _to: &str) -> Result<Decimal> {
            match from {
                "USD" => Ok(Decimal::new(1500, 0)),
                other => Err(MetricsError::UnknownCurrency(other.to_string())),
            }
        }
    }

    fn normalizer() -> CurrencyNormalizer {
        CurrencyNormalizer::new(Arc::new(UsdOnly), "NGN").unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn dataset(payment_currency: &str) -> Dataset {
        let at = Utc.with_ymd_and_hms(2024, 6, 2, 8, 0, 0).unwrap();
        Dataset {
            customers: vec![Customer {
                id: "c1".to_string(),
                business_id: BusinessId::new("b1"),
                name: "Ngozi".to_string(),
                created_at: at,
            }],
            invoices: vec![Invoice {
                id: "i1".to_string(),
                business_id: BusinessId::new("b1"),
                customer_id: "c1".to_string(),
                invoice_number: "42".to_string(),
                amount: Decimal::new(10, 0),
                currency: "USD".to_string(),
                created_at: at,
            }],
            payments: vec![Payment {
                id: "p1".to_string(),
                invoice_id: "i1".to_string(),
                amount: Decimal::new(10, 0),
                currency: payment_currency.to_string(),
                created_at: at,
            }],
        }
    }

    #[tokio::test]
    async fn test_empty_business_shape() {
        let repository = MemoryRepository::default();
        let normalizer = normalizer();
        let service = DashboardService::new(&repository, &normalizer, FixedOffset::east_opt(0).unwrap());

        let metrics = service.metrics(&BusinessId::new("none"), now()).await.unwrap();
        let json = serde_json::to_value(&metrics).unwrap();

        let mut keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec![
                "customer_growth",
                "customers_this_month",
                "recent_activities",
                "revenue",
                "revenueData",
                "total_customers",
            ]
        );
        assert_eq!(json["revenue"].as_f64(), Some(0.0));
        assert_eq!(json["customer_growth"], "0%");
        assert_eq!(json["revenueData"].as_array().unwrap().len(), 6);
        assert_eq!(json["revenueData"][5]["name"], "Jun 2024");
        assert!(json["recent_activities"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_metrics_combine_summary_and_feed() {
        let repository = MemoryRepository::from_dataset(dataset("USD"));
        let normalizer = normalizer();
        let service = DashboardService::new(&repository, &normalizer, FixedOffset::east_opt(0).unwrap())
            .with_activity_limit(2);

        let metrics = service.metrics(&BusinessId::new("b1"), now()).await.unwrap();
        assert_eq!(metrics.summary.revenue, Decimal::new(15_000, 0));
        assert_eq!(metrics.summary.customer_growth, "100%");
        assert_eq!(metrics.recent_activities.len(), 2);
        assert_eq!(metrics.recent_activities[0].title, "New customer added: Ngozi");
    }

    #[tokio::test]
    async fn test_conversion_failure_fails_whole_call() {
        let repository = MemoryRepository::from_dataset(dataset("GBP"));
        let normalizer = normalizer();
        let service = DashboardService::new(&repository, &normalizer, FixedOffset::east_opt(0).unwrap());

        let result = service.metrics(&BusinessId::new("b1"), now()).await;
        assert_eq!(result, Err(MetricsError::UnknownCurrency("GBP".to_string())));
    }
}
