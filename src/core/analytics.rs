//! Revenue and customer metrics for one business.
use crate::core::currency::CurrencyNormalizer;
use crate::core::error::Result;
use crate::core::period::{CalendarMonth, TimeWindow};
use crate::core::records::BusinessId;
use crate::core::repository::{BusinessRepository, RecordQuery};
use chrono::{DateTime, FixedOffset, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use tracing::{debug, instrument};

/// Number of monthly buckets in the revenue chart, current month included.
pub const REVENUE_SERIES_MONTHS: usize = 6;

/// One bucket of the revenue chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevenuePoint {
    /// `Mon YYYY`. Serialized as `name`, the key the dashboard chart reads.
    #[serde(rename = "name")]
    pub label: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub value: Decimal,
}

/// Revenue and customer figures for one business at one instant.
///
/// Revenue values are in the reporting currency.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSummary {
    /// Revenue received in the current calendar month.
    #[serde(with = "rust_decimal::serde::float")]
    pub revenue: Decimal,
    #[serde(skip)]
    pub total_revenue: Decimal,
    pub total_customers: u64,
    pub customers_this_month: u64,
    pub customer_growth: String,
    #[serde(rename = "revenueData")]
    pub revenue_data: Vec<RevenuePoint>,
}

/// Share of all customers that joined this month, as a whole percentage.
///
/// This is not a month-over-month delta: 25 new customers out of 100 total is
/// `"25%"`.
pub fn customer_growth(total: u64, this_month: u64) -> String {
    if total == 0 {
        return "0%".to_string();
    }
    let percentage = Decimal::from(this_month) * Decimal::ONE_HUNDRED / Decimal::from(total);
    let rounded = percentage.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    format!("{}%", rounded.normalize())
}

pub struct MetricsAggregator<'a> {
    repository: &'a dyn BusinessRepository,
    normalizer: &'a CurrencyNormalizer,
    timezone: FixedOffset,
}

impl<'a> MetricsAggregator<'a> {
    pub fn new(
        repository: &'a dyn BusinessRepository,
        normalizer: &'a CurrencyNormalizer,
        timezone: FixedOffset,
    ) -> Self {
        Self {
            repository,
            normalizer,
            timezone,
        }
    }

    /// Computes every figure for `business` as of `now`.
    ///
    /// An unknown business is not an error; it simply has no records.
    #[instrument(name = "MetricsSummary", skip(self, business), fields(business = %business))]
    pub async fn summarize(
        &self,
        business: &BusinessId,
        now: DateTime<Utc>,
    ) -> Result<MetricsSummary> {
        let current = CalendarMonth::containing(now, &self.timezone);
        let current_window = current.window(&self.timezone);

        let invoice_ids = self.repository.invoice_ids(business).await?;
        debug!("Business {} has {} invoices", business, invoice_ids.len());

        let revenue = self.revenue(&invoice_ids, Some(current_window)).await?;
        let total_revenue = self.revenue(&invoice_ids, None).await?;

        let total_customers = self.repository.count_customers(business, None).await?;
        let customers_this_month = self
            .repository
            .count_customers(business, Some(current_window))
            .await?;

        let mut revenue_data = Vec::with_capacity(REVENUE_SERIES_MONTHS);
        for month in current.trailing(REVENUE_SERIES_MONTHS) {
            let value = self
                .revenue(&invoice_ids, Some(month.window(&self.timezone)))
                .await?;
            revenue_data.push(RevenuePoint {
                label: month.label(),
                value,
            });
        }

        Ok(MetricsSummary {
            revenue,
            total_revenue,
            total_customers,
            customers_this_month,
            customer_growth: customer_growth(total_customers, customers_this_month),
            revenue_data,
        })
    }

    /// Sum of normalized payment amounts for `invoice_ids` within `window`.
    async fn revenue(
        &self,
        invoice_ids: &[String],
        window: Option<TimeWindow>,
    ) -> Result<Decimal> {
        if invoice_ids.is_empty() {
            return Ok(Decimal::ZERO);
        }
        let payments = self
            .repository
            .payments(invoice_ids, RecordQuery::all().with_window(window))
            .await?;

        let mut total = Decimal::ZERO;
        for record in &payments {
            total += self
                .normalizer
                .convert(record.payment.amount, &record.payment.currency)
                .await?;
        }
        debug!(
            "Revenue over {} payments: {total} {}",
            payments.len(),
            self.normalizer.reporting_currency()
        );
        Ok(total)
    }
}
