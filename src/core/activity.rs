//! Recent activity across customers, invoices and payments.

use crate::core::config::DEFAULT_ACTIVITY_LIMIT;
use crate::core::error::Result;
use crate::core::period::TimeWindow;
use crate::core::records::{BusinessId, Customer, InvoiceRecord, PaymentRecord};
use crate::core::repository::{BusinessRepository, RecordQuery};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use tracing::{debug, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    CustomerAdded,
    InvoiceCreated,
    PaymentReceived,
}

impl Display for ActivityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                ActivityKind::CustomerAdded => "customer_added",
                ActivityKind::InvoiceCreated => "invoice_created",
                ActivityKind::PaymentReceived => "payment_received",
            }
        )
    }
}

impl FromStr for ActivityKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "customer_added" | "customers" => Ok(ActivityKind::CustomerAdded),
            "invoice_created" | "invoices" => Ok(ActivityKind::InvoiceCreated),
            "payment_received" | "payments" => Ok(ActivityKind::PaymentReceived),
            _ => Err(anyhow::anyhow!("Invalid activity type: {}", s)),
        }
    }
}

/// A display-ready event derived from a customer, invoice or payment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Activity {
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub title: String,
    pub time: DateTime<Utc>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub amount: Option<Decimal>,
    pub currency: Option<String>,
}

impl From<&Customer> for Activity {
    fn from(customer: &Customer) -> Self {
        Self {
            kind: ActivityKind::CustomerAdded,
            title: format!("New customer added: {}", customer.name),
            time: customer.created_at,
            amount: None,
            currency: None,
        }
    }
}

impl From<&InvoiceRecord> for Activity {
    fn from(record: &InvoiceRecord) -> Self {
        Self {
            kind: ActivityKind::InvoiceCreated,
            title: format!(
                "Invoice #{} created for {}",
                record.invoice.invoice_number, record.customer_name
            ),
            time: record.invoice.created_at,
            amount: Some(record.invoice.amount),
            currency: Some(record.invoice.currency.clone()),
        }
    }
}

impl From<&PaymentRecord> for Activity {
    fn from(record: &PaymentRecord) -> Self {
        Self {
            kind: ActivityKind::PaymentReceived,
            title: format!(
                "Payment received for Invoice #{} from {}",
                record.invoice_number, record.customer_name
            ),
            time: record.payment.created_at,
            amount: Some(record.payment.amount),
            currency: Some(record.payment.currency.clone()),
        }
    }
}

/// Filters and paging for the activity listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityQuery {
    /// 1-based page number.
    pub page: usize,
    pub per_page: usize,
    /// Case-insensitive substring of the title.
    pub search: Option<String>,
    pub kind: Option<ActivityKind>,
    pub window: Option<TimeWindow>,
}

impl Default for ActivityQuery {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_ACTIVITY_LIMIT,
            search: None,
            kind: None,
            window: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityPage {
    pub data: Vec<Activity>,
    pub next_page: Option<usize>,
}

/// Stable sort, newest first. Equal timestamps keep concatenation order.
fn sort_newest_first(activities: &mut [Activity]) {
    activities.sort_by(|a, b| b.time.cmp(&a.time));
}

pub struct ActivityFeed<'a> {
    repository: &'a dyn BusinessRepository,
}

impl<'a> ActivityFeed<'a> {
    pub fn new(repository: &'a dyn BusinessRepository) -> Self {
        Self { repository }
    }

    /// The `limit` most recent activities for `business`.
    ///
    /// Each source contributes at most `limit` rows before the merge, and the
    /// merged list is cut to `limit` again.
    #[instrument(name = "RecentActivities", skip(self, business), fields(business = %business))]
    pub async fn recent(&self, business: &BusinessId, limit: usize) -> Result<Vec<Activity>> {
        let query = RecordQuery::latest(limit);
        let mut activities = self.collect(business, query, None).await?;
        sort_newest_first(&mut activities);
        activities.truncate(limit);
        Ok(activities)
    }

    /// One page of the filtered activity listing.
    #[instrument(name = "ActivityListing", skip(self, business), fields(business = %business))]
    pub async fn list(&self, business: &BusinessId, query: &ActivityQuery) -> Result<ActivityPage> {
        let page = query.page.max(1);
        let per_page = query.per_page.max(1);

        let mut activities = self
            .collect(business, RecordQuery::all().with_window(query.window), query.kind)
            .await?;
        if let Some(needle) = query.search.as_deref().map(str::to_lowercase) {
            activities.retain(|a| a.title.to_lowercase().contains(&needle));
        }
        sort_newest_first(&mut activities);

        let skip = (page - 1).saturating_mul(per_page);
        let has_more = activities.len() > skip.saturating_add(per_page);
        let data: Vec<Activity> = activities.into_iter().skip(skip).take(per_page).collect();
        debug!("Listing page {} with {} activities", page, data.len());

        Ok(ActivityPage {
            data,
            next_page: has_more.then_some(page + 1),
        })
    }

    /// Customers, then invoices, then payments, each already newest first.
    async fn collect(
        &self,
        business: &BusinessId,
        query: RecordQuery,
        kind: Option<ActivityKind>,
    ) -> Result<Vec<Activity>> {
        let wants = |k: ActivityKind| kind.is_none_or(|wanted| wanted == k);
        let mut activities = Vec::new();

        if wants(ActivityKind::CustomerAdded) {
            let customers = self.repository.customers(business, query).await?;
            activities.extend(customers.iter().map(Activity::from));
        }
        if wants(ActivityKind::InvoiceCreated) {
            let invoices = self.repository.invoices(business, query).await?;
            activities.extend(invoices.iter().map(Activity::from));
        }
        if wants(ActivityKind::PaymentReceived) {
            let invoice_ids = self.repository.invoice_ids(business).await?;
            let payments = self.repository.payments(&invoice_ids, query).await?;
            activities.extend(payments.iter().map(Activity::from));
        }

        debug!("Collected {} activities for {}", activities.len(), business);
        Ok(activities)
    }
}
