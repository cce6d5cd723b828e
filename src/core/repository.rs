//! Read-only query interface over the record store.

use crate::core::error::Result;
use crate::core::period::TimeWindow;
use crate::core::records::{BusinessId, Customer, InvoiceRecord, PaymentRecord};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Restricts a listing to a time window and/or the newest `limit` rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordQuery {
    pub window: Option<TimeWindow>,
    pub limit: Option<usize>,
}

impl RecordQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn latest(limit: usize) -> Self {
        Self {
            window: None,
            limit: Some(limit),
        }
    }

    pub fn with_window(mut self, window: Option<TimeWindow>) -> Self {
        self.window = window;
        self
    }

    /// Applies the query to rows already sorted newest first.
    pub fn apply<T>(
        &self,
        rows: impl Iterator<Item = T>,
        created_at: impl Fn(&T) -> DateTime<Utc>,
    ) -> Vec<T> {
        let window = self.window;
        let filtered = rows.filter(|row| window.is_none_or(|w| w.contains(&created_at(row))));
        match self.limit {
            Some(limit) => filtered.take(limit).collect(),
            None => filtered.collect(),
        }
    }
}

/// The queries the metrics core issues against a record store.
///
/// Listings come back newest first. Unknown businesses and empty invoice sets
/// yield empty results, never errors.
#[async_trait]
pub trait BusinessRepository: Send + Sync {
    async fn count_customers(&self, business: &BusinessId, window: Option<TimeWindow>)
    -> Result<u64>;

    async fn customers(&self, business: &BusinessId, query: RecordQuery) -> Result<Vec<Customer>>;

    async fn invoice_ids(&self, business: &BusinessId) -> Result<Vec<String>>;

    async fn invoices(&self, business: &BusinessId, query: RecordQuery)
    -> Result<Vec<InvoiceRecord>>;

    /// Payments whose invoice is one of `invoice_ids`.
    async fn payments(&self, invoice_ids: &[String], query: RecordQuery)
    -> Result<Vec<PaymentRecord>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_apply_window_then_limit() {
        let rows = vec![day(20), day(15), day(10), day(5)];
        let window = TimeWindow::new(day(6), day(16));

        let within = RecordQuery::all()
            .with_window(Some(window))
            .apply(rows.clone().into_iter(), |d| *d);
        assert_eq!(within, vec![day(15), day(10)]);

        let latest = RecordQuery::latest(3).apply(rows.clone().into_iter(), |d| *d);
        assert_eq!(latest, vec![day(20), day(15), day(10)]);

        let both = RecordQuery::latest(1)
            .with_window(Some(window))
            .apply(rows.into_iter(), |d| *d);
        assert_eq!(both, vec![day(15)]);
    }
}
