use crate::core::error::Result;
use crate::core::period::TimeWindow;
use crate::core::records::{
    BusinessId, Customer, Dataset, Invoice, InvoiceRecord, Payment, PaymentRecord,
};
use crate::core::repository::{BusinessRepository, RecordQuery};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Repository over records held in memory.
///
/// Also serves as the query engine for [`super::disk::DiskStore`], which loads
/// a business's records into one of these.
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    customers: Vec<Customer>,
    invoices: Vec<Invoice>,
    payments: Vec<Payment>,
}

/// Sorts newest first. Rows with equal timestamps keep their input order.
fn newest_first<T>(rows: &mut [T], created_at: impl Fn(&T) -> chrono::DateTime<chrono::Utc>) {
    rows.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
}

impl MemoryRepository {
    pub fn from_dataset(dataset: Dataset) -> Self {
        let Dataset {
            mut customers,
            mut invoices,
            mut payments,
        } = dataset;
        newest_first(&mut customers, |c| c.created_at);
        newest_first(&mut invoices, |i| i.created_at);
        newest_first(&mut payments, |p| p.created_at);
        Self {
            customers,
            invoices,
            payments,
        }
    }

    fn customer_names(&self) -> HashMap<&str, &str> {
        self.customers
            .iter()
            .map(|c| (c.id.as_str(), c.name.as_str()))
            .collect()
    }
}

#[async_trait]
impl BusinessRepository for MemoryRepository {
    async fn count_customers(
        &self,
        business: &BusinessId,
        window: Option<TimeWindow>,
    ) -> Result<u64> {
        let count = self
            .customers
            .iter()
            .filter(|c| c.business_id == *business)
            .filter(|c| window.is_none_or(|w| w.contains(&c.created_at)))
            .count();
        Ok(count as u64)
    }

    async fn customers(&self, business: &BusinessId, query: RecordQuery) -> Result<Vec<Customer>> {
        Ok(query.apply(
            self.customers
                .iter()
                .filter(|c| c.business_id == *business)
                .cloned(),
            |c| c.created_at,
        ))
    }

    async fn invoice_ids(&self, business: &BusinessId) -> Result<Vec<String>> {
        Ok(self
            .invoices
            .iter()
            .filter(|i| i.business_id == *business)
            .map(|i| i.id.clone())
            .collect())
    }

    async fn invoices(
        &self,
        business: &BusinessId,
        query: RecordQuery,
    ) -> Result<Vec<InvoiceRecord>> {
        let names = self.customer_names();
        let rows = query.apply(
            self.invoices.iter().filter(|i| i.business_id == *business),
            |i| i.created_at,
        );
        Ok(rows
            .into_iter()
            .map(|invoice| InvoiceRecord {
                customer_name: names
                    .get(invoice.customer_id.as_str())
                    .map(|name| name.to_string())
                    .unwrap_or_default(),
                invoice: invoice.clone(),
            })
            .collect())
    }

    async fn payments(
        &self,
        invoice_ids: &[String],
        query: RecordQuery,
    ) -> Result<Vec<PaymentRecord>> {
        let wanted: HashSet<&str> = invoice_ids.iter().map(String::as_str).collect();
        let invoices: HashMap<&str, &Invoice> = self
            .invoices
            .iter()
            .filter(|i| wanted.contains(i.id.as_str()))
            .map(|i| (i.id.as_str(), i))
            .collect();
        let names = self.customer_names();

        let rows = query.apply(
            self.payments
                .iter()
                .filter(|p| invoices.contains_key(p.invoice_id.as_str())),
            |p| p.created_at,
        );
        debug!("Selected {} payments for {} invoices", rows.len(), wanted.len());

        Ok(rows
            .into_iter()
            .map(|payment| {
                let invoice = invoices.get(payment.invoice_id.as_str());
                PaymentRecord {
                    invoice_number: invoice
                        .map(|i| i.invoice_number.clone())
                        .unwrap_or_default(),
                    customer_name: invoice
                        .and_then(|i| names.get(i.customer_id.as_str()))
                        .map(|name| name.to_string())
                        .unwrap_or_default(),
                    payment: payment.clone(),
                }
            })
            .collect())
    }
}
