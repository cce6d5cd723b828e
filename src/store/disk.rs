use super::memory::MemoryRepository;
use crate::core::error::{MetricsError, Result};
use crate::core::records::{BusinessId, Customer, Dataset, Invoice, Payment};
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use serde::{Serialize, de::DeserializeOwned};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{debug, info, instrument};

const CUSTOMERS: &str = "customers";
const INVOICES: &str = "invoices";
const PAYMENTS: &str = "payments";

/// Counts of records written by [`DiskStore::import`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportSummary {
    pub customers: usize,
    pub invoices: usize,
    pub payments: usize,
}

/// Record store persisted in a fjall keyspace, one partition per record kind.
///
/// Values are JSON documents keyed by record id. Reads go through
/// [`DiskStore::load_business`], which yields a queryable snapshot.
pub struct DiskStore {
    keyspace: Keyspace,
    customers: PartitionHandle,
    invoices: PartitionHandle,
    payments: PartitionHandle,
}

fn read_all<T: DeserializeOwned>(partition: &PartitionHandle) -> Result<Vec<T>> {
    partition
        .iter()
        .map(|entry| -> Result<T> {
            let (_, value) = entry?;
            Ok(serde_json::from_slice(&value)?)
        })
        .collect()
}

fn encode<T: Serialize>(record: &T) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(record)?)
}

impl DiskStore {
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)
            .map_err(|e| MetricsError::store(format!("cannot create {}: {e}", path.display())))?;
        let keyspace = fjall::Config::new(path).open()?;
        let customers = keyspace.open_partition(CUSTOMERS, PartitionCreateOptions::default())?;
        let invoices = keyspace.open_partition(INVOICES, PartitionCreateOptions::default())?;
        let payments = keyspace.open_partition(PAYMENTS, PartitionCreateOptions::default())?;
        debug!("Opened record store at {}", path.display());
        Ok(Self {
            keyspace,
            customers,
            invoices,
            payments,
        })
    }

    /// Validates `dataset` against itself and the stored records, then writes
    /// it atomically. Records with an existing id are replaced.
    #[instrument(skip_all)]
    pub fn import(&self, mut dataset: Dataset) -> Result<ImportSummary> {
        let known_customers: HashMap<String, BusinessId> = read_all::<Customer>(&self.customers)?
            .into_iter()
            .map(|c| (c.id, c.business_id))
            .collect();
        let known_invoices: HashMap<String, BusinessId> = read_all::<Invoice>(&self.invoices)?
            .into_iter()
            .map(|i| (i.id, i.business_id))
            .collect();
        dataset.validate(&known_customers, &known_invoices)?;

        let mut batch = self.keyspace.batch();
        for customer in &dataset.customers {
            batch.insert(&self.customers, customer.id.as_bytes(), encode(customer)?);
        }
        for invoice in &dataset.invoices {
            batch.insert(&self.invoices, invoice.id.as_bytes(), encode(invoice)?);
        }
        for payment in &dataset.payments {
            batch.insert(&self.payments, payment.id.as_bytes(), encode(payment)?);
        }
        batch.commit()?;
        self.keyspace.persist(PersistMode::SyncAll)?;

        let summary = ImportSummary {
            customers: dataset.customers.len(),
            invoices: dataset.invoices.len(),
            payments: dataset.payments.len(),
        };
        info!(
            "Imported {} customers, {} invoices, {} payments",
            summary.customers, summary.invoices, summary.payments
        );
        Ok(summary)
    }

    /// Loads every record of `business` into one in-memory snapshot.
    ///
    /// Each partition is scanned once, and all queries against the returned
    /// repository see the same data.
    #[instrument(skip(self))]
    pub fn load_business(&self, business: &BusinessId) -> Result<MemoryRepository> {
        let customers: Vec<Customer> = read_all::<Customer>(&self.customers)?
            .into_iter()
            .filter(|c| c.business_id == *business)
            .collect();
        let invoices: Vec<Invoice> = read_all::<Invoice>(&self.invoices)?
            .into_iter()
            .filter(|i| i.business_id == *business)
            .collect();
        let invoice_ids: HashSet<&str> = invoices.iter().map(|i| i.id.as_str()).collect();
        let payments: Vec<Payment> = read_all::<Payment>(&self.payments)?
            .into_iter()
            .filter(|p| invoice_ids.contains(p.invoice_id.as_str()))
            .collect();
        debug!(
            "Loaded {} customers, {} invoices, {} payments for {business}",
            customers.len(),
            invoices.len(),
            payments.len()
        );
        Ok(MemoryRepository::from_dataset(Dataset {
            customers,
            invoices,
            payments,
        }))
    }
}
