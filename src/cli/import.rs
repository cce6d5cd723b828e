use super::ui;
use crate::core::records::Dataset;
use crate::store::disk::{DiskStore, ImportSummary};
use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

/// Reads a JSON dataset from `path`.
pub fn read_dataset(path: &Path) -> Result<Dataset> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read dataset file: {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse dataset file: {}", path.display()))
}

pub fn run(store: &DiskStore, path: &Path) -> Result<String> {
    let dataset = read_dataset(path)?;
    info!("Importing records from {}", path.display());
    let ImportSummary {
        customers,
        invoices,
        payments,
    } = store
        .import(dataset)
        .with_context(|| format!("Rejected dataset {}", path.display()))?;

    Ok(format!(
        "{} {customers} customers, {invoices} invoices, {payments} payments",
        ui::style_text("Imported", ui::StyleType::TotalValue)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const DATASET: &str = r#"{
        "customers": [
            {"id": "c1", "business_id": "b1", "name": "Ife", "created_at": "2024-06-01T10:00:00Z"}
        ],
        "invoices": [
            {"id": "i1", "business_id": "b1", "customer_id": "c1", "invoice_number": "001",
             "amount": 5000, "currency": "ngn", "created_at": "2024-06-02T10:00:00Z"}
        ]
    }"#;

    #[test]
    fn test_import_from_file() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let file = temp_dir.path().join("dataset.json");
        std::fs::write(&file, DATASET)?;
        let store = DiskStore::open(&temp_dir.path().join("records"))?;

        let output = run(&store, &file)?;
        assert!(output.contains("1 customers, 1 invoices, 0 payments"));
        Ok(())
    }

    #[test]
    fn test_malformed_file_is_rejected() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let file = temp_dir.path().join("dataset.json");
        std::fs::write(&file, "{ not json")?;
        let store = DiskStore::open(&temp_dir.path().join("records"))?;

        let err = run(&store, &file).unwrap_err();
        assert!(err.to_string().contains("Failed to parse dataset file"));
        Ok(())
    }
}
