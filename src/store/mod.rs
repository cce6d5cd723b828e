pub mod disk;
pub mod memory;

use crate::core::config::AppConfig;
use anyhow::{Context, Result};
use disk::DiskStore;

/// Opens the record store under the configured data directory.
pub fn open(config: &AppConfig) -> Result<DiskStore> {
    let path = config.default_data_path()?.join("records");
    DiskStore::open(&path)
        .with_context(|| format!("Failed to open record store at {}", path.display()))
}
