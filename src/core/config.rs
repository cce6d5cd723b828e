use crate::core::period::parse_offset;
use anyhow::{Context, Result};
use chrono::FixedOffset;
use directories::ProjectDirs;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

pub const DEFAULT_ACTIVITY_LIMIT: usize = 20;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct YahooProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ProvidersConfig {
    pub yahoo: Option<YahooProviderConfig>,
}

fn default_activity_limit() -> usize {
    DEFAULT_ACTIVITY_LIMIT
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    pub reporting_currency: String,
    /// Fixed UTC offset used for calendar month boundaries. UTC when absent.
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default = "default_activity_limit")]
    pub activity_limit: usize,
    #[serde(default)]
    pub business_id: Option<String>,
    pub data_path: Option<String>,
    /// Units of reporting currency per one unit of the keyed currency.
    #[serde(default)]
    pub rates: BTreeMap<String, Decimal>,
    #[serde(default)]
    pub providers: ProvidersConfig,
    /// Seconds a live rate stays cached. Cached for the whole run when absent.
    #[serde(default)]
    pub rate_cache_ttl_secs: Option<u64>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "bizmetrics", "bizmetrics")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("io", "bizmetrics", "bizmetrics")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        config
            .reporting_timezone()
            .with_context(|| format!("Invalid config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn reporting_timezone(&self) -> Result<FixedOffset> {
        parse_offset(self.timezone.as_deref().unwrap_or("UTC"))
    }

    pub fn rate_cache_ttl(&self) -> Option<Duration> {
        self.rate_cache_ttl_secs.map(Duration::from_secs)
    }
}
