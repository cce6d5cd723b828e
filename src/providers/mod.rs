pub mod fallback;
pub mod static_rates;
pub mod util;
pub mod yahoo_finance;

use crate::core::cache::Cache;
use crate::core::config::AppConfig;
use crate::core::currency::CurrencyRateProvider;
use anyhow::{Context, Result};
use fallback::FallbackRateProvider;
use static_rates::StaticRateProvider;
use std::sync::Arc;
use tracing::debug;
use yahoo_finance::YahooCurrencyProvider;

/// Builds the rate source described by `config`.
///
/// The static table alone when no live provider is configured, the live
/// provider alone when the table is empty, otherwise the table backed by the
/// live provider.
pub fn rate_provider(config: &AppConfig) -> Result<Arc<dyn CurrencyRateProvider>> {
    let table = StaticRateProvider::new(&config.reporting_currency, &config.rates)
        .context("Invalid exchange rate table")?;

    let Some(yahoo) = config.providers.yahoo.as_ref() else {
        debug!("Using static exchange rates only");
        return Ok(Arc::new(table));
    };
    let cache = match config.rate_cache_ttl() {
        Some(ttl) => Cache::with_ttl(ttl),
        None => Cache::new(),
    };
    let live = Arc::new(YahooCurrencyProvider::new(&yahoo.base_url, Arc::new(cache)));

    if table.is_empty() {
        debug!("Using live exchange rates from {}", yahoo.base_url);
        Ok(live)
    } else {
        debug!("Using static exchange rates with live fallback from {}", yahoo.base_url);
        Ok(Arc::new(FallbackRateProvider::new(Arc::new(table), live)))
    }
}
