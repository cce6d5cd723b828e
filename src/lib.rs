pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

pub use crate::core::config;

use crate::cli::activities::ActivitiesArgs;
use crate::cli::metrics::MetricsArgs;
use crate::core::config::AppConfig;
use crate::core::currency::CurrencyNormalizer;
use crate::core::records::BusinessId;
use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{debug, info};

pub enum AppCommand {
    Import { file: PathBuf },
    Metrics(MetricsArgs),
    Activities(ActivitiesArgs),
}

/// Picks the business from the command line, falling back to the config.
pub fn resolve_business(arg: Option<&str>, config: &AppConfig) -> Result<BusinessId> {
    arg.or(config.business_id.as_deref())
        .filter(|id| !id.trim().is_empty())
        .map(BusinessId::new)
        .context("No business given: pass --business or set business_id in the config")
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("bizmetrics starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let output = execute(command, &config).await?;
    println!("{output}");
    Ok(())
}

/// Runs `command` against the store described by `config` and returns what
/// the command would print.
pub async fn execute(command: AppCommand, config: &AppConfig) -> Result<String> {
    let store = store::open(config)?;

    match command {
        AppCommand::Import { file } => cli::import::run(&store, &file),
        AppCommand::Metrics(args) => {
            let business = resolve_business(args.business.as_deref(), config)?;
            let provider = providers::rate_provider(config)?;
            let normalizer = CurrencyNormalizer::new(provider, &config.reporting_currency)
                .context("Invalid reporting currency")?;
            let records = store.load_business(&business)?;
            cli::metrics::run(&records, &normalizer, config, &business, &args).await
        }
        AppCommand::Activities(args) => {
            let business = resolve_business(args.business.as_deref(), config)?;
            let records = store.load_business(&business)?;
            cli::activities::run(&records, config, &business, &args).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(business_id: Option<&str>) -> AppConfig {
        let mut config: AppConfig = serde_yaml::from_str("reporting_currency: USD").unwrap();
        config.business_id = business_id.map(str::to_string);
        config
    }

    #[test]
    fn test_resolve_business_prefers_argument() {
        let business = resolve_business(Some("b2"), &config(Some("b1"))).unwrap();
        assert_eq!(business, BusinessId::new("b2"));

        let business = resolve_business(None, &config(Some("b1"))).unwrap();
        assert_eq!(business, BusinessId::new("b1"));
    }

    #[test]
    fn test_resolve_business_requires_one() {
        let err = resolve_business(None, &config(None)).unwrap_err();
        assert!(err.to_string().contains("--business"));
        assert!(resolve_business(Some(" "), &config(None)).is_err());
    }
}
