use anyhow::Result;
use bizmetrics::cli::activities::{ActivitiesArgs, TypeFilter};
use bizmetrics::cli::metrics::MetricsArgs;
use bizmetrics::core::log::init_logging;
use chrono::{DateTime, NaiveDate, Utc};
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Import customers, invoices and payments from a JSON file
    Import {
        /// JSON document with `customers`, `invoices` and `payments` arrays
        file: PathBuf,
    },
    /// Display dashboard metrics for a business
    Metrics {
        /// Business id (defaults to `business_id` from the config)
        #[arg(short, long)]
        business: Option<String>,
        /// Compute as of this RFC 3339 instant instead of now
        #[arg(long)]
        at: Option<DateTime<Utc>>,
        /// Print the metrics object as JSON
        #[arg(long)]
        json: bool,
    },
    /// List activities with paging and filters
    Activities {
        /// Business id (defaults to `business_id` from the config)
        #[arg(short, long)]
        business: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: usize,
        /// Defaults to `activity_limit` from the config
        #[arg(long)]
        per_page: Option<usize>,
        /// Case-insensitive text to look for in activity titles
        #[arg(short, long)]
        search: Option<String>,
        /// customer_added, invoice_created, payment_received or all
        #[arg(short = 't', long = "type")]
        kind: Option<TypeFilter>,
        /// First day to include (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Last day to include (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,
        /// Print the page as JSON
        #[arg(long)]
        json: bool,
    },
}

impl From<Commands> for bizmetrics::AppCommand {
    fn from(cmd: Commands) -> bizmetrics::AppCommand {
        match cmd {
            Commands::Import { file } => bizmetrics::AppCommand::Import { file },
            Commands::Metrics { business, at, json } => {
                bizmetrics::AppCommand::Metrics(MetricsArgs { business, at, json })
            }
            Commands::Activities {
                business,
                page,
                per_page,
                search,
                kind,
                from,
                to,
                json,
            } => bizmetrics::AppCommand::Activities(ActivitiesArgs {
                business,
                page,
                per_page,
                search,
                kind: kind.and_then(|filter| filter.0),
                from,
                to,
                json,
            }),
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => bizmetrics::cli::setup::setup(),
        Some(cmd) => bizmetrics::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
