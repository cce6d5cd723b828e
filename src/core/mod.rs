//! Core business logic abstractions

pub mod activity;
pub mod analytics;
pub mod cache;
pub mod config;
pub mod currency;
pub mod dashboard;
pub mod error;
pub mod log;
pub mod period;
pub mod records;
pub mod repository;

// Re-export main types for cleaner imports
pub use activity::{Activity, ActivityFeed, ActivityKind, ActivityPage, ActivityQuery};
pub use analytics::{MetricsAggregator, MetricsSummary, RevenuePoint};
pub use currency::{CurrencyNormalizer, CurrencyRateProvider};
pub use dashboard::{DashboardMetrics, DashboardService};
pub use error::{MetricsError, Result};
pub use records::BusinessId;
pub use repository::{BusinessRepository, RecordQuery};
