use super::metrics::activity_table;
use super::ui;
use crate::core::activity::{ActivityFeed, ActivityKind, ActivityPage, ActivityQuery};
use crate::core::config::AppConfig;
use crate::core::period::TimeWindow;
use crate::core::records::BusinessId;
use crate::core::repository::BusinessRepository;
use anyhow::{Context, Result, bail};
use chrono::{FixedOffset, NaiveDate};
use std::str::FromStr;

/// Value of `--type`: one activity kind, or `all` for no filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeFilter(pub Option<ActivityKind>);

impl FromStr for TypeFilter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(Self(None));
        }
        s.trim().parse().map(|kind| Self(Some(kind)))
    }
}

#[derive(Debug, Clone)]
pub struct ActivitiesArgs {
    pub business: Option<String>,
    pub page: usize,
    pub per_page: Option<usize>,
    pub search: Option<String>,
    pub kind: Option<ActivityKind>,
    /// First day included, in the reporting timezone.
    pub from: Option<NaiveDate>,
    /// Last day included, in the reporting timezone.
    pub to: Option<NaiveDate>,
    pub json: bool,
}

impl Default for ActivitiesArgs {
    fn default() -> Self {
        Self {
            business: None,
            page: 1,
            per_page: None,
            search: None,
            kind: None,
            from: None,
            to: None,
            json: false,
        }
    }
}

impl ActivitiesArgs {
    /// Builds the listing query.
    pub fn to_query(&self, config: &AppConfig, tz: &FixedOffset) -> Result<ActivityQuery> {
        if self.page == 0 {
            bail!("Page numbers start at 1");
        }
        let per_page = self.per_page.unwrap_or(config.activity_limit);
        if per_page == 0 {
            bail!("--per-page must be at least 1");
        }

        let window = match (self.from, self.to) {
            (None, None) => None,
            (Some(from), Some(to)) if from > to => {
                bail!("--from {from} is after --to {to}");
            }
            (from, to) => Some(TimeWindow::between_dates(from, to, tz)),
        };

        Ok(ActivityQuery {
            page: self.page,
            per_page,
            search: self.search.clone().filter(|s| !s.trim().is_empty()),
            kind: self.kind,
            window,
        })
    }
}

impl ActivityPage {
    pub fn display_as_table(&self, page: usize, tz: &FixedOffset) -> String {
        if self.data.is_empty() {
            return ui::style_text("No matching activity", ui::StyleType::Subtle);
        }
        let footer = match self.next_page {
            Some(next) => format!("Page {page}, more on page {next}"),
            None => format!("Page {page}, end of results"),
        };
        format!(
            "{}\n{}",
            activity_table(&self.data, tz),
            ui::style_text(&footer, ui::StyleType::Subtle)
        )
    }
}

pub async fn run(
    repository: &dyn BusinessRepository,
    config: &AppConfig,
    business: &BusinessId,
    args: &ActivitiesArgs,
) -> Result<String> {
    let tz = config.reporting_timezone()?;
    let query = args.to_query(config, &tz)?;

    let page = ActivityFeed::new(repository)
        .list(business, &query)
        .await
        .with_context(|| format!("Failed to list activities for {business}"))?;

    if args.json {
        return serde_json::to_string_pretty(&page).context("Failed to serialize activities");
    }
    Ok(page.display_as_table(query.page, &tz))
}
