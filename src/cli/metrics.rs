use super::ui;
use crate::core::activity::Activity;
use crate::core::config::AppConfig;
use crate::core::currency::CurrencyNormalizer;
use crate::core::dashboard::{DashboardMetrics, DashboardService};
use crate::core::records::BusinessId;
use crate::core::repository::BusinessRepository;
use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, Utc};
use comfy_table::Cell;

#[derive(Debug, Clone, Default)]
pub struct MetricsArgs {
    pub business: Option<String>,
    /// Reference instant; the current time when absent.
    pub at: Option<DateTime<Utc>>,
    pub json: bool,
}

impl DashboardMetrics {
    pub fn display_as_tables(&self, reporting_currency: &str, tz: &FixedOffset) -> String {
        let summary = &self.summary;

        let mut figures = ui::new_styled_table();
        figures.set_header(vec![ui::header_cell("Metric"), ui::header_cell("Value")]);
        figures.add_row(vec![
            Cell::new(format!("Revenue this month ({reporting_currency})")),
            ui::amount_cell(summary.revenue),
        ]);
        figures.add_row(vec![
            Cell::new(format!("Total revenue ({reporting_currency})")),
            ui::amount_cell(summary.total_revenue),
        ]);
        figures.add_row(vec![
            Cell::new("Total customers"),
            Cell::new(summary.total_customers),
        ]);
        figures.add_row(vec![
            Cell::new("New customers this month"),
            Cell::new(summary.customers_this_month),
        ]);
        figures.add_row(vec![
            Cell::new("Customer growth"),
            Cell::new(&summary.customer_growth),
        ]);

        let mut revenue = ui::new_styled_table();
        revenue.set_header(vec![
            ui::header_cell("Month"),
            ui::header_cell(&format!("Revenue ({reporting_currency})")),
        ]);
        for point in &summary.revenue_data {
            revenue.add_row(vec![Cell::new(&point.label), ui::amount_cell(point.value)]);
        }

        let mut output = format!(
            "{}\n{figures}\n\n{}\n{revenue}\n\n{}\n",
            ui::style_text("Overview", ui::StyleType::Title),
            ui::style_text("Revenue by month", ui::StyleType::Title),
            ui::style_text("Recent activity", ui::StyleType::Title),
        );
        if self.recent_activities.is_empty() {
            output.push_str(&ui::style_text("No activity yet", ui::StyleType::Subtle));
        } else {
            output.push_str(&activity_table(&self.recent_activities, tz));
        }
        output
    }
}

/// Renders activities as a table with times in `tz`.
pub fn activity_table(activities: &[Activity], tz: &FixedOffset) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Time"),
        ui::header_cell("Type"),
        ui::header_cell("Activity"),
        ui::header_cell("Amount"),
    ]);
    for activity in activities {
        let amount = activity.amount.map(|value| {
            format!(
                "{} {}",
                ui::format_amount(value),
                activity.currency.as_deref().unwrap_or_default()
            )
        });
        table.add_row(vec![
            Cell::new(ui::format_time(activity.time, tz)),
            Cell::new(activity.kind),
            Cell::new(&activity.title),
            ui::format_optional_cell(amount, |a| a),
        ]);
    }
    table.to_string()
}

pub async fn run(
    repository: &dyn BusinessRepository,
    normalizer: &CurrencyNormalizer,
    config: &AppConfig,
    business: &BusinessId,
    args: &MetricsArgs,
) -> Result<String> {
    let tz = config.reporting_timezone()?;
    let now = args.at.unwrap_or_else(Utc::now);
    let service =
        DashboardService::new(repository, normalizer, tz).with_activity_limit(config.activity_limit);

    let pb = (!args.json).then(|| ui::new_spinner("Computing metrics..."));
    let metrics = service.metrics(business, now).await;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    let metrics = metrics.with_context(|| format!("Failed to compute metrics for {business}"))?;

    if args.json {
        return serde_json::to_string_pretty(&metrics).context("Failed to serialize metrics");
    }
    Ok(format!(
        "Business: {}\n\n{}",
        ui::style_text(business.as_str(), ui::StyleType::TotalLabel),
        metrics.display_as_tables(normalizer.reporting_currency(), &tz)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::activity::ActivityKind;
    use crate::core::analytics::{MetricsSummary, RevenuePoint};
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    #[test]
    fn test_tables_include_figures_and_activity() {
        let metrics = DashboardMetrics {
            summary: MetricsSummary {
                revenue: Decimal::new(1_520_000, 0),
                total_revenue: Decimal::new(1_577_000, 0),
                total_customers: 4,
                customers_this_month: 1,
                customer_growth: "25%".to_string(),
                revenue_data: vec![RevenuePoint {
                    label: "Jun 2024".to_string(),
                    value: Decimal::new(1_520_000, 0),
                }],
            },
            recent_activities: vec![Activity {
                kind: ActivityKind::InvoiceCreated,
                title: "Invoice #7 created for Ada".to_string(),
                time: Utc.with_ymd_and_hms(2024, 6, 3, 9, 15, 0).unwrap(),
                amount: Some(Decimal::new(1000, 0)),
                currency: Some("USD".to_string()),
            }],
        };

        let output = metrics.display_as_tables("NGN", &FixedOffset::east_opt(0).unwrap());
        assert!(output.contains("1520000.00"));
        assert!(output.contains("1577000.00"));
        assert!(output.contains("25%"));
        assert!(output.contains("Jun 2024"));
        assert!(output.contains("Invoice #7 created for Ada"));
        assert!(output.contains("1000.00 USD"));
        assert!(output.contains("invoice_created"));
    }
}
