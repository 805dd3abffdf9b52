//! Dashboard assembly from a loaded report set.

use crate::analysis::aggregator::Aggregator;
use crate::analysis::comparison::Comparison;
use crate::models::{AnalyticsReport, Dashboard, DashboardMetadata, ReportType, Scope};
use chrono::Utc;
use tracing::info;

/// Options for a dashboard run.
#[derive(Debug, Clone)]
pub struct DashboardOptions {
    /// Scope the reports were loaded for.
    pub scope: Scope,
    /// Rows in the top-content ranking.
    pub top_limit: usize,
    /// Restrict to these platforms; empty means all.
    pub platforms: Vec<ReportType>,
    pub comparison: Comparison,
}

/// Compute every dashboard view from the full report set.
pub fn build_dashboard(
    aggregator: &Aggregator,
    reports: &[AnalyticsReport],
    options: &DashboardOptions,
    load_failures: Vec<String>,
) -> Dashboard {
    let selected: Vec<AnalyticsReport> = if options.platforms.is_empty() {
        reports.to_vec()
    } else {
        reports
            .iter()
            .filter(|r| options.platforms.contains(&r.report_type))
            .cloned()
            .collect()
    };

    let totals = aggregator.aggregate_totals(&selected);
    let changes = options.comparison.changes(aggregator, &selected, &totals);
    let row_count = selected.iter().map(AnalyticsReport::row_count).sum();

    info!(
        "Aggregated {} reports ({} rows): reach {}, engagement {}",
        selected.len(),
        row_count,
        totals.total_reach,
        totals.engagement
    );

    Dashboard {
        metadata: DashboardMetadata {
            generated_at: Utc::now(),
            scope: options.scope.clone(),
            report_count: selected.len(),
            row_count,
            comparison: options.comparison.describe(),
            load_failures,
        },
        totals,
        changes,
        channels: aggregator.channel_breakdown(&selected),
        top_content: aggregator.rank_top_content(&selected, options.top_limit),
        timeline: aggregator.build_timeline(&selected),
    }
}
