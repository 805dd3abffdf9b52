//! Report aggregation.
//!
//! Turns heterogeneous CSV rows into uniform reach/engagement numbers and
//! builds the timeline, top-content ranking, channel breakdown and global
//! totals. Every view is recomputed from the full report set on each call.

use crate::analysis::columns::{parse_row_date, resolve_rows, ColumnTable, ResolvedRow};
use crate::models::{AnalyticsReport, ChannelTotals, ChartPoint, ContentRanking, ReportType, Totals};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::debug;

/// Maximum title length in the ranking before truncation.
pub const MAX_TITLE_CHARS: usize = 50;

/// Default number of rows in the top-content ranking.
pub const DEFAULT_TOP_LIMIT: usize = 10;

/// Placeholder revenue attributed to each conversion.
pub const DEFAULT_REVENUE_PER_CONVERSION: f64 = 150.0;

/// Aggregates analytics reports into dashboard views.
#[derive(Debug, Clone)]
pub struct Aggregator {
    columns: ColumnTable,
    revenue_per_conversion: f64,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(ColumnTable::default(), DEFAULT_REVENUE_PER_CONVERSION)
    }
}

impl Aggregator {
    /// Create an aggregator with the given column rules.
    pub fn new(columns: ColumnTable, revenue_per_conversion: f64) -> Self {
        Self {
            columns,
            revenue_per_conversion,
        }
    }

    /// Resolve every object row across all reports, in encounter order.
    pub fn rows<'a>(
        &'a self,
        reports: &'a [AnalyticsReport],
    ) -> impl Iterator<Item = ResolvedRow<'a>> + 'a {
        reports
            .iter()
            .flat_map(move |report| resolve_rows(report, &self.columns))
    }

    fn qualifying_rows<'a>(
        &'a self,
        reports: &'a [AnalyticsReport],
    ) -> impl Iterator<Item = ResolvedRow<'a>> + 'a {
        self.rows(reports).filter(|row| row.metrics.qualifies())
    }

    /// One point per qualifying row, ascending by date.
    ///
    /// Dates that do not parse sort after all others; ties keep encounter order.
    pub fn build_timeline(&self, reports: &[AnalyticsReport]) -> Vec<ChartPoint> {
        let mut points: Vec<(Option<NaiveDate>, ChartPoint)> = self
            .qualifying_rows(reports)
            .map(|row| {
                let point = ChartPoint {
                    date: row.date,
                    reach: row.metrics.reach,
                    engagement: row.metrics.engagement,
                    platform: row.report.report_type,
                };
                (parse_row_date(&point.date), point)
            })
            .collect();

        points.sort_by_key(|(date, _)| (date.is_none(), *date));
        debug!("Built timeline with {} points", points.len());

        points.into_iter().map(|(_, point)| point).collect()
    }

    /// Top rows by engagement, highest first.
    pub fn rank_top_content(&self, reports: &[AnalyticsReport], limit: usize) -> Vec<ContentRanking> {
        let mut ranked: Vec<ContentRanking> = self
            .qualifying_rows(reports)
            .map(|row| ContentRanking {
                title: truncate_title(&row.title),
                platform: row.report.report_type,
                reach: row.metrics.reach,
                engagement: row.metrics.engagement,
                engagement_rate: engagement_rate(row.metrics.engagement, row.metrics.reach),
                date: row.date,
            })
            .collect();

        // stable: equal engagement keeps encounter order
        ranked.sort_by(|a, b| b.engagement.cmp(&a.engagement));
        ranked.truncate(limit);
        ranked
    }

    /// Reach, engagement and post count per platform.
    pub fn channel_breakdown(
        &self,
        reports: &[AnalyticsReport],
    ) -> BTreeMap<ReportType, ChannelTotals> {
        let mut channels: BTreeMap<ReportType, ChannelTotals> = BTreeMap::new();

        for row in self.qualifying_rows(reports) {
            let entry = channels.entry(row.report.report_type).or_default();
            entry.reach = entry.reach.saturating_add(row.metrics.reach);
            entry.engagement = entry.engagement.saturating_add(row.metrics.engagement);
            if row.metrics.counts_as_post() {
                entry.posts = entry.posts.saturating_add(1);
            }
        }

        channels
    }

    /// Global totals for the dashboard tiles.
    pub fn aggregate_totals(&self, reports: &[AnalyticsReport]) -> Totals {
        self.totals_where(reports, |_| true)
    }

    /// Totals over rows whose parsed date lies in `(start, end]`.
    ///
    /// Rows without a parsable date are left out.
    pub fn totals_between(
        &self,
        reports: &[AnalyticsReport],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Totals {
        self.totals_where(reports, |row| {
            parse_row_date(&row.date).is_some_and(|d| d > start && d <= end)
        })
    }

    fn totals_where<F>(&self, reports: &[AnalyticsReport], include: F) -> Totals
    where
        F: Fn(&ResolvedRow<'_>) -> bool,
    {
        let mut totals = Totals::default();

        for row in self.rows(reports).filter(|row| include(row)) {
            // conversions count even on rows with no reach
            totals.conversions = totals.conversions.saturating_add(row.metrics.conversions);
            if row.metrics.qualifies() {
                totals.total_reach = totals.total_reach.saturating_add(row.metrics.reach);
                totals.engagement = totals.engagement.saturating_add(row.metrics.engagement);
            }
        }

        totals.revenue = totals.conversions as f64 * self.revenue_per_conversion;
        totals
    }

    /// Latest parsable date across qualifying rows.
    pub fn latest_date(&self, reports: &[AnalyticsReport]) -> Option<NaiveDate> {
        self.qualifying_rows(reports)
            .filter_map(|row| parse_row_date(&row.date))
            .max()
    }
}

/// Engagement as a percentage of reach, two decimals.
pub fn engagement_rate(engagement: u64, reach: u64) -> String {
    let rate = if reach > 0 {
        engagement as f64 / reach as f64 * 100.0
    } else {
        0.0
    };
    format!("{:.2}", rate)
}

/// Cut a title to [`MAX_TITLE_CHARS`] characters plus an ellipsis.
pub fn truncate_title(title: &str) -> String {
    if title.chars().count() > MAX_TITLE_CHARS {
        let cut: String = title.chars().take(MAX_TITLE_CHARS).collect();
        format!("{}...", cut)
    } else {
        title.to_string()
    }
}
