//! Previous-period comparison for the dashboard tiles.
//!
//! Two modes exist. `synthetic` derives the previous period as a fixed
//! fraction of the current totals, which is what the dashboard has always
//! shown; those factors are placeholders, not history. `prior-period`
//! compares two real date windows ending at the latest dated row.

use crate::analysis::aggregator::Aggregator;
use crate::models::{AnalyticsReport, ChangeIndicator, Totals, TotalsChange};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How the previous period is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ComparisonMode {
    /// Previous = current × fixed factor per metric
    #[default]
    Synthetic,
    /// Previous = totals of the preceding window of `period_days`
    PriorPeriod,
}

/// Fraction of the current value assumed for the previous period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SyntheticFactors {
    #[serde(default = "default_reach_factor")]
    pub total_reach: f64,
    #[serde(default = "default_engagement_factor")]
    pub engagement: f64,
    #[serde(default = "default_conversions_factor")]
    pub conversions: f64,
    #[serde(default = "default_revenue_factor")]
    pub revenue: f64,
}

impl Default for SyntheticFactors {
    fn default() -> Self {
        Self {
            total_reach: default_reach_factor(),
            engagement: default_engagement_factor(),
            conversions: default_conversions_factor(),
            revenue: default_revenue_factor(),
        }
    }
}

fn default_reach_factor() -> f64 {
    0.85
}

fn default_engagement_factor() -> f64 {
    0.9
}

fn default_conversions_factor() -> f64 {
    0.8
}

fn default_revenue_factor() -> f64 {
    0.75
}

/// Percentage change of `current` against `previous`.
pub fn change_indicator(current: f64, previous: f64) -> ChangeIndicator {
    let percent_change = if previous == 0.0 {
        if current == 0.0 {
            0.0
        } else {
            100.0
        }
    } else {
        (current - previous) / previous * 100.0
    };

    ChangeIndicator {
        percent_change,
        is_positive: percent_change >= 0.0,
    }
}

/// Change indicators from the placeholder factors.
pub fn synthetic_changes(totals: &Totals, factors: &SyntheticFactors) -> TotalsChange {
    let reach = totals.total_reach as f64;
    let engagement = totals.engagement as f64;
    let conversions = totals.conversions as f64;

    TotalsChange {
        total_reach: change_indicator(reach, reach * factors.total_reach),
        engagement: change_indicator(engagement, engagement * factors.engagement),
        conversions: change_indicator(conversions, conversions * factors.conversions),
        revenue: change_indicator(totals.revenue, totals.revenue * factors.revenue),
    }
}

/// Change indicators between two windows.
pub fn totals_change(current: &Totals, previous: &Totals) -> TotalsChange {
    TotalsChange {
        total_reach: change_indicator(current.total_reach as f64, previous.total_reach as f64),
        engagement: change_indicator(current.engagement as f64, previous.engagement as f64),
        conversions: change_indicator(current.conversions as f64, previous.conversions as f64),
        revenue: change_indicator(current.revenue, previous.revenue),
    }
}

/// Comparison settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Comparison {
    pub mode: ComparisonMode,
    pub period_days: u32,
    pub factors: SyntheticFactors,
}

impl Default for Comparison {
    fn default() -> Self {
        Self {
            mode: ComparisonMode::Synthetic,
            period_days: 30,
            factors: SyntheticFactors::default(),
        }
    }
}

impl Comparison {
    /// Compute the change indicators for a report set.
    pub fn changes(
        &self,
        aggregator: &Aggregator,
        reports: &[AnalyticsReport],
        totals: &Totals,
    ) -> TotalsChange {
        match self.mode {
            ComparisonMode::Synthetic => synthetic_changes(totals, &self.factors),
            ComparisonMode::PriorPeriod => {
                let Some(anchor) = aggregator.latest_date(reports) else {
                    debug!("No dated rows; prior-period comparison is flat");
                    return totals_change(&Totals::default(), &Totals::default());
                };
                let span = Days::new(u64::from(self.period_days.max(1)));
                // windows reaching past the calendar start are clamped to it
                let split = anchor.checked_sub_days(span).unwrap_or(NaiveDate::MIN);
                let start = split.checked_sub_days(span).unwrap_or(NaiveDate::MIN);
                let current = aggregator.totals_between(reports, split, anchor);
                let previous = aggregator.totals_between(reports, start, split);
                debug!(
                    "Comparing {}..{} against the preceding {} days",
                    split, anchor, self.period_days
                );
                totals_change(&current, &previous)
            }
        }
    }

    /// Short description for report metadata.
    pub fn describe(&self) -> String {
        match self.mode {
            ComparisonMode::Synthetic => "synthetic (fixed factors, placeholder)".to_string(),
            ComparisonMode::PriorPeriod => format!("prior {} days", self.period_days.max(1)),
        }
    }
}
