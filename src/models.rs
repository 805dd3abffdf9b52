//! Data models for the analytics dashboard.
//!
//! This module contains the report records loaded from sources and the
//! derived structures produced by the aggregator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Platform tag of an analytics report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportType {
    /// LinkedIn post analytics export
    Linkedin,
    /// YouTube studio export
    Youtube,
    /// Email newsletter campaign export
    Newsletter,
    /// Lead magnet download/signup export
    LeadMagnet,
}

impl ReportType {
    /// All known platform tags, in display order.
    pub const ALL: [ReportType; 4] = [
        ReportType::Linkedin,
        ReportType::Youtube,
        ReportType::Newsletter,
        ReportType::LeadMagnet,
    ];

    /// Returns the wire tag (`linkedin`, `lead-magnet`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::Linkedin => "linkedin",
            ReportType::Youtube => "youtube",
            ReportType::Newsletter => "newsletter",
            ReportType::LeadMagnet => "lead-magnet",
        }
    }

    /// Returns a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            ReportType::Linkedin => "LinkedIn",
            ReportType::Youtube => "YouTube",
            ReportType::Newsletter => "Newsletter",
            ReportType::LeadMagnet => "Lead Magnet",
        }
    }

    /// Guess the platform from a file name such as `linkedin_march.csv`.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let lower = name.to_lowercase();
        if lower.contains("lead-magnet") || lower.contains("lead_magnet") || lower.contains("leadmagnet") {
            return Some(ReportType::LeadMagnet);
        }
        ReportType::ALL
            .into_iter()
            .filter(|t| *t != ReportType::LeadMagnet)
            .find(|t| lower.contains(t.as_str()))
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ReportType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "linkedin" => Ok(ReportType::Linkedin),
            "youtube" => Ok(ReportType::Youtube),
            "newsletter" => Ok(ReportType::Newsletter),
            "lead-magnet" | "lead_magnet" | "leadmagnet" => Ok(ReportType::LeadMagnet),
            other => Err(format!("unknown report type: {}", other)),
        }
    }
}

/// One loosely-typed CSV row: column header to value.
pub type CsvRow = Map<String, Value>;

/// An uploaded analytics report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsReport {
    /// Opaque identifier.
    pub id: String,
    /// Human label given at upload time.
    #[serde(default)]
    pub report_name: String,
    /// Platform tag; selects the column rules.
    pub report_type: ReportType,
    /// Raw rows as uploaded. Not guaranteed to be an array of objects.
    #[serde(default)]
    pub csv_data: Value,
    /// Upload timestamp, used as the fallback row date.
    pub created_at: DateTime<Utc>,
    /// Free-form provenance (e.g. `csv`, `manual`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_source: Option<String>,
    /// Owning user, when the record carries one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Owning workspace, when the record carries one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<String>,
}

impl AnalyticsReport {
    /// Iterate the object rows with their index in the original array.
    ///
    /// Non-object entries are skipped but still consume an index.
    pub fn rows(&self) -> impl Iterator<Item = (usize, &CsvRow)> {
        self.csv_data
            .as_array()
            .into_iter()
            .flatten()
            .enumerate()
            .filter_map(|(i, v)| v.as_object().map(|row| (i, row)))
    }

    /// Number of entries in `csv_data`, malformed ones included.
    pub fn row_count(&self) -> usize {
        self.csv_data.as_array().map_or(0, Vec::len)
    }
}

/// Explicit user/workspace scope for loading reports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    /// Owning user identifier.
    #[serde(default)]
    pub user_id: Option<String>,
    /// Workspace identifier.
    #[serde(default)]
    pub workspace_id: Option<String>,
}

impl Scope {
    /// Whether a record with the given owners falls inside this scope.
    ///
    /// Missing values on either side do not exclude the record.
    pub fn admits(&self, user_id: Option<&str>, workspace_id: Option<&str>) -> bool {
        fn matches(want: Option<&String>, have: Option<&str>) -> bool {
            match (want, have) {
                (Some(want), Some(have)) => want == have,
                _ => true,
            }
        }
        matches(self.user_id.as_ref(), user_id) && matches(self.workspace_id.as_ref(), workspace_id)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "user {} / workspace {}",
            self.user_id.as_deref().unwrap_or("*"),
            self.workspace_id.as_deref().unwrap_or("*")
        )
    }
}

/// One point of the reach/engagement timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub date: String,
    pub reach: u64,
    pub engagement: u64,
    pub platform: ReportType,
}

/// A row in the top-content ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRanking {
    pub title: String,
    pub platform: ReportType,
    pub reach: u64,
    pub engagement: u64,
    /// Engagement over reach as a percentage, two decimals.
    pub engagement_rate: String,
    pub date: String,
}

/// Accumulated metrics for one platform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelTotals {
    pub reach: u64,
    pub engagement: u64,
    /// Rows with non-zero reach or engagement.
    pub posts: u64,
}

/// Global totals shown on the dashboard tiles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub total_reach: u64,
    pub engagement: u64,
    pub conversions: u64,
    pub revenue: f64,
}

/// Change of a metric relative to a previous period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChangeIndicator {
    pub percent_change: f64,
    pub is_positive: bool,
}

impl ChangeIndicator {
    /// Arrow glyph for display.
    pub fn arrow(&self) -> &'static str {
        if self.is_positive {
            "▲"
        } else {
            "▼"
        }
    }
}

/// Change indicators for every dashboard tile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TotalsChange {
    pub total_reach: ChangeIndicator,
    pub engagement: ChangeIndicator,
    pub conversions: ChangeIndicator,
    pub revenue: ChangeIndicator,
}

/// Metadata about a dashboard run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardMetadata {
    /// When the dashboard was computed.
    pub generated_at: DateTime<Utc>,
    /// Scope the reports were loaded for.
    pub scope: Scope,
    /// Number of reports aggregated.
    pub report_count: usize,
    /// Number of CSV rows across those reports.
    pub row_count: usize,
    /// How the previous-period comparison was computed.
    pub comparison: String,
    /// User-facing notices for sources that failed to load.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub load_failures: Vec<String>,
}

/// The complete computed dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dashboard {
    pub metadata: DashboardMetadata,
    pub totals: Totals,
    pub changes: TotalsChange,
    pub channels: BTreeMap<ReportType, ChannelTotals>,
    pub top_content: Vec<ContentRanking>,
    pub timeline: Vec<ChartPoint>,
}
