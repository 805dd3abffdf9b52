//! Column resolution for loosely-typed CSV rows.
//!
//! Uploaded exports use whatever headers the source platform chose, so every
//! metric is looked up through an ordered list of candidate column names.
//! The lists live in a [`ColumnTable`] that can be overridden from the
//! config file.

use crate::models::{AnalyticsReport, CsvRow, ReportType};
use chrono::{DateTime, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::OnceLock;

/// Column rules for one platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformColumns {
    /// Candidates for reach, first present wins.
    #[serde(default)]
    pub reach: Vec<String>,

    /// Engagement components; each inner list is its own fallback chain
    /// and the resolved components are summed.
    #[serde(default)]
    pub engagement: Vec<Vec<String>>,

    /// Candidates for raw impressions.
    #[serde(default)]
    pub impressions: Vec<String>,

    /// Candidates for conversions (signups).
    #[serde(default)]
    pub conversions: Vec<String>,

    /// Known title columns tried after the generic key scan.
    #[serde(default)]
    pub titles: Vec<String>,

    /// Column whose numeric value stands in for reach when the reach
    /// chain yields nothing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follower_proxy: Option<String>,

    /// Engagement estimate as a fraction of the proxied reach.
    #[serde(default = "default_follower_ratio")]
    pub follower_engagement_ratio: f64,
}

fn default_follower_ratio() -> f64 {
    0.1
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl PlatformColumns {
    fn empty() -> Self {
        Self {
            reach: Vec::new(),
            engagement: Vec::new(),
            impressions: Vec::new(),
            conversions: Vec::new(),
            titles: Vec::new(),
            follower_proxy: None,
            follower_engagement_ratio: default_follower_ratio(),
        }
    }

    /// LinkedIn post analytics export.
    pub fn linkedin() -> Self {
        let reach = names(&[
            "Impressions",
            "impressions",
            "Impressions ",
            "Total impressions",
            "Total Impressions",
        ]);
        Self {
            impressions: reach.clone(),
            reach,
            engagement: vec![
                names(&["Reactions", "reactions", "Likes", "likes"]),
                names(&["Comments", "comments"]),
                names(&["Shares", "shares", "Reposts", "reposts"]),
                names(&["Clicks", "clicks"]),
            ],
            titles: names(&["Post title", "Post Title", "Update", "Commentary", "Post link"]),
            // Numeric header produced by one spreadsheet export; carries new followers.
            follower_proxy: Some("32049".to_string()),
            ..Self::empty()
        }
    }

    /// YouTube studio export.
    pub fn youtube() -> Self {
        Self {
            reach: names(&["Views", "views", "Impressions", "impressions"]),
            engagement: vec![
                names(&["Likes", "likes"]),
                names(&["Comments", "comments", "Comments added"]),
                names(&["Shares", "shares"]),
            ],
            impressions: names(&["Impressions", "impressions"]),
            titles: names(&["Video title", "Video Title", "Video"]),
            ..Self::empty()
        }
    }

    /// Newsletter campaign export.
    pub fn newsletter() -> Self {
        Self {
            reach: names(&[
                "Recipients",
                "recipients",
                "Delivered",
                "delivered",
                "Sent",
                "sent",
            ]),
            engagement: vec![
                names(&["Opens", "opens", "Unique Opens", "Total Opens"]),
                names(&["Clicks", "clicks", "Unique Clicks", "Total Clicks"]),
            ],
            titles: names(&["Subject line", "Subject Line", "Campaign", "Campaign name", "Name"]),
            ..Self::empty()
        }
    }

    /// Lead magnet download export.
    pub fn lead_magnet() -> Self {
        Self {
            reach: names(&["Downloads", "downloads"]),
            conversions: names(&["Email Signups", "Email signups", "signups", "Signups"]),
            titles: names(&["Name", "name", "Lead magnet", "Asset"]),
            ..Self::empty()
        }
    }
}

/// Per-platform column rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnTable {
    #[serde(default = "PlatformColumns::linkedin")]
    pub linkedin: PlatformColumns,
    #[serde(default = "PlatformColumns::youtube")]
    pub youtube: PlatformColumns,
    #[serde(default = "PlatformColumns::newsletter")]
    pub newsletter: PlatformColumns,
    #[serde(default = "PlatformColumns::lead_magnet", rename = "lead-magnet")]
    pub lead_magnet: PlatformColumns,
}

impl Default for ColumnTable {
    fn default() -> Self {
        Self {
            linkedin: PlatformColumns::linkedin(),
            youtube: PlatformColumns::youtube(),
            newsletter: PlatformColumns::newsletter(),
            lead_magnet: PlatformColumns::lead_magnet(),
        }
    }
}

impl ColumnTable {
    /// Rules for a platform.
    pub fn for_platform(&self, platform: ReportType) -> &PlatformColumns {
        match platform {
            ReportType::Linkedin => &self.linkedin,
            ReportType::Youtube => &self.youtube,
            ReportType::Newsletter => &self.newsletter,
            ReportType::LeadMagnet => &self.lead_magnet,
        }
    }
}

/// Metrics resolved from a single row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowMetrics {
    pub reach: u64,
    pub engagement: u64,
    pub impressions: u64,
    pub conversions: u64,
}

impl RowMetrics {
    /// Whether the row contributes to timeline, ranking and totals.
    pub fn qualifies(&self) -> bool {
        self.reach > 0 || self.engagement > 0 || self.impressions > 0
    }

    /// Whether the row counts as a post in the channel breakdown.
    pub fn counts_as_post(&self) -> bool {
        self.reach > 0 || self.engagement > 0
    }
}

/// A row with every column resolved.
#[derive(Debug, Clone)]
pub struct ResolvedRow<'a> {
    pub report: &'a AnalyticsReport,
    pub date: String,
    pub title: String,
    pub metrics: RowMetrics,
}

/// Permissive integer parsing.
///
/// Integers pass through, floats truncate, strings keep their leading
/// integer after dropping thousands separators. Anything else, including
/// negatives, is 0.
pub fn parse_count(value: &Value) -> u64 {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f > 0.0).map(|f| f.trunc() as u64))
            .unwrap_or(0),
        Value::String(s) => parse_count_str(s),
        _ => 0,
    }
}

fn parse_count_str(s: &str) -> u64 {
    let cleaned: String = s.trim().chars().filter(|c| *c != ',').collect();
    let digits = cleaned.strip_prefix('+').unwrap_or(&cleaned);
    if digits.starts_with('-') {
        return 0;
    }
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse().unwrap_or(0)
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

/// First present, non-blank candidate in the chain, parsed.
pub fn lookup_count(row: &CsvRow, candidates: &[String]) -> u64 {
    candidates
        .iter()
        .filter_map(|name| row.get(name))
        .find(|v| !is_blank(v))
        .map(parse_count)
        .unwrap_or(0)
}

/// Resolve reach, engagement, impressions and conversions for a row.
pub fn resolve_metrics(row: &CsvRow, columns: &PlatformColumns) -> RowMetrics {
    let mut metrics = RowMetrics {
        reach: lookup_count(row, &columns.reach),
        engagement: columns
            .engagement
            .iter()
            .map(|chain| lookup_count(row, chain))
            .fold(0u64, u64::saturating_add),
        impressions: lookup_count(row, &columns.impressions),
        conversions: lookup_count(row, &columns.conversions),
    };

    if metrics.reach == 0 {
        if let Some(proxy) = columns.follower_proxy.as_deref() {
            let followers = row.get(proxy).map(parse_count).unwrap_or(0);
            if followers > 0 {
                metrics.reach = followers;
                metrics.engagement =
                    (followers as f64 * columns.follower_engagement_ratio).floor() as u64;
            }
        }
    }

    metrics
}

fn date_value_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\s*(\d{1,2}/\d{1,2}/\d{4}|\d{4}-\d{2}-\d{2})").expect("valid date regex")
    })
}

/// Locate the row's date, falling back to the report's upload date.
pub fn resolve_date(row: &CsvRow, report: &AnalyticsReport) -> String {
    for (key, value) in row {
        let key = key.to_lowercase();
        let key_match = (key.contains("date") || key.contains("time")) && !is_blank(value);
        let value_match = value
            .as_str()
            .is_some_and(|s| date_value_pattern().is_match(s));
        if key_match || value_match {
            return value_text(value);
        }
    }
    report.created_at.format("%Y-%m-%d").to_string()
}

const TITLE_KEYS: [&str; 4] = ["title", "content", "post", "subject"];

/// Locate a human label for the row.
pub fn resolve_title(
    row: &CsvRow,
    index: usize,
    platform: ReportType,
    columns: &PlatformColumns,
) -> String {
    let scanned = row.iter().find_map(|(key, value)| {
        let key = key.to_lowercase();
        let text = value.as_str().map(str::trim).filter(|s| !s.is_empty())?;
        TITLE_KEYS
            .iter()
            .any(|k| key.contains(k))
            .then(|| text.to_string())
    });
    if let Some(title) = scanned {
        return title;
    }

    columns
        .titles
        .iter()
        .filter_map(|name| row.get(name))
        .find(|v| !is_blank(v))
        .map(value_text)
        .unwrap_or_else(|| format!("{} content {}", platform, index + 1))
}

/// Resolve every object row of a report.
pub fn resolve_rows<'a>(
    report: &'a AnalyticsReport,
    table: &'a ColumnTable,
) -> impl Iterator<Item = ResolvedRow<'a>> + 'a {
    let columns = table.for_platform(report.report_type);
    report.rows().map(move |(index, row)| ResolvedRow {
        report,
        date: resolve_date(row, report),
        title: resolve_title(row, index, report.report_type, columns),
        metrics: resolve_metrics(row, columns),
    })
}

/// Parse a resolved date string for ordering and windowing.
///
/// Slash dates are read month-first, then day-first when that fails.
pub fn parse_row_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    let head = raw.split(|c: char| c == 'T' || c == ' ').next().unwrap_or(raw);
    ["%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y", "%Y/%m/%d"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(head, fmt).ok())
        .or_else(|| NaiveDate::parse_from_str(raw, "%b %d, %Y").ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn row(value: Value) -> CsvRow {
        value.as_object().cloned().unwrap()
    }

    fn report(platform: ReportType) -> AnalyticsReport {
        AnalyticsReport {
            id: "r".to_string(),
            report_name: String::new(),
            report_type: platform,
            csv_data: Value::Null,
            created_at: Utc.with_ymd_and_hms(2024, 5, 17, 9, 30, 0).unwrap(),
            data_source: None,
            user_id: None,
            workspace_id: None,
        }
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count(&json!(42)), 42);
        assert_eq!(parse_count(&json!(12.9)), 12);
        assert_eq!(parse_count(&json!("150")), 150);
        assert_eq!(parse_count(&json!(" 1,234 ")), 1234);
        assert_eq!(parse_count(&json!("12.7k")), 12);
        assert_eq!(parse_count(&json!("+7")), 7);
        assert_eq!(parse_count(&json!("-5")), 0);
        assert_eq!(parse_count(&json!(-5)), 0);
        assert_eq!(parse_count(&json!("n/a")), 0);
        assert_eq!(parse_count(&json!(null)), 0);
        assert_eq!(parse_count(&json!(true)), 0);
    }

    #[test]
    fn test_linkedin_metrics() {
        let r = row(json!({
            "Impressions": "150",
            "Reactions": "10",
            "Comments": "5",
            "Shares": "2",
            "Clicks": "3"
        }));
        let m = resolve_metrics(&r, &PlatformColumns::linkedin());
        assert_eq!(m.reach, 150);
        assert_eq!(m.engagement, 20);
        assert_eq!(m.impressions, 150);
    }

    #[test]
    fn test_linkedin_reach_fallback_chain() {
        let r = row(json!({"Total Impressions": "90", "impressions": ""}));
        let m = resolve_metrics(&r, &PlatformColumns::linkedin());
        assert_eq!(m.reach, 90);
    }

    #[test]
    fn test_linkedin_follower_proxy() {
        let r = row(json!({"32049": "42"}));
        let m = resolve_metrics(&r, &PlatformColumns::linkedin());
        assert_eq!(m.reach, 42);
        assert_eq!(m.engagement, 4);
    }

    #[test]
    fn test_follower_proxy_ignored_when_impressions_present() {
        let r = row(json!({"Impressions": "10", "32049": "500"}));
        let m = resolve_metrics(&r, &PlatformColumns::linkedin());
        assert_eq!(m.reach, 10);
        assert_eq!(m.engagement, 0);
    }

    #[test]
    fn test_youtube_and_lead_magnet_metrics() {
        let yt = row(json!({"Views": 1000, "Likes": "50", "Comments": "10"}));
        let m = resolve_metrics(&yt, &PlatformColumns::youtube());
        assert_eq!((m.reach, m.engagement), (1000, 60));

        let lm = row(json!({"Downloads": "10", "Email Signups": "3"}));
        let m = resolve_metrics(&lm, &PlatformColumns::lead_magnet());
        assert_eq!((m.reach, m.engagement, m.conversions), (10, 0, 3));
    }

    #[test]
    fn test_resolve_date_by_key() {
        let r = row(json!({"Post title": "Hello", "Created date": "2024-03-05"}));
        assert_eq!(resolve_date(&r, &report(ReportType::Linkedin)), "2024-03-05");
    }

    #[test]
    fn test_resolve_date_by_value_pattern() {
        let r = row(json!({"Title": "Hello", "When": "3/4/2024", "Views": "5"}));
        assert_eq!(resolve_date(&r, &report(ReportType::Youtube)), "3/4/2024");
    }

    #[test]
    fn test_resolve_date_first_match_wins() {
        let r = row(json!({"Publish time": "2024-01-02", "Date": "2024-09-09"}));
        assert_eq!(resolve_date(&r, &report(ReportType::Youtube)), "2024-01-02");
    }

    #[test]
    fn test_resolve_date_falls_back_to_created_at() {
        let r = row(json!({"Views": "5", "Date": ""}));
        assert_eq!(resolve_date(&r, &report(ReportType::Youtube)), "2024-05-17");
    }

    #[test]
    fn test_resolve_title_scan_and_fallbacks() {
        let cols = PlatformColumns::newsletter();
        let r = row(json!({"Email subject": "Spring launch", "Opens": "4"}));
        assert_eq!(resolve_title(&r, 0, ReportType::Newsletter, &cols), "Spring launch");

        let r = row(json!({"Campaign": "Weekly #12", "Opens": "4"}));
        assert_eq!(resolve_title(&r, 0, ReportType::Newsletter, &cols), "Weekly #12");

        let r = row(json!({"Opens": "4"}));
        assert_eq!(
            resolve_title(&r, 2, ReportType::Newsletter, &cols),
            "newsletter content 3"
        );
    }

    #[test]
    fn test_resolve_title_skips_numeric_values() {
        let cols = PlatformColumns::linkedin();
        let r = row(json!({"Post impressions": 12, "Post title": "Real title"}));
        assert_eq!(resolve_title(&r, 0, ReportType::Linkedin, &cols), "Real title");
    }

    #[test]
    fn test_parse_row_date() {
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day);
        assert_eq!(parse_row_date("2024-03-05"), d(2024, 3, 5));
        assert_eq!(parse_row_date("2024-03-05T10:00:00Z"), d(2024, 3, 5));
        assert_eq!(parse_row_date("2024-03-05 10:00"), d(2024, 3, 5));
        assert_eq!(parse_row_date("3/4/2024"), d(2024, 3, 4));
        assert_eq!(parse_row_date("25/12/2024"), d(2024, 12, 25));
        assert_eq!(parse_row_date("Mar 05, 2024"), d(2024, 3, 5));
        assert_eq!(parse_row_date("12.5"), None);
    }

    #[test]
    fn test_column_table_override_from_toml() {
        let table: ColumnTable = toml::from_str(
            r#"
[youtube]
reach = ["Watch count"]
engagement = [["Thumbs up"]]
"#,
        )
        .unwrap();
        assert_eq!(table.youtube.reach, vec!["Watch count"]);
        assert_eq!(table.linkedin, PlatformColumns::linkedin());

        let r = row(json!({"Watch count": "30", "Thumbs up": "3", "Views": "999"}));
        let m = resolve_metrics(&r, &table.youtube);
        assert_eq!((m.reach, m.engagement), (30, 3));
    }
}
