//! Markdown and JSON dashboard generation.
//!
//! Renders the computed [`Dashboard`] as a Markdown document with KPI
//! tiles, channel breakdown, top content and timeline tables, or as
//! pretty-printed JSON.

use crate::models::{
    ChangeIndicator, ChannelTotals, ChartPoint, ContentRanking, Dashboard, DashboardMetadata,
    ReportType, Totals, TotalsChange,
};
use anyhow::Result;
use std::collections::BTreeMap;

/// Generate a complete Markdown dashboard.
pub fn generate_markdown_report(dashboard: &Dashboard) -> String {
    let mut output = String::new();

    output.push_str("# Content Performance Dashboard\n\n");
    output.push_str(&generate_metadata_section(&dashboard.metadata));
    output.push_str(&generate_tiles_section(&dashboard.totals, &dashboard.changes));
    output.push_str(&generate_channels_section(&dashboard.channels));
    output.push_str(&generate_top_content_section(&dashboard.top_content));
    output.push_str(&generate_timeline_section(&dashboard.timeline));
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &DashboardMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Scope:** {}\n", metadata.scope));
    section.push_str(&format!("- **Reports:** {}\n", metadata.report_count));
    section.push_str(&format!("- **Rows:** {}\n", metadata.row_count));
    section.push_str(&format!("- **Comparison:** {}\n", metadata.comparison));
    section.push('\n');

    if !metadata.load_failures.is_empty() {
        for failure in &metadata.load_failures {
            section.push_str(&format!("> ⚠️ {}\n", failure));
        }
        section.push('\n');
    }

    section
}

fn format_change(change: &ChangeIndicator) -> String {
    let sign = if change.percent_change >= 0.0 { "+" } else { "" };
    format!("{} {}{:.1}%", change.arrow(), sign, change.percent_change)
}

/// Generate the KPI tiles section.
fn generate_tiles_section(totals: &Totals, changes: &TotalsChange) -> String {
    let mut section = String::new();

    section.push_str("## Overview\n\n");
    section.push_str("| Total Reach | Engagement | Conversions | Revenue |\n");
    section.push_str("|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| **{}** | **{}** | **{}** | **${:.2}** |\n",
        totals.total_reach, totals.engagement, totals.conversions, totals.revenue
    ));
    section.push_str(&format!(
        "| {} | {} | {} | {} |\n\n",
        format_change(&changes.total_reach),
        format_change(&changes.engagement),
        format_change(&changes.conversions),
        format_change(&changes.revenue)
    ));

    section
}

/// Generate the channel breakdown section.
fn generate_channels_section(channels: &BTreeMap<ReportType, ChannelTotals>) -> String {
    let mut section = String::new();

    section.push_str("## Channel Breakdown\n\n");

    if channels.is_empty() {
        section.push_str("No channel data yet. Upload a CSV export to get started.\n\n");
        return section;
    }

    section.push_str("| Channel | Reach | Engagement | Posts | Engagement Rate |\n");
    section.push_str("|:---|---:|---:|---:|---:|\n");

    for (platform, totals) in channels {
        section.push_str(&format!(
            "| {} | {} | {} | {} | {}% |\n",
            platform.label(),
            totals.reach,
            totals.engagement,
            totals.posts,
            crate::analysis::aggregator::engagement_rate(totals.engagement, totals.reach)
        ));
    }
    section.push('\n');

    section
}

/// Generate the top content section.
fn generate_top_content_section(top: &[ContentRanking]) -> String {
    let mut section = String::new();

    section.push_str("## Top Content\n\n");

    if top.is_empty() {
        section.push_str("No content with recorded reach or engagement.\n\n");
        return section;
    }

    section.push_str("| # | Title | Channel | Reach | Engagement | Rate | Date |\n");
    section.push_str("|:---:|:---|:---|---:|---:|---:|:---|\n");

    for (i, item) in top.iter().enumerate() {
        section.push_str(&format!(
            "| {} | {} | {} | {} | {} | {}% | {} |\n",
            i + 1,
            escape_cell(&item.title),
            item.platform.label(),
            item.reach,
            item.engagement,
            item.engagement_rate,
            escape_cell(&item.date)
        ));
    }
    section.push('\n');

    section
}

/// Generate the timeline section.
fn generate_timeline_section(timeline: &[ChartPoint]) -> String {
    let mut section = String::new();

    section.push_str("## Timeline\n\n");

    if timeline.is_empty() {
        section.push_str("No dated activity.\n\n");
        return section;
    }

    section.push_str("| Date | Channel | Reach | Engagement |\n");
    section.push_str("|:---|:---|---:|---:|\n");

    for point in timeline {
        section.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            escape_cell(&point.date),
            point.platform.label(),
            point.reach,
            point.engagement
        ));
    }
    section.push('\n');

    section
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(&format!(
        "*Dashboard generated by pulseboard v{}*\n",
        env!("CARGO_PKG_VERSION")
    ));

    footer
}

/// Generate a JSON dashboard.
pub fn generate_json_report(dashboard: &Dashboard) -> Result<String> {
    serde_json::to_string_pretty(dashboard).map_err(Into::into)
}
