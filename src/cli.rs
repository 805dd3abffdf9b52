//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::analysis::ComparisonMode;
use crate::models::{ReportType, Scope};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Longest accepted prior-period window (about a century).
pub const MAX_PERIOD_DAYS: u32 = 36_500;

/// Pulseboard - content-marketing analytics from CSV exports
///
/// Aggregates LinkedIn, YouTube, newsletter and lead-magnet performance
/// exports into a dashboard: KPI tiles, channel breakdown, top content
/// and a reach/engagement timeline. Markdown/JSON output.
///
/// Examples:
///   pulseboard --dir ./exports
///   pulseboard --backend-url https://project.example.co --user u1 --workspace w1
///   pulseboard --dir ./exports --platform linkedin,youtube --format json
///   pulseboard --dir ./exports --comparison prior-period --period-days 28
///   pulseboard --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Directory of report exports (JSON backend exports, CSV files)
    ///
    /// May be given more than once. Adds to directories from the config file.
    #[arg(short, long = "dir", value_name = "DIR")]
    pub dirs: Vec<PathBuf>,

    /// Backend project URL to load reports from
    #[arg(long, value_name = "URL", env = "PULSEBOARD_BACKEND_URL")]
    pub backend_url: Option<String>,

    /// Backend API key
    #[arg(long, value_name = "KEY", env = "PULSEBOARD_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// User whose reports are loaded
    #[arg(short, long, value_name = "ID")]
    pub user: Option<String>,

    /// Workspace whose reports are loaded
    #[arg(short, long, value_name = "ID")]
    pub workspace: Option<String>,

    /// Only include these platforms (comma-separated)
    ///
    /// Values: linkedin, youtube, newsletter, lead-magnet
    #[arg(long, value_name = "PLATFORMS", value_delimiter = ',')]
    pub platform: Vec<ReportType>,

    /// Number of rows in the top-content ranking
    #[arg(long, value_name = "COUNT")]
    pub top: Option<usize>,

    /// Output file path for the dashboard
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// How the previous period for the change indicators is obtained
    #[arg(long, value_name = "MODE")]
    pub comparison: Option<ComparisonMode>,

    /// Window length in days for prior-period comparison
    #[arg(long, value_name = "DAYS")]
    pub period_days: Option<u32>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .pulseboard.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Dry run: list sources and export files without aggregating
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .pulseboard.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the dashboard.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl OutputFormat {
    /// Default file name for this format.
    pub fn default_output(&self) -> &'static str {
        match self {
            OutputFormat::Markdown => "pulseboard.md",
            OutputFormat::Json => "pulseboard.json",
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Scope given on the command line.
    pub fn scope(&self) -> Scope {
        Scope {
            user_id: self.user.clone(),
            workspace_id: self.workspace.clone(),
        }
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if let Some(ref url) = self.backend_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Backend URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if self.top == Some(0) {
            return Err("Top content count must be at least 1".to_string());
        }

        if let Some(days) = self.period_days {
            if days == 0 {
                return Err("Period must be at least 1 day".to_string());
            }
            if days > MAX_PERIOD_DAYS {
                return Err(format!("Period cannot exceed {} days", MAX_PERIOD_DAYS));
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        for dir in &self.dirs {
            if !dir.exists() {
                return Err(format!("Report directory does not exist: {}", dir.display()));
            }
            if !dir.is_dir() {
                return Err(format!("Report path is not a directory: {}", dir.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            dirs: Vec::new(),
            backend_url: Some("https://project.example.co".to_string()),
            api_key: None,
            user: Some("u1".to_string()),
            workspace: Some("w1".to_string()),
            platform: Vec::new(),
            top: None,
            output: None,
            format: OutputFormat::Markdown,
            comparison: None,
            period_days: None,
            config: None,
            verbose: false,
            quiet: false,
            dry_run: false,
            init_config: false,
        }
    }

    #[test]
    fn test_parse_flags() {
        let args = Args::try_parse_from([
            "pulseboard",
            "--platform",
            "linkedin,lead-magnet",
            "--comparison",
            "prior-period",
            "--format",
            "json",
            "--top",
            "5",
        ])
        .unwrap();

        assert_eq!(args.platform, vec![ReportType::Linkedin, ReportType::LeadMagnet]);
        assert_eq!(args.comparison, Some(ComparisonMode::PriorPeriod));
        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(args.top, Some(5));
    }

    #[test]
    fn test_unknown_platform_rejected() {
        assert!(Args::try_parse_from(["pulseboard", "--platform", "tiktok"]).is_err());
    }

    #[test]
    fn test_validation_invalid_url() {
        let mut args = make_args();
        args.backend_url = Some("project.example.co".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_zero_values() {
        let mut args = make_args();
        args.top = Some(0);
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.period_days = Some(0);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_period_upper_bound() {
        let mut args = make_args();
        args.period_days = Some(MAX_PERIOD_DAYS);
        assert!(args.validate().is_ok());

        args.period_days = Some(200_000_000);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_missing_dir() {
        let mut args = make_args();
        args.dirs = vec![PathBuf::from("/definitely/not/here")];
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }

    #[test]
    fn test_scope_from_args() {
        let args = make_args();
        let scope = args.scope();
        assert_eq!(scope.user_id.as_deref(), Some("u1"));
        assert_eq!(scope.workspace_id.as_deref(), Some("w1"));
    }
}
