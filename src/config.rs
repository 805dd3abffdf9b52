//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.pulseboard.toml` files.

use crate::analysis::{
    ColumnTable, Comparison, ComparisonMode, SyntheticFactors, DEFAULT_REVENUE_PER_CONVERSION,
    DEFAULT_TOP_LIMIT,
};
use crate::models::{ReportType, Scope};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default config file name.
pub const CONFIG_FILE: &str = ".pulseboard.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// User/workspace the reports are loaded for.
    #[serde(default)]
    pub scope: Scope,

    /// Where reports come from.
    #[serde(default)]
    pub source: SourceConfig,

    /// Local export scanning.
    #[serde(default)]
    pub scanner: ScannerConfig,

    /// Dashboard computation settings.
    #[serde(default)]
    pub dashboard: DashboardConfig,

    /// Per-platform column rules.
    #[serde(default)]
    pub columns: ColumnTable,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Output file path; defaults by format when unset.
    #[serde(default)]
    pub output: Option<String>,
}

/// Report source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Local export directories.
    #[serde(default)]
    pub directories: Vec<String>,

    /// Backend project URL.
    #[serde(default)]
    pub backend_url: Option<String>,

    /// Backend API key. Prefer PULSEBOARD_API_KEY over storing it here.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Backend table holding reports.
    #[serde(default = "default_table")]
    pub table: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            directories: Vec::new(),
            backend_url: None,
            api_key: None,
            table: default_table(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_table() -> String {
    "analytics_reports".to_string()
}

fn default_timeout() -> u64 {
    30
}

/// Export scanner settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Maximum files to load per directory.
    #[serde(default = "default_max_files")]
    pub max_files: usize,

    /// File extensions to include.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Names to exclude.
    #[serde(default = "default_excludes")]
    pub excludes: Vec<String>,

    /// Maximum file size in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            max_files: default_max_files(),
            extensions: default_extensions(),
            excludes: default_excludes(),
            max_file_size: default_max_file_size(),
        }
    }
}

fn default_max_files() -> usize {
    500
}

fn default_extensions() -> Vec<String> {
    vec!["json", "csv"].into_iter().map(String::from).collect()
}

fn default_excludes() -> Vec<String> {
    vec!["archive", "tmp", "node_modules"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_max_file_size() -> u64 {
    10 * 1024 * 1024 // 10MB
}

/// Dashboard computation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Rows in the top-content ranking.
    #[serde(default = "default_top_limit")]
    pub top_limit: usize,

    /// Placeholder revenue per conversion.
    #[serde(default = "default_revenue_per_conversion")]
    pub revenue_per_conversion: f64,

    /// Platforms to include; empty means all.
    #[serde(default)]
    pub platforms: Vec<ReportType>,

    /// Previous-period comparison mode.
    #[serde(default)]
    pub comparison: ComparisonMode,

    /// Window length for prior-period comparison.
    #[serde(default = "default_period_days")]
    pub period_days: u32,

    /// Factors for synthetic comparison.
    #[serde(default)]
    pub factors: SyntheticFactors,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            top_limit: default_top_limit(),
            revenue_per_conversion: default_revenue_per_conversion(),
            platforms: Vec::new(),
            comparison: ComparisonMode::default(),
            period_days: default_period_days(),
            factors: SyntheticFactors::default(),
        }
    }
}

fn default_top_limit() -> usize {
    DEFAULT_TOP_LIMIT
}

fn default_revenue_per_conversion() -> f64 {
    DEFAULT_REVENUE_PER_CONVERSION
}

fn default_period_days() -> u32 {
    30
}

impl DashboardConfig {
    /// Comparison settings for the aggregator.
    pub fn comparison(&self) -> Comparison {
        Comparison {
            mode: self.comparison,
            period_days: self.period_days,
            factors: self.factors,
        }
    }
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// Only values the CLI actually provides override the file.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        self.source.directories.extend(
            args.dirs
                .iter()
                .map(|d| d.to_string_lossy().to_string()),
        );

        if let Some(ref url) = args.backend_url {
            self.source.backend_url = Some(url.clone());
        }
        if let Some(ref key) = args.api_key {
            self.source.api_key = Some(key.clone());
        }

        let cli_scope = args.scope();
        if cli_scope.user_id.is_some() {
            self.scope.user_id = cli_scope.user_id;
        }
        if cli_scope.workspace_id.is_some() {
            self.scope.workspace_id = cli_scope.workspace_id;
        }

        if !args.platform.is_empty() {
            self.dashboard.platforms = args.platform.clone();
        }
        if let Some(top) = args.top {
            self.dashboard.top_limit = top;
        }
        if let Some(mode) = args.comparison {
            self.dashboard.comparison = mode;
        }
        if let Some(days) = args.period_days {
            self.dashboard.period_days = days;
        }

        if let Some(ref output) = args.output {
            self.general.output = Some(output.to_string_lossy().to_string());
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
