//! Managed backend source.
//!
//! Reads the `analytics_reports` table through the backend's REST
//! interface, filtered by user and workspace. One request per run; no
//! retry.

use crate::models::{AnalyticsReport, Scope};
use crate::source::{decode_records, SourceError};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

const SELECT_COLUMNS: &str = "id,report_name,report_type,csv_data,created_at,data_source";

/// Settings for the backend connection.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Project URL, e.g. `https://project.example.co`
    pub base_url: String,
    /// Anon or service key sent as `apikey` and bearer token
    pub api_key: String,
    /// Table holding uploaded reports
    pub table: String,
    pub timeout_seconds: u64,
}

/// Backend client for analytics reports.
#[derive(Debug, Clone)]
pub struct RemoteSource {
    config: RemoteConfig,
    http_client: reqwest::Client,
}

impl RemoteSource {
    /// Create a new backend source.
    pub fn new(config: RemoteConfig) -> Result<Self, SourceError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Base URL without trailing slash.
    pub fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    /// Fetch all reports for the scope, newest first.
    pub async fn fetch(&self, scope: &Scope) -> Result<Vec<AnalyticsReport>, SourceError> {
        let (Some(user_id), Some(workspace_id)) =
            (scope.user_id.as_deref(), scope.workspace_id.as_deref())
        else {
            return Err(SourceError::MissingScope);
        };

        let url = format!("{}/rest/v1/{}", self.base_url(), self.config.table);
        debug!("Fetching reports from {}", url);

        let response = self
            .http_client
            .get(&url)
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
            .query(&[
                ("select", SELECT_COLUMNS.to_string()),
                ("user_id", format!("eq.{}", user_id)),
                ("workspace_id", format!("eq.{}", workspace_id)),
                ("order", "created_at.desc".to_string()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Status { status, body });
        }

        let document: Value = response.json().await?;
        let reports = decode_records(document, &url);
        info!("Backend returned {} reports", reports.len());

        Ok(reports)
    }
}
