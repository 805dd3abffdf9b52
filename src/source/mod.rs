//! Report sources.
//!
//! Loaders that produce [`AnalyticsReport`] records: a local directory of
//! backend JSON exports and raw CSV files, and the managed backend's REST
//! interface. Every load takes an explicit [`Scope`].

pub mod local;
pub mod remote;

pub use local::{LocalSource, ScanConfig};
pub use remote::{RemoteConfig, RemoteSource};

use crate::models::{AnalyticsReport, Scope};
use futures::future::join_all;
use serde_json::Value;
use std::collections::HashSet;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{error, info, warn};

/// Errors raised while loading reports.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("backend queries need both a user and a workspace id")]
    MissingScope,
}

impl SourceError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SourceError::Io {
            path: path.into(),
            source,
        }
    }
}

/// A configured place to load reports from.
#[derive(Debug)]
pub enum ReportSource {
    Local(LocalSource),
    Remote(RemoteSource),
}

impl ReportSource {
    /// Human-readable origin for logs and notices.
    pub fn describe(&self) -> String {
        match self {
            ReportSource::Local(local) => format!("directory {}", local.root().display()),
            ReportSource::Remote(remote) => format!("backend {}", remote.base_url()),
        }
    }

    /// Load every report this source holds for the scope.
    pub async fn load(&self, scope: &Scope) -> Result<Vec<AnalyticsReport>, SourceError> {
        match self {
            ReportSource::Local(local) => local.load(scope),
            ReportSource::Remote(remote) => remote.fetch(scope).await,
        }
    }
}

/// Result of loading from every configured source.
#[derive(Debug, Default)]
pub struct LoadOutcome {
    /// Reports from all sources that succeeded, first occurrence of an id wins.
    pub reports: Vec<AnalyticsReport>,
    /// One user-facing notice per failed source.
    pub failures: Vec<String>,
    /// Number of sources that loaded successfully.
    pub sources_ok: usize,
}

impl LoadOutcome {
    /// Whether at least one source was configured and none succeeded.
    pub fn all_failed(&self) -> bool {
        self.sources_ok == 0 && !self.failures.is_empty()
    }
}

/// Load from all sources concurrently.
///
/// A failing source is logged and recorded; the others still contribute.
pub async fn load_all(sources: &[ReportSource], scope: &Scope) -> LoadOutcome {
    let results = join_all(sources.iter().map(|source| source.load(scope))).await;

    let mut outcome = LoadOutcome::default();
    let mut seen: HashSet<String> = HashSet::new();

    for (source, result) in sources.iter().zip(results) {
        match result {
            Ok(reports) => {
                info!("Loaded {} reports from {}", reports.len(), source.describe());
                outcome.sources_ok += 1;
                for report in reports {
                    if seen.insert(report.id.clone()) {
                        outcome.reports.push(report);
                    }
                }
            }
            Err(e) => {
                error!("Failed to load reports from {}: {}", source.describe(), e);
                outcome.failures.push(format!(
                    "Failed to load analytics reports from {}: {}",
                    source.describe(),
                    e
                ));
            }
        }
    }

    outcome
}

/// Decode backend-shaped records from a JSON document.
///
/// Accepts a single record or an array. Records that do not decode (for
/// example an unknown `report_type`) are skipped with a warning.
pub fn decode_records(document: Value, origin: &str) -> Vec<AnalyticsReport> {
    let items = match document {
        Value::Array(items) => items,
        other => vec![other],
    };

    items
        .into_iter()
        .enumerate()
        .filter_map(|(i, item)| match serde_json::from_value::<AnalyticsReport>(item) {
            Ok(report) => Some(report),
            Err(e) => {
                warn!("Skipping record {} in {}: {}", i, origin, e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReportType;
    use serde_json::json;
    use tempfile::TempDir;

    fn local(dir: &std::path::Path) -> ReportSource {
        ReportSource::Local(LocalSource::new(dir.to_path_buf(), ScanConfig::default()))
    }

    #[test]
    fn test_decode_records_skips_bad_entries() {
        let doc = json!([
            {"id": "a", "report_type": "youtube", "csv_data": [], "created_at": "2024-01-01T00:00:00Z"},
            {"id": "b", "report_type": "tiktok", "csv_data": [], "created_at": "2024-01-01T00:00:00Z"},
            {"id": "c", "report_type": "linkedin"}
        ]);
        let reports = decode_records(doc, "test");
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].report_type, ReportType::Youtube);
    }

    #[test]
    fn test_decode_single_record() {
        let doc = json!({"id": "x", "report_type": "newsletter", "created_at": "2024-01-01T00:00:00Z"});
        let reports = decode_records(doc, "test");
        assert_eq!(reports.len(), 1);
        assert!(reports[0].csv_data.is_null());
    }

    #[test]
    fn test_load_all_keeps_going_after_failure() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("export.json"),
            r#"[{"id": "r1", "report_type": "youtube", "csv_data": [{"Views": "5"}], "created_at": "2024-01-01T00:00:00Z"}]"#,
        )
        .unwrap();

        let sources = vec![
            local(dir.path()),
            local(&dir.path().join("missing")),
        ];
        let outcome = tokio_test::block_on(load_all(&sources, &Scope::default()));

        assert_eq!(outcome.reports.len(), 1);
        assert_eq!(outcome.sources_ok, 1);
        assert_eq!(outcome.failures.len(), 1);
        assert!(outcome.failures[0].starts_with("Failed to load analytics reports"));
        assert!(!outcome.all_failed());
    }

    #[test]
    fn test_load_all_dedupes_by_id() {
        let dir = TempDir::new().unwrap();
        let record = r#"{"id": "same", "report_type": "linkedin", "csv_data": [], "created_at": "2024-01-01T00:00:00Z"}"#;
        std::fs::write(dir.path().join("a.json"), record).unwrap();
        std::fs::write(dir.path().join("b.json"), record).unwrap();

        let outcome = tokio_test::block_on(load_all(&[local(dir.path())], &Scope::default()));
        assert_eq!(outcome.reports.len(), 1);
    }

    #[test]
    fn test_all_failed() {
        let dir = TempDir::new().unwrap();
        let sources = vec![local(&dir.path().join("nope"))];
        let outcome = tokio_test::block_on(load_all(&sources, &Scope::default()));
        assert!(outcome.all_failed());
        assert!(!LoadOutcome::default().all_failed());
    }
}
