//! Local export directory source.
//!
//! Walks a directory for backend JSON exports and raw CSV exports,
//! respecting the configured extensions, excludes and size limits.

use crate::models::{AnalyticsReport, ReportType, Scope};
use crate::source::{decode_records, SourceError};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Configuration for export scanning.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// File extensions to include (e.g., ["json", "csv"])
    pub extensions: Vec<String>,
    /// Names to exclude (e.g., ["archive", "tmp"])
    pub excludes: Vec<String>,
    /// Maximum file size in bytes
    pub max_file_size: u64,
    /// Maximum number of files to load
    pub max_files: Option<usize>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["json".to_string(), "csv".to_string()],
            excludes: vec!["archive".to_string(), "tmp".to_string()],
            max_file_size: 10 * 1024 * 1024, // 10MB
            max_files: None,
        }
    }
}

impl From<&crate::config::ScannerConfig> for ScanConfig {
    fn from(config: &crate::config::ScannerConfig) -> Self {
        Self {
            extensions: config.extensions.clone(),
            excludes: config.excludes.clone(),
            max_file_size: config.max_file_size,
            max_files: Some(config.max_files),
        }
    }
}

/// Export file discovered by the scan.
#[derive(Debug, Clone)]
pub struct ScannedFile {
    /// Absolute path
    pub path: PathBuf,
    /// Path relative to the scan root
    pub relative: String,
    /// File size in bytes
    pub size: u64,
}

/// Loads reports from a directory of exports.
#[derive(Debug, Clone)]
pub struct LocalSource {
    root: PathBuf,
    config: ScanConfig,
}

impl LocalSource {
    /// Create a new local source.
    pub fn new(root: PathBuf, config: ScanConfig) -> Self {
        Self { root, config }
    }

    /// The directory being scanned.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Find all matching export files, sorted by relative path.
    pub fn scan(&self) -> Result<Vec<ScannedFile>, SourceError> {
        let mut files = Vec::new();

        let walker = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !self.is_excluded(&e.file_name().to_string_lossy()));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => return Err(e.into()),
                Err(e) => {
                    debug!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            if let Some(max) = self.config.max_files {
                if files.len() >= max {
                    debug!("Reached max_files limit of {}", max);
                    break;
                }
            }

            if !entry.file_type().is_file() || !self.matches(entry.path()) {
                continue;
            }

            let size = match entry.metadata() {
                Ok(metadata) => metadata.len(),
                Err(e) => {
                    debug!("Cannot stat {}: {}", entry.path().display(), e);
                    continue;
                }
            };
            if size > self.config.max_file_size {
                warn!(
                    "Skipping {} ({} bytes exceeds limit)",
                    entry.path().display(),
                    size
                );
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(&self.root)
                .unwrap_or(entry.path())
                .to_string_lossy()
                .to_string();

            files.push(ScannedFile {
                path: entry.path().to_path_buf(),
                relative,
                size,
            });
        }

        Ok(files)
    }

    /// Load every report in the directory that falls inside the scope.
    ///
    /// Unreadable or malformed files are skipped with a warning.
    pub fn load(&self, scope: &Scope) -> Result<Vec<AnalyticsReport>, SourceError> {
        let files = self.scan()?;
        debug!("Found {} export files under {}", files.len(), self.root.display());

        let mut reports = Vec::new();
        for file in &files {
            match self.load_file(file) {
                Ok(loaded) => reports.extend(loaded.into_iter().filter(|r| {
                    scope.admits(r.user_id.as_deref(), r.workspace_id.as_deref())
                })),
                Err(e) => warn!("Failed to read {}: {}", file.relative, e),
            }
        }

        Ok(reports)
    }

    fn load_file(&self, file: &ScannedFile) -> Result<Vec<AnalyticsReport>, SourceError> {
        let ext = extension_of(&file.path);

        if ext == "csv" {
            let Some(report_type) = file
                .path
                .file_name()
                .and_then(|n| ReportType::from_file_name(&n.to_string_lossy()))
            else {
                warn!(
                    "Cannot infer platform for {}; name it after linkedin, youtube, newsletter or lead-magnet",
                    file.relative
                );
                return Ok(Vec::new());
            };

            let handle = fs::File::open(&file.path).map_err(|e| SourceError::io(&file.path, e))?;
            let rows = parse_csv_rows(handle)?;
            let created_at = fs::metadata(&file.path)
                .and_then(|m| m.modified())
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());
            let report_name = file
                .path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();

            return Ok(vec![AnalyticsReport {
                id: file.relative.clone(),
                report_name,
                report_type,
                csv_data: Value::Array(rows),
                created_at,
                data_source: Some("csv".to_string()),
                user_id: None,
                workspace_id: None,
            }]);
        }

        let content = fs::read_to_string(&file.path).map_err(|e| SourceError::io(&file.path, e))?;
        let document: Value = serde_json::from_str(&content)?;
        Ok(decode_records(document, &file.relative))
    }

    /// Check if a file matches scan criteria.
    fn matches(&self, path: &Path) -> bool {
        let ext = extension_of(path);
        self.config.extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext))
    }

    /// Check if a name matches exclusion patterns.
    fn is_excluded(&self, name: &str) -> bool {
        // Hidden files
        if name.starts_with('.') {
            return true;
        }

        self.config.excludes.iter().any(|pattern| name == pattern)
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

/// Parse a CSV export into header → value row objects.
///
/// Headers are kept verbatim (trailing spaces included); short rows only
/// fill the columns they have.
pub fn parse_csv_rows<R: Read>(reader: R) -> Result<Vec<Value>, SourceError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| {
            if i == 0 {
                h.trim_start_matches('\u{feff}').to_string()
            } else {
                h.to_string()
            }
        })
        .collect();

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let mut row = Map::new();
        for (header, value) in headers.iter().zip(record.iter()) {
            if header.is_empty() {
                continue;
            }
            row.insert(header.clone(), Value::String(value.to_string()));
        }
        rows.push(Value::Object(row));
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures").join("reports")
    }

    #[test]
    fn test_parse_csv_rows() {
        let data = "\u{feff}Date,Impressions ,Reactions\n2024-03-01,150,10\n2024-03-02,90\n";
        let rows = parse_csv_rows(data.as_bytes()).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["Date"], "2024-03-01");
        assert_eq!(rows[0]["Impressions "], "150");
        assert_eq!(rows[1].as_object().unwrap().len(), 2);
    }

    #[test]
    fn test_scan_respects_extensions_and_excludes() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("youtube.csv"), "Views\n1\n").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignore me").unwrap();
        std::fs::write(dir.path().join(".hidden.json"), "{}").unwrap();
        std::fs::create_dir(dir.path().join("archive")).unwrap();
        std::fs::write(dir.path().join("archive").join("old.json"), "{}").unwrap();
        std::fs::create_dir(dir.path().join("q1")).unwrap();
        std::fs::write(dir.path().join("q1").join("linkedin.csv"), "Impressions\n5\n").unwrap();

        let source = LocalSource::new(dir.path().to_path_buf(), ScanConfig::default());
        let files = source.scan().unwrap();
        let names: Vec<_> = files.iter().map(|f| f.relative.replace('\\', "/")).collect();

        assert_eq!(names, vec!["q1/linkedin.csv", "youtube.csv"]);
    }

    #[test]
    fn test_scan_max_files_and_size() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a_youtube.csv"), "Views\n1\n").unwrap();
        std::fs::write(dir.path().join("b_youtube.csv"), "Views\n2\n").unwrap();
        std::fs::write(dir.path().join("c_youtube.csv"), "Views\n3\n").unwrap();

        let config = ScanConfig {
            max_files: Some(2),
            ..ScanConfig::default()
        };
        let source = LocalSource::new(dir.path().to_path_buf(), config);
        assert_eq!(source.scan().unwrap().len(), 2);

        let config = ScanConfig {
            max_file_size: 4,
            ..ScanConfig::default()
        };
        let source = LocalSource::new(dir.path().to_path_buf(), config);
        assert!(source.scan().unwrap().is_empty());
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = TempDir::new().unwrap();
        let source = LocalSource::new(dir.path().join("absent"), ScanConfig::default());
        assert!(source.load(&Scope::default()).is_err());
    }

    #[test]
    fn test_csv_without_platform_is_skipped() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("export.csv"), "Views\n10\n").unwrap();
        std::fs::write(dir.path().join("broken.json"), "{ not json").unwrap();

        let source = LocalSource::new(dir.path().to_path_buf(), ScanConfig::default());
        assert!(source.load(&Scope::default()).unwrap().is_empty());
    }

    #[test]
    fn test_load_fixture_directory() {
        let source = LocalSource::new(fixtures_dir(), ScanConfig::default());
        let reports = source.load(&Scope::default()).unwrap();

        assert_eq!(reports.len(), 4);
        let linkedin = reports
            .iter()
            .find(|r| r.report_type == ReportType::Linkedin)
            .unwrap();
        assert_eq!(linkedin.data_source.as_deref(), Some("csv"));
        assert_eq!(linkedin.report_name, "linkedin_march");
        assert_eq!(linkedin.rows().count(), 3);
    }

    #[test]
    fn test_load_filters_by_scope() {
        let scope = Scope {
            user_id: Some("user-1".to_string()),
            workspace_id: Some("ws-other".to_string()),
        };
        let source = LocalSource::new(fixtures_dir(), ScanConfig::default());
        let reports = source.load(&scope).unwrap();

        // backend export records belong to ws-main; CSV files carry no owner
        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(|r| r.data_source.as_deref() == Some("csv")));
    }
}
