/// JSON run reports.
///
/// A report records what a single run did so it can be inspected afterwards:
/// where files came from, where they went, and how long it took.
use crate::organizer::{CopyRecord, RunResult};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while writing a report.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write report {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Summary of one run, ready to be written to disk.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// RFC 3339 timestamp of when the run finished.
    pub timestamp: String,
    pub source: PathBuf,
    pub output: PathBuf,
    /// Normalized extension filter, colon-delimited.
    pub extensions: String,
    pub dry_run: bool,
    pub processed: usize,
    pub failed: usize,
    /// Files copied without their original timestamps.
    pub metadata_warnings: usize,
    pub duration_seconds: f64,
    pub copies: Vec<CopyRecord>,
}

impl RunReport {
    pub fn new(source: &Path, output: &Path, extensions: String, result: &RunResult) -> Self {
        Self {
            timestamp: chrono::Local::now().to_rfc3339(),
            source: source.to_path_buf(),
            output: output.to_path_buf(),
            extensions,
            dry_run: result.dry_run,
            processed: result.processed,
            failed: result.failures(),
            metadata_warnings: result.metadata_warnings,
            duration_seconds: result.duration_secs(),
            copies: result.copies.clone(),
        }
    }

    /// Renders the report as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, ReportError> {
        let value = json!({
            "timestamp": self.timestamp,
            "source": self.source.to_string_lossy(),
            "output": self.output.to_string_lossy(),
            "extensions": self.extensions,
            "dry_run": self.dry_run,
            "processed": self.processed,
            "failed": self.failed,
            "metadata_warnings": self.metadata_warnings,
            "duration_seconds": self.duration_seconds,
            "copies": self.copies.iter().map(|copy| {
                json!({
                    "from": copy.from.to_string_lossy(),
                    "to": copy.to.to_string_lossy(),
                })
            }).collect::<Vec<_>>(),
        });
        Ok(serde_json::to_string_pretty(&value)?)
    }

    /// Writes the report to `path`, replacing any existing file.
    pub fn save(&self, path: &Path) -> Result<(), ReportError> {
        let json = self.to_json()?;
        fs::write(path, json).map_err(|source| ReportError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use std::time::Duration;
    use tempfile::TempDir;

    fn sample_result() -> RunResult {
        RunResult {
            processed: 1,
            failed: 1,
            unreadable: 1,
            metadata_warnings: 1,
            duration: Duration::from_millis(1500),
            copies: vec![CopyRecord {
                from: PathBuf::from("src/Alpha/a.txt"),
                to: PathBuf::from("out/Alpha.txt"),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_report_json_fields() {
        let report = RunReport::new(
            Path::new("src"),
            Path::new("out"),
            ".txt".to_string(),
            &sample_result(),
        );
        let value: Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

        assert_eq!(value["source"], "src");
        assert_eq!(value["output"], "out");
        assert_eq!(value["extensions"], ".txt");
        assert_eq!(value["dry_run"], false);
        assert_eq!(value["processed"], 1);
        assert_eq!(value["failed"], 2);
        assert_eq!(value["metadata_warnings"], 1);
        assert_eq!(value["duration_seconds"], 1.5);
        assert_eq!(value["copies"][0]["from"], "src/Alpha/a.txt");
        assert_eq!(value["copies"][0]["to"], "out/Alpha.txt");
        assert!(
            chrono::DateTime::parse_from_rfc3339(value["timestamp"].as_str().unwrap()).is_ok()
        );
    }

    #[test]
    fn test_save_writes_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("report.json");
        let report = RunReport::new(
            Path::new("src"),
            Path::new("out"),
            ".txt".to_string(),
            &sample_result(),
        );

        report.save(&path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"processed\": 1"));
    }

    #[test]
    fn test_save_to_missing_directory_fails() {
        let report = RunReport::new(
            Path::new("src"),
            Path::new("out"),
            ".txt".to_string(),
            &RunResult::default(),
        );
        let result = report.save(Path::new("/non/existent/dir/report.json"));
        assert!(matches!(result, Err(ReportError::Write { .. })));
    }
}
