//! Durable error log
//!
//! A run with at least one failing link leaves a log file named
//! `result_<host>_<unix-start>.log` in the configured directory. Each line
//! holds an RFC 3339 timestamp followed by a detail line.

use crate::output::Report;
use crate::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Builds the log file path for a run
///
/// # Arguments
///
/// * `dir` - Directory receiving the log
/// * `host` - Host label of the entrypoint
/// * `started_at` - Start time of the run
pub fn log_file_path(dir: &Path, host: &str, started_at: DateTime<Utc>) -> PathBuf {
    dir.join(format!("result_{}_{}.log", host, started_at.timestamp()))
}

/// Writes the failing results of a report to a new log file
///
/// Nothing is written, and no directory is created, when the report has no
/// failing results.
///
/// # Returns
///
/// * `Ok(Some(PathBuf))` - Path of the written log
/// * `Ok(None)` - Every link was healthy
/// * `Err(SweepError::Io)` - The directory or file could not be written
pub fn write_error_log(
    report: &Report,
    dir: &Path,
    host: &str,
    started_at: DateTime<Utc>,
) -> Result<Option<PathBuf>> {
    if !report.has_errors() {
        return Ok(None);
    }

    fs::create_dir_all(dir)?;
    let path = log_file_path(dir, host, started_at);

    let mut writer = BufWriter::new(File::create(&path)?);
    for line in report.error_lines() {
        let stamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        writeln!(writer, "{} {}", stamp, line)?;
    }
    writer.flush()?;

    tracing::info!("Wrote {} errors to {}", report.error_count(), path.display());
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::{Link, VerificationResult};
    use crate::output::aggregate;
    use chrono::TimeZone;

    fn started() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    fn result(target: &str, status: u16) -> VerificationResult {
        VerificationResult::from_status(
            Link {
                origin_page_url: "https://example.com/".to_string(),
                origin_anchor_text: "Home".to_string(),
                target_url: target.to_string(),
            },
            status,
        )
    }

    #[test]
    fn test_log_file_path() {
        let path = log_file_path(Path::new("logs"), "example.com", started());
        assert_eq!(path, PathBuf::from("logs/result_example.com_1700000000.log"));
    }

    #[test]
    fn test_write_creates_directory_and_lines() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("nested").join("logs");
        let report = aggregate(vec![
            result("https://example.com/ok", 200),
            result("https://example.com/missing", 404),
            result("https://example.com/broken", 500),
        ]);

        let path = write_error_log(&report, &dir, "example.com", started())
            .unwrap()
            .unwrap();

        assert!(path.ends_with("result_example.com_1700000000.log"));
        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(
            "HTTP 404 for https://example.com/missing (linked from https://example.com/ with text Home)"
        ));
        assert!(lines[1].contains("HTTP 500 for https://example.com/broken"));

        let stamp = lines[0].split(' ').next().unwrap();
        assert!(DateTime::parse_from_rfc3339(stamp).is_ok());
    }

    #[test]
    fn test_no_log_when_all_healthy() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("logs");
        let report = aggregate(vec![result("https://example.com/ok", 200)]);

        let written = write_error_log(&report, &dir, "example.com", started()).unwrap();

        assert!(written.is_none());
        assert!(!dir.exists());
    }
}
