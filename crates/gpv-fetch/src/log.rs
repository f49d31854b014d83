//! Append-only download log.
//!
//! One line per terminal download outcome:
//! `TIMESTAMP | SUCCESS|FAILED | filename | size-or-error`
//!
//! Logging here is always best-effort; a write failure is warned about and
//! never escalates into the run's outcome.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::warn;

/// Human-readable size, e.g. `189.2MB`.
pub fn format_size_mb(bytes: u64) -> String {
    format!("{:.1}MB", bytes as f64 / (1024.0 * 1024.0))
}

/// Appender for the download outcome log.
pub struct DownloadLog {
    path: PathBuf,
}

impl DownloadLog {
    pub fn new(log_dir: &Path) -> Self {
        Self {
            path: log_dir.join("download.log"),
        }
    }

    pub fn record_success(&self, filename: &str, size: u64) {
        self.append(filename, "SUCCESS", &format_size_mb(size));
    }

    pub fn record_failure(&self, filename: &str, error: &str) {
        self.append(filename, "FAILED", error);
    }

    fn append(&self, filename: &str, status: &str, detail: &str) {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        let line = format!("{timestamp} | {status} | {filename} | {detail}\n");

        let result = self
            .path
            .parent()
            .map(std::fs::create_dir_all)
            .unwrap_or(Ok(()))
            .and_then(|_| {
                std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&self.path)
            })
            .and_then(|mut f| f.write_all(line.as_bytes()));

        if let Err(e) = result {
            warn!(path = %self.path.display(), error = %e, "Could not write download log");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn size_formatting() {
        assert_eq!(format_size_mb(198_400_000), "189.2MB");
        assert_eq!(format_size_mb(0), "0.0MB");
    }

    #[test]
    fn appends_one_line_per_outcome() {
        let dir = TempDir::new().unwrap();
        let log = DownloadLog::new(dir.path());

        log.record_success("MSM2025121903S.nc", 1024 * 1024);
        log.record_failure("MSM2025121906S.nc", "Download failed");

        let content = std::fs::read_to_string(dir.path().join("download.log")).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("| SUCCESS | MSM2025121903S.nc | 1.0MB"));
        assert!(lines[1].contains("| FAILED | MSM2025121906S.nc | Download failed"));
    }

    #[test]
    fn creates_missing_log_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("logs");
        let log = DownloadLog::new(&nested);
        log.record_success("MSM2025121900S.nc", 10);
        assert!(nested.join("download.log").exists());
    }
}
