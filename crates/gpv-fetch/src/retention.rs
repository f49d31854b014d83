//! Retention reconciliation for the local dataset cache.
//!
//! The cache holds at most one dataset file: the freshest cycle. This runs
//! before a fetch (clear everything) and again after a successful fetch
//! (keep newest only), so a concurrently-placed stale file cannot survive
//! a full cycle.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use gpv_common::ForecastCycleTime;

/// Delete stale dataset files from `dir`.
///
/// Files whose names do not parse as an MSM cycle are ignored — neither
/// deleted nor counted. With `keep_latest` the newest cycle survives;
/// without it every parsed file is removed. Individual deletion failures
/// are logged and skipped.
///
/// Returns `(deleted_count, freed_bytes)`.
pub fn cleanup_old_files(dir: &Path, keep_latest: bool) -> (usize, u64) {
    let mut entries = scan_dataset_files(dir);
    if entries.is_empty() {
        return (0, 0);
    }

    // Newest first.
    entries.sort_by(|a, b| b.0.cmp(&a.0));

    let to_delete = if keep_latest { &entries[1..] } else { &entries[..] };

    let mut deleted = 0usize;
    let mut freed = 0u64;

    for (_, path) in to_delete {
        let size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        match std::fs::remove_file(path) {
            Ok(()) => {
                debug!(path = %path.display(), "Deleted stale dataset file");
                deleted += 1;
                freed += size;
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to delete stale file");
            }
        }
    }

    (deleted, freed)
}

/// Find the freshest dataset file in `dir`, by embedded cycle time.
pub fn find_latest_dataset(dir: &Path) -> Option<PathBuf> {
    scan_dataset_files(dir)
        .into_iter()
        .max_by_key(|(cycle, _)| *cycle)
        .map(|(_, path)| path)
}

/// All parseable `MSM*.nc` files in `dir` with their cycle times.
fn scan_dataset_files(dir: &Path) -> Vec<(ForecastCycleTime, PathBuf)> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };

    let mut files = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if let Some(cycle) = ForecastCycleTime::parse_filename(name) {
            files.push((cycle, path));
        }
    }
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str, len: usize) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, vec![0u8; len]).unwrap();
        path
    }

    #[test]
    fn keeps_only_the_newest_cycle() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "MSM2025121900S.nc", 10);
        touch(dir.path(), "MSM2025121903S.nc", 20);
        let newest = touch(dir.path(), "MSM2025121906S.nc", 30);

        let (deleted, freed) = cleanup_old_files(dir.path(), true);
        assert_eq!(deleted, 2);
        assert_eq!(freed, 30);
        assert!(newest.exists());
        assert_eq!(find_latest_dataset(dir.path()), Some(newest));
    }

    #[test]
    fn keep_latest_false_removes_everything_parsed() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "MSM2025121900S.nc", 10);
        touch(dir.path(), "MSM2025121903S.nc", 20);

        let (deleted, freed) = cleanup_old_files(dir.path(), false);
        assert_eq!(deleted, 2);
        assert_eq!(freed, 30);
        assert!(find_latest_dataset(dir.path()).is_none());
    }

    #[test]
    fn unparseable_files_are_left_alone() {
        let dir = TempDir::new().unwrap();
        let stray = touch(dir.path(), "notes.txt", 5);
        let odd = touch(dir.path(), "GSM2025121900S.nc", 5);
        let kept = touch(dir.path(), "MSM2025121900S.nc", 10);

        let (deleted, _) = cleanup_old_files(dir.path(), true);
        assert_eq!(deleted, 0);
        assert!(stray.exists());
        assert!(odd.exists());
        assert!(kept.exists());
    }

    #[test]
    fn missing_directory_is_a_noop() {
        let dir = TempDir::new().unwrap();
        let gone = dir.path().join("nope");
        assert_eq!(cleanup_old_files(&gone, true), (0, 0));
        assert!(find_latest_dataset(&gone).is_none());
    }
}
