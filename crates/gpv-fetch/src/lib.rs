//! Discovery and acquisition of the freshest MSM GPV dataset file.
//!
//! The archive publishes one NetCDF file per 3-hourly forecast cycle with
//! an uncertain lag, so "get the latest" is a search: enumerate plausible
//! cycles newest-first, probe until one exists, then fetch it with retries
//! and reconcile the local cache down to that single file.

pub mod candidates;
pub mod config;
pub mod download;
pub mod log;
pub mod probe;
pub mod retention;

use std::path::PathBuf;

use chrono::Utc;
use tracing::{info, warn};

pub use candidates::{generate_candidates, CandidateResource};
pub use config::FetchConfig;
pub use download::Fetcher;
pub use log::{format_size_mb, DownloadLog};
pub use probe::Prober;
pub use retention::{cleanup_old_files, find_latest_dataset};

use gpv_common::ForecastCycleTime;
pub use gpv_common::{GpvError, GpvResult};

/// Outcome of a discovery-and-fetch run.
///
/// The orchestration layer only ever sees this report; failures inside the
/// pipeline are folded into `success == false` plus a readable message.
#[derive(Debug, Clone)]
pub struct FetchReport {
    pub success: bool,
    /// Whether bytes were actually transferred (false for "already current").
    pub fetched: bool,
    pub path: Option<PathBuf>,
    pub message: String,
}

impl FetchReport {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            fetched: false,
            path: None,
            message: message.into(),
        }
    }
}

/// Discover the freshest available remote file and make it the single
/// cached dataset. Never panics or propagates an error upward.
pub async fn discover_and_fetch_latest(config: &FetchConfig) -> FetchReport {
    let candidates = generate_candidates(Utc::now(), config);

    let prober = match Prober::new(config) {
        Ok(p) => p,
        Err(e) => return FetchReport::failure(format!("probe setup failed: {e}")),
    };

    let Some((candidate, size)) = prober.find_latest(&candidates).await else {
        return FetchReport::failure(GpvError::CandidateNotFound.to_string());
    };

    fetch_candidate(config, &candidate, size).await
}

/// Manual mode: fetch one specific cycle by date and hour.
pub async fn fetch_specific(config: &FetchConfig, date: &str, hour: u32) -> FetchReport {
    if date.len() != 8 || !date.bytes().all(|b| b.is_ascii_digit()) {
        return FetchReport::failure(format!("invalid date '{date}', expected YYYYMMDD"));
    }
    let year: i32 = date[0..4].parse().unwrap_or(0);
    let month: u32 = date[4..6].parse().unwrap_or(0);
    let day: u32 = date[6..8].parse().unwrap_or(0);

    let cycle = match ForecastCycleTime::from_ymdh(year, month, day, hour, &config.cycle_hours) {
        Ok(c) => c,
        Err(e) => return FetchReport::failure(e.to_string()),
    };

    let url = format!("{}{}/{}", config.base_url, cycle.date_segment(), cycle.filename());
    let candidate = CandidateResource { url, cycle };

    let prober = match Prober::new(config) {
        Ok(p) => p,
        Err(e) => return FetchReport::failure(format!("probe setup failed: {e}")),
    };

    let Some(size) = prober.check(&candidate.url).await else {
        return FetchReport::failure(format!("file not found at {}", candidate.url));
    };

    fetch_candidate(config, &candidate, size).await
}

/// Shared tail of both modes: short-circuit on an up-to-date cache,
/// reconcile, download, reconcile again, log the outcome.
async fn fetch_candidate(
    config: &FetchConfig,
    candidate: &CandidateResource,
    size: u64,
) -> FetchReport {
    let filename = candidate.cycle.filename();
    let dest = config.raw_data_dir.join(&filename);
    let dlog = DownloadLog::new(&config.log_dir);

    // Already have the freshest file at the advertised size: nothing to
    // transfer, but the single-file invariant still gets enforced.
    if let Ok(meta) = std::fs::metadata(&dest) {
        if size > 0 && meta.len() == size {
            info!(path = %dest.display(), "Cached file already current");
            let (deleted, freed) = cleanup_old_files(&config.raw_data_dir, true);
            if deleted > 0 {
                info!(deleted, freed = %format_size_mb(freed), "Removed stale files");
            }
            return FetchReport {
                success: true,
                fetched: false,
                path: Some(dest),
                message: format!("{filename} already up to date"),
            };
        }
        warn!(path = %dest.display(), "Existing file has wrong size, re-downloading");
    }

    // Clear the cache before writing the replacement.
    let (deleted, freed) = cleanup_old_files(&config.raw_data_dir, false);
    if deleted > 0 {
        info!(deleted, freed = %format_size_mb(freed), "Cleared cache before download");
    }

    let fetcher = match Fetcher::new(config) {
        Ok(f) => f,
        Err(e) => return FetchReport::failure(format!("fetch setup failed: {e}")),
    };

    match fetcher.fetch(&candidate.url, &dest, size).await {
        Ok(written) => {
            // A second pass guards against files placed while downloading.
            let (deleted, _) = cleanup_old_files(&config.raw_data_dir, true);
            if deleted > 0 {
                info!(deleted, "Post-fetch reconciliation removed stale files");
            }
            dlog.record_success(&filename, written);
            FetchReport {
                success: true,
                fetched: true,
                path: Some(dest),
                message: format!("downloaded {filename} ({})", format_size_mb(written)),
            }
        }
        Err(e) => {
            dlog.record_failure(&filename, &e.to_string());
            FetchReport::failure(format!("download of {filename} failed: {e}"))
        }
    }
}
