//! Fetch configuration.
//!
//! Mirrors the `gpv_database` / `download` / `storage` sections of the
//! application YAML config; every knob has a default so a minimal config
//! only needs the base URL and directories.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use gpv_common::cycle::DEFAULT_CYCLE_HOURS;
use gpv_common::{GpvError, GpvResult};

/// Configuration for discovery and download of MSM files.
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Base URL of the archive; the remote layout is
    /// `{base_url}{YYYYMMDD}/MSM{YYYYMMDDHH}S.nc`.
    pub base_url: String,

    /// Valid forecast cycle hours (UTC), ascending.
    #[serde(default = "default_cycle_hours")]
    pub cycle_hours: Vec<u32>,

    /// Expected publication lag behind the cycle time.
    #[serde(default = "default_delay_hours")]
    pub delay_hours: i64,

    /// How far back to search for an available file.
    #[serde(default = "default_lookback_hours")]
    pub lookback_hours: i64,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Download retry budget.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay between download retries, seconds.
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,

    /// Pacing interval between existence probes, seconds.
    #[serde(default = "default_request_interval_secs")]
    pub request_interval_secs: u64,

    /// User-Agent header identifying this service to the archive.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Directory holding the (single) cached dataset file.
    pub raw_data_dir: PathBuf,

    /// Directory for the append-only download log.
    pub log_dir: PathBuf,
}

fn default_cycle_hours() -> Vec<u32> {
    DEFAULT_CYCLE_HOURS.to_vec()
}

fn default_delay_hours() -> i64 {
    2
}

fn default_lookback_hours() -> i64 {
    12
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_secs() -> u64 {
    10
}

fn default_request_interval_secs() -> u64 {
    2
}

fn default_user_agent() -> String {
    "gpv-cloudcast/0.1 (research use)".to_string()
}

impl FetchConfig {
    /// Reject cycle sets that cannot drive the candidate search: the snap
    /// operation needs at least one valid cycle hour below 24.
    pub fn validate(&self) -> GpvResult<()> {
        if self.cycle_hours.is_empty() {
            return Err(GpvError::InvalidCycle(
                "cycle_hours must not be empty".to_string(),
            ));
        }
        if let Some(&hour) = self.cycle_hours.iter().find(|&&h| h >= 24) {
            return Err(GpvError::InvalidCycle(format!(
                "cycle hour {hour} out of range 0-23"
            )));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    pub fn request_interval(&self) -> Duration {
        Duration::from_secs(self.request_interval_secs)
    }
}
