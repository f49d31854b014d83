//! The fetch-then-render update pipeline and its hourly schedule.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Timelike, Utc};
use tokio::sync::{broadcast, Mutex};
use tracing::{error, info};

use crate::config::AppConfig;
use crate::status::StatusHandle;

/// Runs the full update pipeline: fetch the freshest dataset, then render
/// all animation variants from it. Concurrent invocations are collapsed,
/// only one update runs at a time.
pub struct Updater {
    config: AppConfig,
    running: Mutex<()>,
}

impl Updater {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            running: Mutex::new(()),
        }
    }

    pub async fn run(&self, status: &StatusHandle) -> Result<()> {
        let Ok(_guard) = self.running.try_lock() else {
            info!("Update already in progress, skipping");
            return Ok(());
        };

        info!("Starting update");
        status.set_running("Downloading latest data").await;

        let report = gpv_fetch::discover_and_fetch_latest(&self.config.fetch).await;
        if !report.success {
            let message = format!("Download failed: {}", report.message);
            status.set_error(&message).await;
            return Err(anyhow!(message));
        }
        info!(message = %report.message, fetched = report.fetched, "Fetch step complete");

        status.set_running("Generating animations").await;

        let Some(dataset) = gpv_fetch::find_latest_dataset(&self.config.fetch.raw_data_dir) else {
            let message = gpv_fetch::GpvError::DatasetMissing.to_string();
            status.set_error(&message).await;
            return Err(anyhow!(message));
        };

        // Rendering is CPU-bound (rayon inside), keep it off the runtime.
        let output_dir = self.config.render.output_dir.clone();
        let rendered = tokio::task::spawn_blocking(move || {
            cloud_render::render_animations(&dataset, &output_dir, Utc::now())
        })
        .await
        .context("render task panicked")?;

        match rendered {
            Ok(outputs) => {
                info!(animations = outputs.len(), "Update complete");
                status.set_success().await;
                Ok(())
            }
            Err(e) => {
                let message = format!("Rendering failed: {e}");
                status.set_error(&message).await;
                Err(anyhow!(message))
            }
        }
    }
}

/// Seconds until the next top of the hour.
fn seconds_until_next_hour(now: DateTime<Utc>) -> u64 {
    3600 - (now.minute() as u64 * 60 + now.second() as u64)
}

/// Run updates at the top of every hour until shutdown.
pub async fn run_scheduler(
    updater: Arc<Updater>,
    status: StatusHandle,
    mut shutdown: broadcast::Receiver<()>,
) {
    loop {
        let wait = Duration::from_secs(seconds_until_next_hour(Utc::now()));
        info!(next_in_secs = wait.as_secs(), "Next scheduled update");

        tokio::select! {
            _ = shutdown.recv() => {
                info!("Shutting down scheduler");
                break;
            }
            _ = tokio::time::sleep(wait) => {
                if let Err(e) = updater.run(&status).await {
                    error!(error = %e, "Scheduled update failed");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn wait_counts_down_to_the_hour() {
        let t = Utc.with_ymd_and_hms(2025, 12, 19, 4, 0, 0).unwrap();
        assert_eq!(seconds_until_next_hour(t), 3600);

        let t = Utc.with_ymd_and_hms(2025, 12, 19, 4, 59, 59).unwrap();
        assert_eq!(seconds_until_next_hour(t), 1);

        let t = Utc.with_ymd_and_hms(2025, 12, 19, 4, 30, 15).unwrap();
        assert_eq!(seconds_until_next_hour(t), 1785);
    }

    #[test]
    fn missing_dataset_surfaces_the_shared_error_text() {
        // An empty cache directory yields no dataset; the status message
        // shown for that case is the shared error's Display form.
        let dir = tempfile::TempDir::new().unwrap();
        assert!(gpv_fetch::find_latest_dataset(dir.path()).is_none());
        assert_eq!(
            gpv_fetch::GpvError::DatasetMissing.to_string(),
            "no local dataset file available"
        );
    }
}
