//! Resilient streaming download with integrity verification.
//!
//! Retry policy follows a small state machine over attempt outcomes:
//! timeouts and transport failures retry after a fixed backoff, size
//! mismatches purge the partial file and retry, HTTP status errors and
//! local filesystem errors abort immediately. Exhausting the retry budget
//! never leaves a partial file behind.

use std::path::{Path, PathBuf};

use futures::StreamExt;
use reqwest::{header, Client};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use gpv_common::{GpvError, GpvResult};

use crate::config::FetchConfig;

/// Headroom factor applied to the advertised size during the disk preflight.
const DISK_SPACE_MARGIN: f64 = 1.1;

/// Streaming downloader for confirmed-existing archive files.
pub struct Fetcher {
    client: Client,
    max_retries: u32,
    retry_delay: std::time::Duration,
}

impl Fetcher {
    pub fn new(config: &FetchConfig) -> GpvResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| GpvError::NetworkFatal(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            max_retries: config.max_retries.max(1),
            retry_delay: config.retry_delay(),
        })
    }

    /// Download `url` to `dest`, verifying the byte count against the
    /// advertised Content-Length. Returns the number of bytes written.
    ///
    /// `expected_size` is the size advertised by the existence probe; it is
    /// used for the disk-space preflight and as a fallback when the GET
    /// response carries no Content-Length.
    pub async fn fetch(&self, url: &str, dest: &Path, expected_size: u64) -> GpvResult<u64> {
        let parent = dest.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent).await?;

        // Fail fast before writing anything; no retry can fix a full disk.
        let required = (expected_size as f64 * DISK_SPACE_MARGIN) as u64;
        check_disk_space(parent, required)?;

        let partial = partial_path(dest);
        let mut last_err = GpvError::NetworkTransient("no attempt made".to_string());

        for attempt in 1..=self.max_retries {
            info!(url = %url, attempt, max = self.max_retries, "Download attempt");

            match self.attempt(url, &partial, expected_size).await {
                Ok(written) => {
                    fs::rename(&partial, dest).await?;
                    info!(path = %dest.display(), bytes = written, "Download completed");
                    return Ok(written);
                }
                Err(e) if e.is_retryable() => {
                    warn!(url = %url, attempt, error = %e, "Attempt failed, will retry");
                    remove_if_exists(&partial).await;
                    last_err = e;
                    if attempt < self.max_retries {
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
                Err(e) => {
                    warn!(url = %url, error = %e, "Fatal download error");
                    remove_if_exists(&partial).await;
                    return Err(e);
                }
            }
        }

        remove_if_exists(&partial).await;
        Err(last_err)
    }

    /// One download attempt: stream the body to the partial path and verify
    /// the byte count.
    async fn attempt(&self, url: &str, partial: &Path, expected_size: u64) -> GpvResult<u64> {
        let response = self.client.get(url).send().await.map_err(classify_request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(GpvError::NetworkFatal(format!("{status} for {url}")));
        }

        let advertised = response
            .headers()
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok())
            .unwrap_or(expected_size);

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(partial)
            .await?;

        let mut written = 0u64;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(classify_request_error)?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }

        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        if advertised > 0 && written != advertised {
            debug!(expected = advertised, actual = written, "Size mismatch after download");
            return Err(GpvError::IntegrityMismatch {
                expected: advertised,
                actual: written,
            });
        }

        Ok(written)
    }
}

/// Sibling `.partial` path used while streaming.
fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".partial");
    dest.with_file_name(name)
}

fn classify_request_error(e: reqwest::Error) -> GpvError {
    if e.is_timeout() {
        GpvError::NetworkTransient(format!("timeout: {e}"))
    } else if e.is_status() {
        GpvError::NetworkFatal(e.to_string())
    } else {
        GpvError::NetworkTransient(e.to_string())
    }
}

async fn remove_if_exists(path: &Path) {
    if let Err(e) = fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "Failed to remove partial file");
        }
    }
}

/// Verify that the filesystem holding `path` has at least `required` bytes
/// free. When the mount point cannot be resolved the check is skipped with
/// a warning rather than blocking the download.
fn check_disk_space(path: &Path, required: u64) -> GpvResult<()> {
    if required == 0 {
        return Ok(());
    }

    let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    let disks = sysinfo::Disks::new_with_refreshed_list();

    let best = disks
        .list()
        .iter()
        .filter(|d| canonical.starts_with(d.mount_point()))
        .max_by_key(|d| d.mount_point().as_os_str().len());

    match best {
        Some(disk) => {
            let available = disk.available_space();
            if available < required {
                return Err(GpvError::DiskSpaceInsufficient {
                    required,
                    available,
                });
            }
            Ok(())
        }
        None => {
            warn!(path = %canonical.display(), "Could not resolve mount point, skipping disk preflight");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;
    use tokio::io::AsyncReadExt;

    #[test]
    fn partial_path_is_a_sibling() {
        let dest = Path::new("/data/raw/MSM2025121903S.nc");
        assert_eq!(
            partial_path(dest),
            PathBuf::from("/data/raw/MSM2025121903S.nc.partial")
        );
    }

    #[test]
    fn zero_required_bytes_always_pass_preflight() {
        let dir = TempDir::new().unwrap();
        assert!(check_disk_space(dir.path(), 0).is_ok());
    }

    #[test]
    fn small_requirement_passes_preflight() {
        let dir = TempDir::new().unwrap();
        // 1 KiB of headroom is available on any test machine.
        assert!(check_disk_space(dir.path(), 1024).is_ok());
    }

    fn test_config(max_retries: u32) -> FetchConfig {
        serde_yaml::from_str(&format!(
            r#"
base_url: "http://127.0.0.1/"
raw_data_dir: "data/raw"
log_dir: "logs"
timeout_secs: 5
max_retries: {max_retries}
retry_delay_secs: 0
"#
        ))
        .unwrap()
    }

    /// Answers every request with a close-delimited body shorter than the
    /// size the existence probe advertised, so each attempt ends in a size
    /// mismatch.
    async fn spawn_truncating_server(hits: Arc<AtomicUsize>) -> std::net::SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                hits.fetch_add(1, Ordering::SeqCst);
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                let _ = socket
                    .write_all(b"HTTP/1.1 200 OK\r\nConnection: close\r\n\r\ntruncated")
                    .await;
            }
        });
        addr
    }

    #[tokio::test]
    async fn retry_exhaustion_leaves_no_file_behind() {
        let hits = Arc::new(AtomicUsize::new(0));
        let addr = spawn_truncating_server(Arc::clone(&hits)).await;

        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("MSM2025121903S.nc");
        let fetcher = Fetcher::new(&test_config(2)).unwrap();

        let err = fetcher
            .fetch(&format!("http://{addr}/MSM2025121903S.nc"), &dest, 100)
            .await
            .unwrap_err();

        // "truncated" is 9 bytes against the advertised 100.
        assert!(matches!(
            err,
            GpvError::IntegrityMismatch {
                expected: 100,
                actual: 9
            }
        ));
        assert_eq!(hits.load(Ordering::SeqCst), 2, "retry budget fully consumed");
        assert!(!dest.exists());
        assert!(!partial_path(&dest).exists());
    }
}
