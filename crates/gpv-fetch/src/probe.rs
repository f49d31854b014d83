//! Sequential existence probing of candidate URLs.
//!
//! Probes are HEAD requests issued newest-first with a mandatory pacing
//! interval between them (archive etiquette — never parallelized). The
//! first 2xx answer short-circuits the search.

use std::future::Future;
use std::time::Duration;

use reqwest::{header, Client};
use tracing::{debug, info};

use gpv_common::{GpvError, GpvResult};

use crate::candidates::CandidateResource;
use crate::config::FetchConfig;

/// Walk the candidates in order, applying `check` to each and sleeping the
/// pacing interval between probes (but not after the last one).
///
/// Generic over the check function so the pacing and short-circuit behavior
/// can be exercised without a network.
pub async fn probe_candidates<F, Fut>(
    candidates: &[CandidateResource],
    pacing: Duration,
    mut check: F,
) -> Option<(CandidateResource, u64)>
where
    F: FnMut(&CandidateResource) -> Fut,
    Fut: Future<Output = Option<u64>>,
{
    for (i, candidate) in candidates.iter().enumerate() {
        if let Some(size) = check(candidate).await {
            return Some((candidate.clone(), size));
        }

        if i + 1 < candidates.len() {
            tokio::time::sleep(pacing).await;
        }
    }

    None
}

/// HEAD-request prober against the real archive.
pub struct Prober {
    client: Client,
    pacing: Duration,
}

impl Prober {
    pub fn new(config: &FetchConfig) -> GpvResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| GpvError::NetworkFatal(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            pacing: config.request_interval(),
        })
    }

    /// Return the first candidate that exists remotely, with its advertised
    /// size, or None when the whole lookback window is exhausted.
    pub async fn find_latest(
        &self,
        candidates: &[CandidateResource],
    ) -> Option<(CandidateResource, u64)> {
        info!(count = candidates.len(), "Probing candidates for latest GPV file");

        let result = probe_candidates(candidates, self.pacing, |candidate| {
            let client = self.client.clone();
            let url = candidate.url.clone();
            async move { head_content_length(&client, &url).await }
        })
        .await;

        match &result {
            Some((c, size)) => info!(url = %c.url, size = size, "Found latest available file"),
            None => info!("No candidate file available within the lookback window"),
        }

        result
    }

    /// Probe a single URL without pacing (manual mode).
    pub async fn check(&self, url: &str) -> Option<u64> {
        head_content_length(&self.client, url).await
    }
}

/// HEAD a URL; Some(advertised size) on 2xx, None otherwise.
///
/// A missing Content-Length on a 2xx still counts as found, with size 0;
/// the fetcher then skips the integrity comparison for that file.
async fn head_content_length(client: &Client, url: &str) -> Option<u64> {
    let response = match client.head(url).send().await {
        Ok(r) => r,
        Err(e) => {
            debug!(url = %url, error = %e, "Probe request failed");
            return None;
        }
    };

    if !response.status().is_success() {
        debug!(url = %url, status = %response.status(), "Candidate not found");
        return None;
    }

    let size = response
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);

    Some(size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};
    use gpv_common::{ForecastCycleTime, DEFAULT_CYCLE_HOURS};

    fn candidates(n: usize) -> Vec<CandidateResource> {
        (0..n)
            .map(|i| {
                let cycle = ForecastCycleTime::snap(
                    Utc.with_ymd_and_hms(2025, 12, 19, 21, 0, 0).unwrap()
                        - chrono::Duration::hours(3 * i as i64),
                    &DEFAULT_CYCLE_HOURS,
                );
                CandidateResource {
                    url: format!("http://example.org/{}", cycle.filename()),
                    cycle,
                }
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn short_circuits_on_second_hit_sleeping_once() {
        let cands = candidates(3);
        let calls = Arc::new(AtomicUsize::new(0));
        let pacing = Duration::from_secs(2);

        let started = tokio::time::Instant::now();
        let calls_in = calls.clone();
        let found = probe_candidates(&cands, pacing, move |_| {
            let calls = calls_in.clone();
            async move {
                let i = calls.fetch_add(1, Ordering::SeqCst);
                if i == 1 {
                    Some(4242)
                } else {
                    None
                }
            }
        })
        .await;

        let (candidate, size) = found.expect("second candidate exists");
        assert_eq!(candidate.url, cands[1].url);
        assert_eq!(size, 4242);
        assert_eq!(calls.load(Ordering::SeqCst), 2, "third candidate never probed");
        // Exactly one pacing sleep: between candidate 1 and 2.
        assert_eq!(started.elapsed(), pacing);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_probe_returns_none_without_trailing_sleep() {
        let cands = candidates(3);
        let pacing = Duration::from_secs(5);

        let started = tokio::time::Instant::now();
        let found = probe_candidates(&cands, pacing, |_| async { None }).await;

        assert!(found.is_none());
        // Two sleeps for three candidates, none after the final probe.
        assert_eq!(started.elapsed(), pacing * 2);
    }

    #[tokio::test]
    async fn empty_candidate_list_is_a_miss() {
        let found = probe_candidates(&[], Duration::from_secs(1), |_| async { Some(1) }).await;
        assert!(found.is_none());
    }
}
