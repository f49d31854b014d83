//! Temporal filtering of the forecast axis.
//!
//! Animations should only show forecast steps still ahead of the wall clock.
//! A file downloaded hours after its cycle may have no future steps left at
//! all; in that case the full axis is kept so the output is never empty.

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::CloudDataset;

/// Indices of time steps at or after `now`.
pub fn future_indices(times: &[DateTime<Utc>], now: DateTime<Utc>) -> Vec<usize> {
    times
        .iter()
        .enumerate()
        .filter(|(_, t)| **t >= now)
        .map(|(i, _)| i)
        .collect()
}

impl CloudDataset {
    /// Drop all time steps before `now`.
    ///
    /// Falls back to retaining the full axis when nothing lies in the future.
    pub fn retain_future(&mut self, now: DateTime<Utc>) {
        let keep = future_indices(self.times(), now);
        if keep.is_empty() {
            warn!(
                steps = self.times().len(),
                "No forecast steps after current time, keeping full axis"
            );
            return;
        }
        self.retain_time_indices(&keep);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn synthetic(times: Vec<DateTime<Utc>>) -> CloudDataset {
        let n = times.len();
        let low: Vec<f32> = (0..n * 4).map(|i| i as f32).collect();
        CloudDataset::from_parts(
            times,
            vec![36.0, 35.0],
            vec![137.0, 138.0],
            low.clone(),
            low.clone(),
            low,
        )
        .unwrap()
    }

    #[test]
    fn keeps_only_future_steps() {
        let t0 = Utc.with_ymd_and_hms(2025, 12, 19, 0, 0, 0).unwrap();
        let times: Vec<_> = [-3i64, 0, 3, 6]
            .iter()
            .map(|h| t0 + Duration::hours(*h))
            .collect();
        let now = t0 + Duration::hours(1);

        let mut ds = synthetic(times.clone());
        ds.retain_future(now);

        assert_eq!(ds.times(), &times[2..]);
        // Per-time slices follow the retained axis.
        assert_eq!(ds.layer_slice(crate::CloudLayer::Low, 0)[0], 8.0);
        assert_eq!(ds.layer_slice(crate::CloudLayer::Low, 1)[0], 12.0);
    }

    #[test]
    fn step_equal_to_now_is_kept() {
        let t0 = Utc.with_ymd_and_hms(2025, 12, 19, 0, 0, 0).unwrap();
        let times = vec![t0 - Duration::hours(3), t0, t0 + Duration::hours(3)];
        assert_eq!(future_indices(&times, t0), vec![1, 2]);
    }

    #[test]
    fn all_past_falls_back_to_full_axis() {
        let t0 = Utc.with_ymd_and_hms(2025, 12, 19, 0, 0, 0).unwrap();
        let times: Vec<_> = (0..3).map(|h| t0 + Duration::hours(h)).collect();
        let mut ds = synthetic(times.clone());
        ds.retain_future(t0 + Duration::hours(24));
        assert_eq!(ds.times(), times.as_slice());
    }
}
