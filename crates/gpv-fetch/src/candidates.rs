//! Candidate URL generation for the publication-lag search.
//!
//! The archive never advertises its freshest file, so we enumerate the
//! cycles that plausibly exist — stepping back in 3-hour increments from
//! the delay-adjusted current time — and probe them newest-first.

use chrono::{DateTime, Duration, Utc};

use gpv_common::ForecastCycleTime;

use crate::config::FetchConfig;

/// A plausible remote file, paired with the cycle it would contain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateResource {
    pub url: String,
    pub cycle: ForecastCycleTime,
}

/// Generate candidate resources newest-first, deduplicated by URL.
///
/// Pure function of its inputs; `lookback_hours / 3 + 2` backward steps are
/// taken so the window always covers at least one full extra cycle beyond
/// the configured lookback.
pub fn generate_candidates(now: DateTime<Utc>, config: &FetchConfig) -> Vec<CandidateResource> {
    let steps = config.lookback_hours / 3 + 2;
    let mut candidates: Vec<CandidateResource> = Vec::with_capacity(steps as usize);

    for i in 0..steps {
        let check_time = now - Duration::hours(i * 3 + config.delay_hours);
        let cycle = ForecastCycleTime::snap(check_time, &config.cycle_hours);
        let url = format!(
            "{}{}/{}",
            config.base_url,
            cycle.date_segment(),
            cycle.filename()
        );

        if !candidates.iter().any(|c| c.url == url) {
            candidates.push(CandidateResource { url, cycle });
        }
    }

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_config() -> FetchConfig {
        serde_yaml::from_str(
            r#"
base_url: "http://database.rish.kyoto-u.ac.jp/arch/jmadata/data/gpv/netcdf/MSM-S/"
raw_data_dir: "data/raw"
log_dir: "logs"
"#,
        )
        .unwrap()
    }

    #[test]
    fn candidates_are_newest_first_unique_and_on_cycle() {
        let config = test_config();
        let now = Utc.with_ymd_and_hms(2025, 12, 19, 5, 0, 0).unwrap();
        let candidates = generate_candidates(now, &config);

        assert!(!candidates.is_empty());
        for pair in candidates.windows(2) {
            assert!(pair[0].cycle > pair[1].cycle, "must be strictly descending");
        }
        for c in &candidates {
            let hour = c.cycle.datetime().format("%H").to_string().parse::<u32>().unwrap();
            assert!(config.cycle_hours.contains(&hour));
        }
        let urls: std::collections::HashSet<_> = candidates.iter().map(|c| &c.url).collect();
        assert_eq!(urls.len(), candidates.len(), "no duplicate URLs");
    }

    #[test]
    fn lag_search_fixture_2025_12_19() {
        // 05:00Z minus the 2 h publication delay is 03:00Z; the newest cycle
        // at or before that is 03Z, then 00Z, then the previous day's 21Z.
        let config = test_config();
        let now = Utc.with_ymd_and_hms(2025, 12, 19, 5, 0, 0).unwrap();
        let candidates = generate_candidates(now, &config);

        assert_eq!(
            candidates[0].url,
            "http://database.rish.kyoto-u.ac.jp/arch/jmadata/data/gpv/netcdf/MSM-S/20251219/MSM2025121903S.nc"
        );
        assert_eq!(
            candidates[1].url,
            "http://database.rish.kyoto-u.ac.jp/arch/jmadata/data/gpv/netcdf/MSM-S/20251219/MSM2025121900S.nc"
        );
        assert_eq!(
            candidates[2].url,
            "http://database.rish.kyoto-u.ac.jp/arch/jmadata/data/gpv/netcdf/MSM-S/20251218/MSM2025121821S.nc"
        );
        // 12 h lookback => 6 backward steps, all distinct here.
        assert_eq!(candidates.len(), 6);
    }

    #[test]
    fn day_boundary_wraps_to_previous_day() {
        let mut config = test_config();
        config.delay_hours = 2;
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 1, 0, 0).unwrap();
        let candidates = generate_candidates(now, &config);

        // 01:00Z - 2h = 23:00Z on 2025-12-31 -> 21Z cycle of the previous day.
        assert_eq!(
            candidates[0].cycle.datetime(),
            Utc.with_ymd_and_hms(2025, 12, 31, 21, 0, 0).unwrap()
        );
    }
}
