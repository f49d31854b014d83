//! Forecast cycle timestamps and the MSM filename convention.
//!
//! MSM surface files are published once per forecast cycle and named
//! `MSM{YYYYMMDDHH}S.nc`, where the 10-digit field is the cycle
//! initialization time in UTC. Cycles run every 3 hours starting at 00Z.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{GpvError, GpvResult};

/// Valid MSM forecast cycle hours (3-hourly, UTC).
pub const DEFAULT_CYCLE_HOURS: [u32; 8] = [0, 3, 6, 9, 12, 15, 18, 21];

const FILENAME_PREFIX: &str = "MSM";
const FILENAME_SUFFIX: &str = "S.nc";

/// A forecast cycle initialization time.
///
/// Always a whole hour drawn from the valid cycle-hour set; immutable
/// once constructed. Ordering follows chronological order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ForecastCycleTime(DateTime<Utc>);

impl ForecastCycleTime {
    /// Construct from a UTC datetime, validating against the cycle-hour set.
    pub fn new(dt: DateTime<Utc>, cycle_hours: &[u32]) -> GpvResult<Self> {
        if dt.minute() != 0 || dt.second() != 0 || dt.nanosecond() != 0 {
            return Err(GpvError::InvalidCycle(format!(
                "not a whole hour: {}",
                dt.to_rfc3339()
            )));
        }
        if !cycle_hours.contains(&dt.hour()) {
            return Err(GpvError::InvalidCycle(format!(
                "hour {} not in cycle set {:?}",
                dt.hour(),
                cycle_hours
            )));
        }
        Ok(Self(dt))
    }

    /// Construct from date components, validating the hour.
    pub fn from_ymdh(year: i32, month: u32, day: u32, hour: u32, cycle_hours: &[u32]) -> GpvResult<Self> {
        let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
            GpvError::InvalidCycle(format!("invalid date {:04}-{:02}-{:02}", year, month, day))
        })?;
        let naive = date.and_hms_opt(hour, 0, 0).ok_or_else(|| {
            GpvError::InvalidCycle(format!("invalid hour {}", hour))
        })?;
        Self::new(Utc.from_utc_datetime(&naive), cycle_hours)
    }

    /// Snap an instant down to the most recent valid cycle at or before it.
    ///
    /// When the instant falls before the day's first cycle hour, wraps to the
    /// previous day's last cycle hour.
    pub fn snap(instant: DateTime<Utc>, cycle_hours: &[u32]) -> Self {
        let hour = instant.hour();
        let snapped = match cycle_hours.iter().rev().find(|&&h| h <= hour) {
            Some(&h) => instant
                .date_naive()
                .and_hms_opt(h, 0, 0)
                .expect("cycle hour is a valid hour-of-day"),
            None => {
                let last = *cycle_hours.last().expect("cycle hour set is non-empty");
                (instant - Duration::days(1))
                    .date_naive()
                    .and_hms_opt(last, 0, 0)
                    .expect("cycle hour is a valid hour-of-day")
            }
        };
        Self(Utc.from_utc_datetime(&snapped))
    }

    /// Parse a cycle time out of an MSM filename, e.g. `MSM2025122403S.nc`.
    ///
    /// Returns None for anything that does not match the convention; the hour
    /// is not validated against a cycle set here since files on disk are
    /// authoritative for their own naming.
    pub fn parse_filename(filename: &str) -> Option<Self> {
        let digits = filename
            .strip_prefix(FILENAME_PREFIX)?
            .strip_suffix(FILENAME_SUFFIX)?;
        if digits.len() != 10 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        let year: i32 = digits[0..4].parse().ok()?;
        let month: u32 = digits[4..6].parse().ok()?;
        let day: u32 = digits[6..8].parse().ok()?;
        let hour: u32 = digits[8..10].parse().ok()?;

        let naive = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, 0, 0)?;
        Some(Self(Utc.from_utc_datetime(&naive)))
    }

    /// The canonical filename for this cycle.
    pub fn filename(&self) -> String {
        format!(
            "{}{}{}",
            FILENAME_PREFIX,
            self.0.format("%Y%m%d%H"),
            FILENAME_SUFFIX
        )
    }

    /// The date path segment used in the remote layout (`YYYYMMDD`).
    pub fn date_segment(&self) -> String {
        self.0.format("%Y%m%d").to_string()
    }

    /// Initialization time in UTC.
    pub fn datetime(&self) -> DateTime<Utc> {
        self.0
    }
}

impl std::fmt::Display for ForecastCycleTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d %H:%MZ"))
    }
}
