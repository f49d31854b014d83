//! Loading of MSM surface NetCDF files into memory.
//!
//! The files carry three cloud-fraction variables (`ncld_low`, `ncld_mid`,
//! `ncld_upper`) on a (time, lat, lon) grid, latitude descending and
//! longitude ascending. Loading clips to a bounding box up front so the
//! rendering pipeline only ever sees the target region.

pub mod select;

use std::path::Path;

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use thiserror::Error;
use tracing::debug;

use gpv_common::BoundingBox;

/// Result type for dataset operations.
pub type DatasetResult<T> = Result<T, DatasetError>;

/// Error types for NetCDF dataset loading.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to open NetCDF file: {0}")]
    Open(String),

    #[error("missing required data: {0}")]
    MissingData(String),

    #[error("invalid data format: {0}")]
    InvalidFormat(String),

    #[error("bounding box selects no grid points: {0}")]
    EmptyRegion(String),
}

/// One of the three vertical cloud bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CloudLayer {
    Low,
    Mid,
    Upper,
}

impl CloudLayer {
    pub const ALL: [CloudLayer; 3] = [CloudLayer::Low, CloudLayer::Mid, CloudLayer::Upper];

    /// NetCDF variable name carrying this layer's cloud fraction.
    pub fn variable(&self) -> &'static str {
        match self {
            CloudLayer::Low => "ncld_low",
            CloudLayer::Mid => "ncld_mid",
            CloudLayer::Upper => "ncld_upper",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CloudLayer::Low => "low",
            CloudLayer::Mid => "mid",
            CloudLayer::Upper => "upper",
        }
    }
}

/// A clipped, in-memory cloud-cover time series.
///
/// Data is time-major row-major: index `t * nlat * nlon + y * nlon + x`.
/// Latitudes run north to south (descending), longitudes west to east.
/// Not mutated after load except for temporal filtering.
#[derive(Debug, Clone)]
pub struct CloudDataset {
    times: Vec<DateTime<Utc>>,
    lats: Vec<f64>,
    lons: Vec<f64>,
    low: Vec<f32>,
    mid: Vec<f32>,
    upper: Vec<f32>,
}

impl CloudDataset {
    /// Open a NetCDF file and clip it to `bbox`.
    pub fn open(path: &Path, bbox: &BoundingBox) -> DatasetResult<Self> {
        let file = netcdf::open(path)
            .map_err(|e| DatasetError::Open(format!("{}: {e}", path.display())))?;

        let times = read_time_axis(&file)?;
        let all_lats = read_axis_f64(&file, "lat")?;
        let all_lons = read_axis_f64(&file, "lon")?;

        // Latitude is stored descending; take the contiguous run inside the box.
        let lat_range = contiguous_range(&all_lats, |v| v >= bbox.min_lat && v <= bbox.max_lat)
            .ok_or_else(|| DatasetError::EmptyRegion(format!("lat {}..{}", bbox.min_lat, bbox.max_lat)))?;
        let lon_range = contiguous_range(&all_lons, |v| v >= bbox.min_lon && v <= bbox.max_lon)
            .ok_or_else(|| DatasetError::EmptyRegion(format!("lon {}..{}", bbox.min_lon, bbox.max_lon)))?;

        let lats = all_lats[lat_range.clone()].to_vec();
        let lons = all_lons[lon_range.clone()].to_vec();

        debug!(
            path = %path.display(),
            times = times.len(),
            nlat = lats.len(),
            nlon = lons.len(),
            "Loaded clipped MSM region"
        );

        let full = (times.len(), all_lats.len(), all_lons.len());
        let low = read_layer(&file, CloudLayer::Low, full, &lat_range, &lon_range)?;
        let mid = read_layer(&file, CloudLayer::Mid, full, &lat_range, &lon_range)?;
        let upper = read_layer(&file, CloudLayer::Upper, full, &lat_range, &lon_range)?;

        Self::from_parts(times, lats, lons, low, mid, upper)
    }

    /// Assemble a dataset from raw parts, validating the geometry.
    ///
    /// Primarily for synthetic datasets in tests, but part of the public API
    /// since the renderer is agnostic to where the grids came from.
    pub fn from_parts(
        times: Vec<DateTime<Utc>>,
        lats: Vec<f64>,
        lons: Vec<f64>,
        low: Vec<f32>,
        mid: Vec<f32>,
        upper: Vec<f32>,
    ) -> DatasetResult<Self> {
        let expected = times.len() * lats.len() * lons.len();
        for (name, data) in [("low", &low), ("mid", &mid), ("upper", &upper)] {
            if data.len() != expected {
                return Err(DatasetError::InvalidFormat(format!(
                    "{name} layer has {} values, expected {expected}",
                    data.len()
                )));
            }
        }
        if lats.is_empty() || lons.is_empty() {
            return Err(DatasetError::EmptyRegion("empty spatial axes".to_string()));
        }

        Ok(Self {
            times,
            lats,
            lons,
            low,
            mid,
            upper,
        })
    }

    pub fn times(&self) -> &[DateTime<Utc>] {
        &self.times
    }

    pub fn lats(&self) -> &[f64] {
        &self.lats
    }

    pub fn lons(&self) -> &[f64] {
        &self.lons
    }

    /// Grid dimensions as (nlat, nlon).
    pub fn grid_size(&self) -> (usize, usize) {
        (self.lats.len(), self.lons.len())
    }

    /// The (nlat × nlon) cloud-fraction slice for one layer and time index.
    pub fn layer_slice(&self, layer: CloudLayer, t: usize) -> &[f32] {
        let frame = self.lats.len() * self.lons.len();
        let data = match layer {
            CloudLayer::Low => &self.low,
            CloudLayer::Mid => &self.mid,
            CloudLayer::Upper => &self.upper,
        };
        &data[t * frame..(t + 1) * frame]
    }

    /// Keep only the time indices in `keep` (ascending, deduplicated).
    fn retain_time_indices(&mut self, keep: &[usize]) {
        let frame = self.lats.len() * self.lons.len();
        let pick = |data: &Vec<f32>| -> Vec<f32> {
            let mut out = Vec::with_capacity(keep.len() * frame);
            for &t in keep {
                out.extend_from_slice(&data[t * frame..(t + 1) * frame]);
            }
            out
        };

        self.low = pick(&self.low);
        self.mid = pick(&self.mid);
        self.upper = pick(&self.upper);
        self.times = keep.iter().map(|&t| self.times[t]).collect();
    }
}

// =============================================================================
// NetCDF reading helpers
// =============================================================================

fn read_time_axis(file: &netcdf::File) -> DatasetResult<Vec<DateTime<Utc>>> {
    let var = file
        .variable("time")
        .ok_or_else(|| DatasetError::MissingData("time variable".to_string()))?;

    let raw: Vec<f64> = var
        .get_values(..)
        .map_err(|e| DatasetError::InvalidFormat(format!("failed to read time axis: {e}")))?;

    let units = get_str_attr(&var, "units")
        .ok_or_else(|| DatasetError::MissingData("time units attribute".to_string()))?;
    let (base, step_seconds) = parse_time_units(&units)?;

    Ok(raw
        .iter()
        .map(|&v| base + Duration::seconds((v * step_seconds) as i64))
        .collect())
}

/// Parse a CF-style time units string, e.g.
/// `hours since 2025-12-19 00:00:00+00:00`.
fn parse_time_units(units: &str) -> DatasetResult<(DateTime<Utc>, f64)> {
    let (unit, rest) = units
        .split_once(" since ")
        .ok_or_else(|| DatasetError::InvalidFormat(format!("unparseable time units '{units}'")))?;

    let step_seconds = match unit.trim() {
        "hours" | "hour" => 3600.0,
        "minutes" | "minute" => 60.0,
        "seconds" | "second" => 1.0,
        "days" | "day" => 86400.0,
        other => {
            return Err(DatasetError::InvalidFormat(format!(
                "unsupported time unit '{other}'"
            )))
        }
    };

    let rest = rest.trim();

    // With explicit offset first, then naive forms assumed UTC.
    if let Ok(dt) = DateTime::parse_from_str(rest, "%Y-%m-%d %H:%M:%S%:z") {
        return Ok((dt.with_timezone(&Utc), step_seconds));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(rest.trim_end_matches('Z'), format) {
            return Ok((Utc.from_utc_datetime(&ndt), step_seconds));
        }
    }

    Err(DatasetError::InvalidFormat(format!(
        "unparseable time base '{rest}'"
    )))
}

fn read_axis_f64(file: &netcdf::File, name: &str) -> DatasetResult<Vec<f64>> {
    let var = file
        .variable(name)
        .ok_or_else(|| DatasetError::MissingData(format!("{name} variable")))?;
    var.get_values(..)
        .map_err(|e| DatasetError::InvalidFormat(format!("failed to read {name}: {e}")))
}

fn read_layer(
    file: &netcdf::File,
    layer: CloudLayer,
    full: (usize, usize, usize),
    lat_range: &std::ops::Range<usize>,
    lon_range: &std::ops::Range<usize>,
) -> DatasetResult<Vec<f32>> {
    let name = layer.variable();
    let var = file
        .variable(name)
        .ok_or_else(|| DatasetError::MissingData(format!("{name} variable")))?;

    // Read raw values for the full grid using (..) to cover all extents.
    let raw: Vec<f32> = var
        .get_values(..)
        .map_err(|e| DatasetError::InvalidFormat(format!("failed to read {name}: {e}")))?;

    let (ntime, nlat, nlon) = full;
    if raw.len() != ntime * nlat * nlon {
        return Err(DatasetError::InvalidFormat(format!(
            "{name} yielded {} values, expected {}",
            raw.len(),
            ntime * nlat * nlon
        )));
    }

    // Packed variables carry scale/offset; plain ones default to identity.
    let scale = get_f32_attr(&var, "scale_factor").unwrap_or(1.0);
    let offset = get_f32_attr(&var, "add_offset").unwrap_or(0.0);
    let fill = get_f32_attr(&var, "_FillValue");

    let mut clipped = Vec::with_capacity(ntime * lat_range.len() * lon_range.len());
    for t in 0..ntime {
        for y in lat_range.clone() {
            let row = (t * nlat + y) * nlon;
            for x in lon_range.clone() {
                let v = raw[row + x];
                clipped.push(match fill {
                    Some(f) if v == f => f32::NAN,
                    _ => v * scale + offset,
                });
            }
        }
    }
    Ok(clipped)
}

/// Index range of the contiguous run of axis values satisfying `pred`.
fn contiguous_range<F: Fn(f64) -> bool>(axis: &[f64], pred: F) -> Option<std::ops::Range<usize>> {
    let start = axis.iter().position(|&v| pred(v))?;
    let end = start
        + axis[start..]
            .iter()
            .take_while(|&&v| pred(v))
            .count();
    Some(start..end)
}

fn has_attr(var: &netcdf::Variable, name: &str) -> bool {
    var.attributes().any(|attr| attr.name() == name)
}

fn get_f32_attr(var: &netcdf::Variable, name: &str) -> Option<f32> {
    if !has_attr(var, name) {
        return None;
    }
    let value = var.attribute_value(name)?.ok()?;
    f32::try_from(value).ok()
}

fn get_str_attr(var: &netcdf::Variable, name: &str) -> Option<String> {
    if !has_attr(var, name) {
        return None;
    }
    match var.attribute_value(name)?.ok()? {
        netcdf::AttributeValue::Str(s) => Some(s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parse_time_units_with_offset() {
        let (base, step) = parse_time_units("hours since 2025-12-19 00:00:00+00:00").unwrap();
        assert_eq!(base, Utc.with_ymd_and_hms(2025, 12, 19, 0, 0, 0).unwrap());
        assert_eq!(step, 3600.0);
    }

    #[test]
    fn parse_time_units_naive_assumed_utc() {
        let (base, step) = parse_time_units("seconds since 2025-01-01 12:00:00").unwrap();
        assert_eq!(base, Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap());
        assert_eq!(step, 1.0);
    }

    #[test]
    fn parse_time_units_rejects_garbage() {
        assert!(parse_time_units("fortnights since whenever").is_err());
        assert!(parse_time_units("2025-01-01").is_err());
    }

    #[test]
    fn contiguous_range_on_descending_axis() {
        let lats = [39.0, 38.0, 37.0, 36.0, 35.0, 34.0, 33.0];
        let range = contiguous_range(&lats, |v| (33.5..=37.5).contains(&v)).unwrap();
        assert_eq!(range, 2..6); // 37, 36, 35, 34
    }

    #[test]
    fn from_parts_validates_layer_length() {
        let times = vec![Utc.with_ymd_and_hms(2025, 12, 19, 0, 0, 0).unwrap()];
        let lats = vec![36.0, 35.0];
        let lons = vec![137.0, 138.0];
        let good = vec![0.0f32; 4];
        let bad = vec![0.0f32; 3];

        assert!(CloudDataset::from_parts(
            times.clone(),
            lats.clone(),
            lons.clone(),
            good.clone(),
            good.clone(),
            bad
        )
        .is_err());
        let ds =
            CloudDataset::from_parts(times, lats, lons, good.clone(), good.clone(), good).unwrap();
        assert_eq!(ds.grid_size(), (2, 2));
        assert_eq!(ds.layer_slice(CloudLayer::Low, 0).len(), 4);
    }
}
