//! Geographic bounding box.

use serde::{Deserialize, Serialize};

/// A latitude/longitude rectangle, coordinates in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    /// Width in degrees of longitude.
    pub fn width(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    /// Height in degrees of latitude.
    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    /// Whether the given point lies inside (inclusive) the box.
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lon >= self.min_lon && lon <= self.max_lon
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_is_inclusive() {
        let bbox = BoundingBox::new(135.5, 33.5, 140.0, 37.5);
        assert!(bbox.contains(33.5, 135.5));
        assert!(bbox.contains(37.5, 140.0));
        assert!(bbox.contains(35.36, 138.72)); // Mt. Fuji
        assert!(!bbox.contains(38.0, 137.0));
        assert!(!bbox.contains(35.0, 130.0));
    }

    #[test]
    fn dimensions() {
        let bbox = BoundingBox::new(135.5, 33.5, 140.0, 37.5);
        assert_eq!(bbox.width(), 4.5);
        assert_eq!(bbox.height(), 4.0);
    }
}
