//! Fixed geographic overlays: peak markers, named range boxes, coastline.
//!
//! The peak list covers the Hyakumeizan-class summits inside the target
//! window. Coordinates are (lat, lon) in degrees; entries outside the
//! rendered bounding box are skipped at draw time.

use gpv_common::BoundingBox;

/// Named summits marked with hollow triangles.
pub const PEAKS: &[(&str, f64, f64)] = &[
    // Hokuriku / Shin'etsu
    ("Amakazari", 36.9022, 137.9619),
    ("Yakeyama", 36.9200, 138.0361),
    ("Hiuchi", 36.9214, 138.0750),
    ("Myoko", 36.8886, 138.1136),
    ("Takatsuma", 36.7967, 138.0519),
    ("Hakusan", 36.1550, 136.7663),
    ("Arashima", 35.9250, 136.6014),
    // Northern Alps
    ("Shirouma", 36.7586, 137.7580),
    ("Goryu", 36.6625, 137.7522),
    ("Kashimayari", 36.6225, 137.7478),
    ("Tsurugi", 36.6225, 137.6171),
    ("Tateyama", 36.5786, 137.6212),
    ("Yakushi", 36.4689, 137.5450),
    ("Kurobegoro", 36.3917, 137.5403),
    ("Suisho", 36.4253, 137.6019),
    ("Washiba", 36.4022, 137.6033),
    ("Yari", 36.3421, 137.6477),
    ("Hotaka", 36.2892, 137.6480),
    ("Jonen", 36.3253, 137.7275),
    ("Kasa", 36.3150, 137.5497),
    ("Yakedake", 36.2267, 137.5875),
    ("Norikura", 36.1064, 137.5539),
    // Central highlands and free-standing peaks
    ("Ontake", 35.8939, 137.4803),
    ("Utsukushigahara", 36.2256, 138.1072),
    ("Kirigamine", 36.1033, 138.1983),
    ("Tateshina", 36.1036, 138.2978),
    ("Yatsugatake", 35.9708, 138.3685),
    ("Kisokoma", 35.7892, 137.8122),
    ("Utsugi", 35.7196, 137.8115),
    ("Ena", 35.4428, 137.5975),
    // Southern Alps
    ("Kaikoma", 35.7522, 138.2367),
    ("Senjo", 35.7214, 138.1831),
    ("Hoo", 35.7022, 138.3039),
    ("Kitadake", 35.6744, 138.2388),
    ("Ainodake", 35.6459, 138.2238),
    ("Shiomi", 35.5739, 138.1831),
    ("Warusawa", 35.5011, 138.1828),
    ("Akaishi", 35.4623, 138.1634),
    ("Hijiri", 35.4222, 138.1392),
    ("Tekari", 35.3375, 138.0831),
    // Tokai
    ("Fuji", 35.3606, 138.7274),
    ("Amagi", 34.8600, 138.9583),
    // Kinki
    ("Ibuki", 35.4175, 136.4061),
    ("Bunagatake", 35.2608, 135.8953),
    ("Gozaisho", 35.0189, 136.4211),
    ("Fujiwara", 35.1742, 136.4442),
    ("Ryugatake", 35.1436, 136.4258),
    ("Shakagatake", 35.0864, 136.4331),
    ("Amagoi", 35.0319, 136.3881),
    ("Kamagatake", 35.0039, 136.4183),
    ("Nyudogatake", 34.9814, 136.4314),
    ("Odaigahara", 34.1751, 136.1158),
    ("Omine", 34.2536, 135.9328),
];

/// Translucent fill applied to range boxes.
pub const RANGE_ALPHA: f32 = 0.15;

/// A labeled rectangular highlight for a mountain range.
pub struct RangeOverlay {
    pub name: &'static str,
    /// Corners as (lon, lat), in drawing order.
    pub corners: [(f64, f64); 4],
    pub color: [u8; 3],
}

impl RangeOverlay {
    pub fn center(&self) -> (f64, f64) {
        let lat = self.corners.iter().map(|c| c.1).sum::<f64>() / 4.0;
        let lon = self.corners.iter().map(|c| c.0).sum::<f64>() / 4.0;
        (lat, lon)
    }
}

pub const RANGES: &[RangeOverlay] = &[
    RangeOverlay {
        name: "Kita Alps",
        corners: [
            (137.45, 36.8),
            (137.85, 36.8),
            (137.85, 36.0),
            (137.45, 36.0),
        ],
        color: [0, 255, 255],
    },
    RangeOverlay {
        name: "Chuo Alps",
        corners: [
            (137.70, 35.9),
            (137.90, 35.9),
            (137.90, 35.4),
            (137.70, 35.4),
        ],
        color: [255, 0, 255],
    },
    RangeOverlay {
        name: "Minami Alps",
        corners: [
            (138.00, 35.8),
            (138.40, 35.8),
            (138.40, 35.2),
            (138.00, 35.2),
        ],
        color: [255, 255, 0],
    },
];

/// Coarse coastline polylines as (lon, lat) sequences, digitized for the
/// target window only. Enough to orient the viewer, not survey-grade.
pub const COASTLINE: &[&[(f64, f64)]] = &[
    // Pacific side: Kii Peninsula, Ise Bay, Enshu coast, Suruga Bay, Izu.
    &[
        (135.50, 34.65),
        (135.60, 34.30),
        (135.80, 33.70),
        (136.00, 33.60),
        (136.30, 34.00),
        (136.55, 34.25),
        (136.90, 34.30),
        (136.85, 34.45),
        (136.60, 34.60),
        (136.55, 34.85),
        (136.65, 35.05),
        (136.85, 35.00),
        (136.90, 34.75),
        (137.05, 34.60),
        (137.30, 34.65),
        (137.60, 34.62),
        (137.90, 34.65),
        (138.22, 34.60),
        (138.28, 34.90),
        (138.40, 35.05),
        (138.55, 35.00),
        (138.75, 34.95),
        (138.85, 34.70),
        (138.88, 34.60),
        (139.00, 34.65),
        (139.15, 34.90),
        (139.10, 35.05),
        (139.25, 35.18),
        (139.50, 35.30),
        (139.72, 35.28),
        (139.82, 35.50),
        (140.00, 35.62),
    ],
    // Sea of Japan side: Wakasa Bay up to the Noto approach.
    &[
        (135.50, 35.50),
        (135.75, 35.50),
        (135.95, 35.55),
        (136.05, 35.65),
        (136.02, 35.78),
        (136.12, 36.10),
        (136.35, 36.30),
        (136.60, 36.60),
        (136.70, 36.90),
        (136.78, 37.15),
        (136.95, 37.30),
        (137.35, 37.50),
    ],
    // Toyama Bay and the Niigata coast.
    &[
        (137.00, 36.80),
        (137.35, 36.75),
        (137.65, 36.90),
        (138.00, 37.10),
        (138.30, 37.30),
        (138.55, 37.45),
        (138.72, 37.50),
    ],
];

/// Peaks falling inside the rendered window.
pub fn peaks_within(bbox: &BoundingBox) -> impl Iterator<Item = &'static (&'static str, f64, f64)> + '_ {
    PEAKS.iter().filter(move |(_, lat, lon)| bbox.contains(*lat, *lon))
}
