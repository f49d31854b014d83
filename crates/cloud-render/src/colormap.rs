//! Discrete color ramps for cloud-fraction shading.
//!
//! Cloud cover is binned into 10% steps starting at 10%; anything below the
//! first level stays transparent. Each layer gets its own single-hue ramp so
//! the combined view reads as additive RGB: blue = low, green = mid,
//! red = upper.

use msm_dataset::CloudLayer;

/// First shaded level in percent. Values below stay transparent.
pub const MIN_LEVEL: f32 = 10.0;

/// Opacity applied to every shaded bin.
pub const RAMP_ALPHA: f32 = 0.8;

const LOW_RAMP: [u32; 10] = [
    0x000033, 0x000055, 0x000077, 0x0000AA, 0x0000CC,
    0x0000EE, 0x1111FF, 0x3333FF, 0x5555FF, 0x7777FF,
];

const MID_RAMP: [u32; 10] = [
    0x003300, 0x005500, 0x007700, 0x00AA00, 0x00CC00,
    0x00EE00, 0x11FF11, 0x33FF33, 0x55FF55, 0x77FF77,
];

const UPPER_RAMP: [u32; 10] = [
    0x330000, 0x550000, 0x770000, 0xAA0000, 0xCC0000,
    0xEE0000, 0xFF1111, 0xFF3333, 0xFF5555, 0xFF7777,
];

fn ramp_for(layer: CloudLayer) -> &'static [u32; 10] {
    match layer {
        CloudLayer::Low => &LOW_RAMP,
        CloudLayer::Mid => &MID_RAMP,
        CloudLayer::Upper => &UPPER_RAMP,
    }
}

/// Map a cloud-fraction percentage to its ramp color, or `None` when the
/// value is below the first level (or NaN).
pub fn shade(layer: CloudLayer, percent: f32) -> Option<[u8; 3]> {
    if percent.is_nan() || percent < MIN_LEVEL {
        return None;
    }
    // 10-19% -> bin 0, 20-29% -> bin 1, ..., >=100% -> bin 9.
    let bin = (((percent / 10.0).floor() as usize).saturating_sub(1)).min(9);
    let packed = ramp_for(layer)[bin];
    Some([(packed >> 16) as u8, (packed >> 8) as u8, packed as u8])
}

/// Representative legend color for a layer (brightest bin).
pub fn legend_color(layer: CloudLayer) -> [u8; 3] {
    let packed = ramp_for(layer)[9];
    [(packed >> 16) as u8, (packed >> 8) as u8, packed as u8]
}
