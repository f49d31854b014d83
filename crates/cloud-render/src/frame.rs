//! Per-timestep frame composition.
//!
//! Draw order, bottom to top: black background, translucent range boxes and
//! their labels, graticule, cloud shading (low, mid, upper), coastline,
//! peak markers, then caption and legend.

use chrono::{DateTime, FixedOffset, Utc};
use image::RgbaImage;

use gpv_common::BoundingBox;
use msm_dataset::{CloudDataset, CloudLayer};

use crate::canvas::{
    black_canvas, blend_pixel, draw_line, draw_triangle_marker, fill_polygon, fill_rect,
    stroke_rect, MapTransform,
};
use crate::colormap::{legend_color, shade, RAMP_ALPHA};
use crate::overlays::{peaks_within, COASTLINE, RANGES, RANGE_ALPHA};
use crate::text::{draw_text, draw_text_centered, line_height, text_width};

pub const CANVAS_WIDTH: u32 = 840;
pub const CANVAS_HEIGHT: u32 = 600;

const MARGIN_LEFT: u32 = 50;
const MARGIN_RIGHT: u32 = 16;
const MARGIN_TOP: u32 = 64;
const MARGIN_BOTTOM: u32 = 36;

const WHITE: [u8; 3] = [255, 255, 255];
const GRID_GRAY: [u8; 3] = [128, 128, 128];

/// The four animation products, differing only in which layers they shade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    AllLayers,
    LowOnly,
    MidOnly,
    UpperOnly,
}

impl Variant {
    pub const ALL: [Variant; 4] = [
        Variant::AllLayers,
        Variant::LowOnly,
        Variant::MidOnly,
        Variant::UpperOnly,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Variant::AllLayers => "all_layers",
            Variant::LowOnly => "low_only",
            Variant::MidOnly => "mid_only",
            Variant::UpperOnly => "upper_only",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Variant::AllLayers => "All cloud layers",
            Variant::LowOnly => "Low clouds only",
            Variant::MidOnly => "Mid clouds only",
            Variant::UpperOnly => "Upper clouds only",
        }
    }

    /// Output file name for the finished animation.
    pub fn gif_filename(&self) -> String {
        format!("cloud_{}.gif", self.name())
    }

    /// Layers drawn for this variant, bottom to top.
    pub fn layers(&self) -> &'static [CloudLayer] {
        match self {
            Variant::AllLayers => &[CloudLayer::Low, CloudLayer::Mid, CloudLayer::Upper],
            Variant::LowOnly => &[CloudLayer::Low],
            Variant::MidOnly => &[CloudLayer::Mid],
            Variant::UpperOnly => &[CloudLayer::Upper],
        }
    }

    pub fn legend_lines(&self) -> &'static [&'static str] {
        match self {
            Variant::AllLayers => &[
                "Red: upper clouds (top)",
                "Green: mid clouds (middle)",
                "Blue: low clouds (bottom)",
                "Triangles: major peaks",
                "Upper layers draw on top",
            ],
            Variant::LowOnly => &[
                "Blue: low clouds",
                "(near the surface)",
                "Triangles: major peaks",
            ],
            Variant::MidOnly => &[
                "Green: mid clouds",
                "(mid altitude)",
                "Triangles: major peaks",
            ],
            Variant::UpperOnly => &[
                "Red: upper clouds",
                "(high altitude)",
                "Triangles: major peaks",
            ],
        }
    }
}

/// Viewer clock offset. Timestamps are stored in UTC and captioned in JST.
fn jst() -> FixedOffset {
    FixedOffset::east_opt(9 * 3600).unwrap()
}

/// Caption form of a forecast timestamp, e.g. `2025-12-19 14:00 JST`.
pub fn format_caption_time(t: DateTime<Utc>) -> String {
    t.with_timezone(&jst()).format("%Y-%m-%d %H:%M JST").to_string()
}

/// Render one frame of the animation for the given time index.
pub fn render_frame(dataset: &CloudDataset, bbox: &BoundingBox, t: usize, variant: Variant) -> RgbaImage {
    let mut img = black_canvas(CANVAS_WIDTH, CANVAS_HEIGHT);
    let plot = MapTransform::new(
        bbox,
        MARGIN_LEFT,
        MARGIN_TOP,
        CANVAS_WIDTH - MARGIN_LEFT - MARGIN_RIGHT,
        CANVAS_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM,
    );

    draw_range_boxes(&mut img, &plot);
    draw_graticule(&mut img, &plot, bbox);
    draw_cloud_layers(&mut img, &plot, bbox, dataset, t, variant);
    draw_coastline(&mut img, &plot);
    draw_peaks(&mut img, &plot, bbox);
    draw_caption(&mut img, dataset.times()[t], variant);
    draw_legend(&mut img, &plot, variant);

    img
}

fn draw_range_boxes(img: &mut RgbaImage, plot: &MapTransform) {
    for range in RANGES {
        let corners: Vec<(i64, i64)> = range
            .corners
            .iter()
            .map(|(lon, lat)| plot.to_pixel(*lat, *lon))
            .collect();
        fill_polygon(img, &corners, range.color, RANGE_ALPHA);
        for i in 0..corners.len() {
            draw_line(
                img,
                corners[i],
                corners[(i + 1) % corners.len()],
                2,
                range.color,
                RANGE_ALPHA,
            );
        }

        let (lat, lon) = range.center();
        let (cx, cy) = plot.to_pixel(lat, lon);
        draw_text_centered(img, range.name, cx, cy - line_height(1) as i64 / 2, 1, range.color, 0.7);
    }
}

fn draw_graticule(img: &mut RgbaImage, plot: &MapTransform, bbox: &BoundingBox) {
    let lon_start = bbox.min_lon.ceil() as i64;
    let lon_end = bbox.max_lon.floor() as i64;
    for lon in lon_start..=lon_end {
        let (x, _) = plot.to_pixel(bbox.min_lat, lon as f64);
        draw_line(
            img,
            (x, plot.y0 as i64),
            (x, (plot.y0 + plot.height - 1) as i64),
            1,
            GRID_GRAY,
            0.4,
        );
        let label = format!("{lon}E");
        draw_text_centered(
            img,
            &label,
            x,
            (plot.y0 + plot.height) as i64 + 6,
            1,
            WHITE,
            1.0,
        );
    }

    let lat_start = bbox.min_lat.ceil() as i64;
    let lat_end = bbox.max_lat.floor() as i64;
    for lat in lat_start..=lat_end {
        let (_, y) = plot.to_pixel(lat as f64, bbox.min_lon);
        draw_line(
            img,
            (plot.x0 as i64, y),
            ((plot.x0 + plot.width - 1) as i64, y),
            1,
            GRID_GRAY,
            0.4,
        );
        let label = format!("{lat}N");
        let w = text_width(&label, 1) as i64;
        draw_text(
            img,
            &label,
            plot.x0 as i64 - w - 6,
            y - line_height(1) as i64 / 2,
            1,
            WHITE,
            1.0,
        );
    }
}

/// Shade the selected layers by nearest-neighbor sampling of the grid.
fn draw_cloud_layers(
    img: &mut RgbaImage,
    plot: &MapTransform,
    bbox: &BoundingBox,
    dataset: &CloudDataset,
    t: usize,
    variant: Variant,
) {
    let lats = dataset.lats();
    let lons = dataset.lons();
    let (_, nlon) = dataset.grid_size();

    // Precompute the grid index for each pixel row and column.
    let row_of: Vec<usize> = (0..plot.height)
        .map(|py| {
            let frac = py as f64 / (plot.height.saturating_sub(1)).max(1) as f64;
            let lat = bbox.max_lat - frac * bbox.height();
            nearest_index(lats, lat)
        })
        .collect();
    let col_of: Vec<usize> = (0..plot.width)
        .map(|px| {
            let frac = px as f64 / (plot.width.saturating_sub(1)).max(1) as f64;
            let lon = bbox.min_lon + frac * bbox.width();
            nearest_index(lons, lon)
        })
        .collect();

    for &layer in variant.layers() {
        let grid = dataset.layer_slice(layer, t);
        for py in 0..plot.height {
            let row = row_of[py as usize];
            for px in 0..plot.width {
                let value = grid[row * nlon + col_of[px as usize]];
                if let Some(color) = shade(layer, value) {
                    blend_pixel(
                        img,
                        (plot.x0 + px) as i64,
                        (plot.y0 + py) as i64,
                        color,
                        RAMP_ALPHA,
                    );
                }
            }
        }
    }
}

fn nearest_index(axis: &[f64], value: f64) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (i, &v) in axis.iter().enumerate() {
        let d = (v - value).abs();
        if d < best_dist {
            best = i;
            best_dist = d;
        }
    }
    best
}

fn draw_coastline(img: &mut RgbaImage, plot: &MapTransform) {
    for line in COASTLINE {
        for pair in line.windows(2) {
            let a = plot.to_pixel(pair[0].1, pair[0].0);
            let b = plot.to_pixel(pair[1].1, pair[1].0);
            draw_line(img, a, b, 2, WHITE, 0.9);
        }
    }
}

fn draw_peaks(img: &mut RgbaImage, plot: &MapTransform, bbox: &BoundingBox) {
    for (_, lat, lon) in peaks_within(bbox) {
        let p = plot.to_pixel(*lat, *lon);
        if plot.contains_pixel(p.0, p.1) {
            draw_triangle_marker(img, p, 9, 2, WHITE, 1.0);
        }
    }
}

fn draw_caption(img: &mut RgbaImage, time: DateTime<Utc>, variant: Variant) {
    let cx = CANVAS_WIDTH as i64 / 2;
    draw_text_centered(img, variant.title(), cx, 10, 2, WHITE, 1.0);
    let time_str = format_caption_time(time);
    draw_text_centered(img, &time_str, cx, 10 + line_height(2) as i64 + 8, 2, WHITE, 1.0);
}

fn draw_legend(img: &mut RgbaImage, plot: &MapTransform, variant: Variant) {
    let lines = variant.legend_lines();
    let pad: i64 = 6;
    let gap: i64 = 3;
    let lh = line_height(1) as i64;

    let swatch = lh;
    let text_w = lines.iter().map(|l| text_width(l, 1)).max().unwrap_or(0) as i64;
    let box_w = (swatch + gap + text_w + 2 * pad) as u32;
    let box_h = (lines.len() as i64 * (lh + gap) - gap + 2 * pad) as u32;

    let x = plot.x0 as i64 + 8;
    let y = (plot.y0 + plot.height) as i64 - box_h as i64 - 8;

    fill_rect(img, x, y, box_w, box_h, [0, 0, 0], 0.8);
    stroke_rect(img, x, y, box_w, box_h, 2, WHITE, 1.0);

    // The first rows name the shaded layers, top layer first; each gets a
    // filled swatch in the layer's brightest ramp color.
    let layers = variant.layers();
    for (i, line) in lines.iter().enumerate() {
        let row_y = y + pad + i as i64 * (lh + gap);
        if i < layers.len() {
            let layer = layers[layers.len() - 1 - i];
            fill_rect(img, x + pad, row_y, swatch as u32, lh as u32, legend_color(layer), 1.0);
        }
        draw_text(img, line, x + pad + swatch + gap, row_y, 1, WHITE, 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn dataset_with_low_cloud() -> CloudDataset {
        // 2x2 grid inside the window, uniform 95% low cloud, clear elsewhere.
        let times = vec![Utc.with_ymd_and_hms(2025, 12, 19, 6, 0, 0).unwrap()];
        CloudDataset::from_parts(
            times,
            vec![36.0, 35.0],
            vec![137.0, 138.0],
            vec![95.0; 4],
            vec![0.0; 4],
            vec![0.0; 4],
        )
        .unwrap()
    }

    fn target() -> BoundingBox {
        BoundingBox::new(135.5, 33.5, 140.0, 37.5)
    }

    #[test]
    fn caption_time_is_jst() {
        let t = Utc.with_ymd_and_hms(2025, 12, 19, 6, 0, 0).unwrap();
        assert_eq!(format_caption_time(t), "2025-12-19 15:00 JST");
    }

    #[test]
    fn jst_conversion_crosses_midnight() {
        let t = Utc.with_ymd_and_hms(2025, 12, 31, 20, 0, 0).unwrap();
        assert_eq!(format_caption_time(t), "2026-01-01 05:00 JST");
    }

    #[test]
    fn low_only_frame_shades_blue_not_red() {
        let ds = dataset_with_low_cloud();
        let img = render_frame(&ds, &target(), 0, Variant::LowOnly);
        assert_eq!(img.width(), CANVAS_WIDTH);
        assert_eq!(img.height(), CANVAS_HEIGHT);

        // Sample well inside the cloud patch and away from overlays.
        let plot = MapTransform::new(
            &target(),
            MARGIN_LEFT,
            MARGIN_TOP,
            CANVAS_WIDTH - MARGIN_LEFT - MARGIN_RIGHT,
            CANVAS_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM,
        );
        let (x, y) = plot.to_pixel(35.5, 136.6);
        let px = img.get_pixel(x as u32, y as u32).0;
        assert!(px[2] > px[0], "expected blue-dominant pixel, got {px:?}");
    }

    #[test]
    fn upper_only_frame_ignores_low_cloud() {
        let ds = dataset_with_low_cloud();
        let img = render_frame(&ds, &target(), 0, Variant::UpperOnly);
        let plot = MapTransform::new(
            &target(),
            MARGIN_LEFT,
            MARGIN_TOP,
            CANVAS_WIDTH - MARGIN_LEFT - MARGIN_RIGHT,
            CANVAS_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM,
        );
        let (x, y) = plot.to_pixel(34.2, 137.2);
        let px = img.get_pixel(x as u32, y as u32).0;
        // Upper layer is clear, so no red shading appears there.
        assert!(px[0] < 32, "unexpected red shading: {px:?}");
    }

    #[test]
    fn legend_carries_a_layer_swatch() {
        let ds = dataset_with_low_cloud();
        let img = render_frame(&ds, &target(), 0, Variant::LowOnly);

        // The swatch is drawn opaque on top of everything, so the exact
        // brightest ramp color must appear somewhere in the frame. Shaded
        // cloud pixels cannot produce it (they blend at partial alpha).
        let [r, g, b] = legend_color(CloudLayer::Low);
        let found = img.pixels().any(|p| p.0 == [r, g, b, 255]);
        assert!(found, "no legend swatch pixel in the frame");
    }

    #[test]
    fn variant_filenames_are_distinct() {
        let names: std::collections::HashSet<_> =
            Variant::ALL.iter().map(|v| v.gif_filename()).collect();
        assert_eq!(names.len(), 4);
        assert!(names.contains("cloud_all_layers.gif"));
    }
}
