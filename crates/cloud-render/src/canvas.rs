//! Low-level drawing primitives on an RGBA canvas.

use image::{Rgba, RgbaImage};

use gpv_common::BoundingBox;

/// Maps geographic coordinates to pixel positions within a plot rectangle.
///
/// Equirectangular: x grows with longitude, y grows southward so north is up.
#[derive(Debug, Clone, Copy)]
pub struct MapTransform {
    pub x0: u32,
    pub y0: u32,
    pub width: u32,
    pub height: u32,
    min_lon: f64,
    min_lat: f64,
    lon_span: f64,
    lat_span: f64,
}

impl MapTransform {
    pub fn new(bbox: &BoundingBox, x0: u32, y0: u32, width: u32, height: u32) -> Self {
        Self {
            x0,
            y0,
            width,
            height,
            min_lon: bbox.min_lon,
            min_lat: bbox.min_lat,
            lon_span: bbox.width(),
            lat_span: bbox.height(),
        }
    }

    /// Pixel position of a geographic point. May fall outside the plot area.
    pub fn to_pixel(&self, lat: f64, lon: f64) -> (i64, i64) {
        let fx = (lon - self.min_lon) / self.lon_span;
        let fy = 1.0 - (lat - self.min_lat) / self.lat_span;
        (
            self.x0 as i64 + (fx * (self.width.saturating_sub(1)) as f64).round() as i64,
            self.y0 as i64 + (fy * (self.height.saturating_sub(1)) as f64).round() as i64,
        )
    }

    pub fn contains_pixel(&self, x: i64, y: i64) -> bool {
        x >= self.x0 as i64
            && y >= self.y0 as i64
            && x < (self.x0 + self.width) as i64
            && y < (self.y0 + self.height) as i64
    }
}

/// Alpha-blend `color` over the existing pixel at (x, y).
///
/// Out-of-bounds coordinates are silently ignored so callers can draw
/// geometry that straddles the canvas edge.
pub fn blend_pixel(img: &mut RgbaImage, x: i64, y: i64, color: [u8; 3], alpha: f32) {
    if x < 0 || y < 0 || x >= img.width() as i64 || y >= img.height() as i64 {
        return;
    }
    let px = img.get_pixel_mut(x as u32, y as u32);
    let a = alpha.clamp(0.0, 1.0);
    for c in 0..3 {
        let base = px.0[c] as f32;
        px.0[c] = (color[c] as f32 * a + base * (1.0 - a)).round() as u8;
    }
    px.0[3] = 255;
}

/// Fill an axis-aligned rectangle, blending with the background.
pub fn fill_rect(img: &mut RgbaImage, x: i64, y: i64, w: u32, h: u32, color: [u8; 3], alpha: f32) {
    for dy in 0..h as i64 {
        for dx in 0..w as i64 {
            blend_pixel(img, x + dx, y + dy, color, alpha);
        }
    }
}

/// Rectangle outline with the given stroke width.
pub fn stroke_rect(
    img: &mut RgbaImage,
    x: i64,
    y: i64,
    w: u32,
    h: u32,
    thickness: u32,
    color: [u8; 3],
    alpha: f32,
) {
    if w == 0 || h == 0 {
        return;
    }
    let t = thickness.clamp(1, (w / 2).max(1)).min((h / 2).max(1));
    let inner = h.saturating_sub(2 * t);
    fill_rect(img, x, y, w, t, color, alpha);
    fill_rect(img, x, y + h as i64 - t as i64, w, t, color, alpha);
    fill_rect(img, x, y + t as i64, t, inner, color, alpha);
    fill_rect(img, x + w as i64 - t as i64, y + t as i64, t, inner, color, alpha);
}

/// Bresenham line with a square brush of the given thickness.
pub fn draw_line(
    img: &mut RgbaImage,
    (x0, y0): (i64, i64),
    (x1, y1): (i64, i64),
    thickness: u32,
    color: [u8; 3],
    alpha: f32,
) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    let (mut x, mut y) = (x0, y0);
    let r = thickness as i64 / 2;

    loop {
        for by in -r..=r {
            for bx in -r..=r {
                blend_pixel(img, x + bx, y + by, color, alpha);
            }
        }
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

/// Scanline fill of a simple polygon given in pixel coordinates.
pub fn fill_polygon(img: &mut RgbaImage, points: &[(i64, i64)], color: [u8; 3], alpha: f32) {
    if points.len() < 3 {
        return;
    }
    let y_min = points.iter().map(|p| p.1).min().unwrap_or(0);
    let y_max = points.iter().map(|p| p.1).max().unwrap_or(0);

    for y in y_min..=y_max {
        // Even-odd rule against the horizontal scanline at y + 0.5.
        let mut crossings: Vec<f64> = Vec::new();
        let scan = y as f64 + 0.5;
        for i in 0..points.len() {
            let (x1, y1) = points[i];
            let (x2, y2) = points[(i + 1) % points.len()];
            let (y1, y2) = (y1 as f64, y2 as f64);
            if (y1 <= scan && y2 > scan) || (y2 <= scan && y1 > scan) {
                let t = (scan - y1) / (y2 - y1);
                crossings.push(x1 as f64 + t * (x2 - x1) as f64);
            }
        }
        crossings.sort_by(|a, b| a.partial_cmp(b).unwrap());
        for pair in crossings.chunks_exact(2) {
            let start = pair[0].round() as i64;
            let end = pair[1].round() as i64;
            for x in start..=end {
                blend_pixel(img, x, y, color, alpha);
            }
        }
    }
}

/// Hollow upward triangle marker centered at (cx, cy).
pub fn draw_triangle_marker(
    img: &mut RgbaImage,
    (cx, cy): (i64, i64),
    size: i64,
    thickness: u32,
    color: [u8; 3],
    alpha: f32,
) {
    let half = size / 2;
    let top = (cx, cy - half);
    let left = (cx - half, cy + half);
    let right = (cx + half, cy + half);
    draw_line(img, top, left, thickness, color, alpha);
    draw_line(img, top, right, thickness, color, alpha);
    draw_line(img, left, right, thickness, color, alpha);
}

/// Solid black canvas of the given size.
pub fn black_canvas(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox() -> BoundingBox {
        BoundingBox::new(135.5, 33.5, 140.0, 37.5)
    }

    #[test]
    fn transform_maps_corners() {
        let t = MapTransform::new(&bbox(), 10, 20, 101, 81);
        // Northwest corner -> top-left of the plot area.
        assert_eq!(t.to_pixel(37.5, 135.5), (10, 20));
        // Southeast corner -> bottom-right.
        assert_eq!(t.to_pixel(33.5, 140.0), (110, 100));
    }

    #[test]
    fn transform_north_is_up() {
        let t = MapTransform::new(&bbox(), 0, 0, 100, 100);
        let (_, y_north) = t.to_pixel(37.0, 137.0);
        let (_, y_south) = t.to_pixel(34.0, 137.0);
        assert!(y_north < y_south);
    }

    #[test]
    fn blend_full_alpha_replaces() {
        let mut img = black_canvas(4, 4);
        blend_pixel(&mut img, 1, 1, [200, 100, 50], 1.0);
        assert_eq!(img.get_pixel(1, 1).0, [200, 100, 50, 255]);
    }

    #[test]
    fn blend_out_of_bounds_is_noop() {
        let mut img = black_canvas(4, 4);
        blend_pixel(&mut img, -1, 0, [255, 255, 255], 1.0);
        blend_pixel(&mut img, 4, 4, [255, 255, 255], 1.0);
        assert!(img.pixels().all(|p| p.0 == [0, 0, 0, 255]));
    }

    #[test]
    fn fill_polygon_covers_interior() {
        let mut img = black_canvas(20, 20);
        fill_polygon(
            &mut img,
            &[(2, 2), (17, 2), (17, 17), (2, 17)],
            [0, 255, 255],
            1.0,
        );
        assert_eq!(img.get_pixel(10, 10).0, [0, 255, 255, 255]);
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0, 255]);
    }
}
