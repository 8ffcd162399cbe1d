//! Sobel edge detection over image luminance.
//!
//! Luminance is the unweighted mean of the red, green and blue channels.
//! The gradient is taken with the two 3x3 Sobel kernels and the edge map
//! stores `sqrt(gx^2 + gy^2)` per pixel. The outermost pixel ring has no
//! full neighbourhood and is left at zero.

use image::RgbaImage;

use crate::geometry::Rect;

/// Per-pixel edge magnitudes with the same dimensions as the source image.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeMap {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl EdgeMap {
    fn zeroed(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; width as usize * height as usize],
        }
    }

    /// Map width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Map height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw magnitudes, row-major (`y * width + x`).
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Magnitude at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinate lies outside the map.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> f32 {
        assert!(
            x < self.width && y < self.height,
            "({x}, {y}) outside {}x{} edge map",
            self.width,
            self.height
        );
        self.data[y as usize * self.width as usize + x as usize]
    }

    /// Number of pixels inside `rect` whose magnitude exceeds `threshold`.
    ///
    /// The rectangle is clipped to the map.
    #[must_use]
    pub fn count_above(&self, rect: Rect, threshold: f32) -> usize {
        let x1 = rect.right().min(self.width) as usize;
        let y1 = rect.bottom().min(self.height) as usize;
        let x0 = (rect.x as usize).min(x1);
        let w = self.width as usize;

        (rect.y as usize..y1)
            .map(|y| {
                self.data[y * w + x0..y * w + x1]
                    .iter()
                    .filter(|&&m| m > threshold)
                    .count()
            })
            .sum()
    }
}

/// Unweighted channel mean of every pixel, row-major.
fn luminance(image: &RgbaImage) -> Vec<f32> {
    image
        .pixels()
        .map(|px| (f32::from(px[0]) + f32::from(px[1]) + f32::from(px[2])) / 3.0)
        .collect()
}

/// Compute the Sobel edge magnitude map of an image.
///
/// Images narrower or shorter than 3 pixels have no interior and produce an
/// all-zero map of the same size.
#[must_use]
pub fn detect_edges(image: &RgbaImage) -> EdgeMap {
    let (width, height) = image.dimensions();
    let mut map = EdgeMap::zeroed(width, height);
    if width < 3 || height < 3 {
        return map;
    }

    let gray = luminance(image);
    let w = width as usize;
    let h = height as usize;

    for y in 1..h - 1 {
        for x in 1..w - 1 {
            // y >= 1 and x >= 1, offsets are in {-1, 0, 1}.
            let at = |dy: usize, dx: usize| -> f32 { gray[(y + dy - 1) * w + (x + dx - 1)] };

            let gx = -at(0, 0) + at(0, 2) - 2.0 * at(1, 0) + 2.0 * at(1, 2) - at(2, 0) + at(2, 2);
            let gy = -at(0, 0) - 2.0 * at(0, 1) - at(0, 2) + at(2, 0) + 2.0 * at(2, 1) + at(2, 2);

            map.data[y * w + x] = (gx * gx + gy * gy).sqrt();
        }
    }

    log::trace!("edge map computed for {width}x{height} image");
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid(w: u32, h: u32, rgb: [u8; 3]) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba([rgb[0], rgb[1], rgb[2], 255]))
    }

    #[test]
    fn dimensions_match_source() {
        let img = solid(17, 9, [10, 20, 30]);
        let edges = detect_edges(&img);
        assert_eq!(edges.width(), 17);
        assert_eq!(edges.height(), 9);
        assert_eq!(edges.as_slice().len(), 17 * 9);
    }

    #[test]
    fn flat_image_has_no_edges() {
        let edges = detect_edges(&solid(10, 10, [200, 200, 200]));
        assert!(edges.as_slice().iter().all(|&m| m.abs() < 1e-6));
    }

    #[test]
    fn vertical_step_is_detected_and_border_stays_zero() {
        let mut img = solid(10, 10, [0, 0, 0]);
        for y in 0..10 {
            for x in 5..10 {
                img.put_pixel(x, y, Rgba([255, 255, 255, 255]));
            }
        }
        let edges = detect_edges(&img);

        // Left column of the kernel sees 0, right column sees 255: gx = 4 * 255.
        assert!((edges.get(5, 5) - 1020.0).abs() < 1e-3);
        assert!((edges.get(4, 5) - 1020.0).abs() < 1e-3);
        assert!(edges.get(2, 5).abs() < 1e-6);

        for x in 0..10 {
            assert!(edges.get(x, 0).abs() < f32::EPSILON);
            assert!(edges.get(x, 9).abs() < f32::EPSILON);
        }
        for y in 0..10 {
            assert!(edges.get(0, y).abs() < f32::EPSILON);
            assert!(edges.get(9, y).abs() < f32::EPSILON);
        }
    }

    #[test]
    fn alpha_channel_is_ignored() {
        let mut img = solid(5, 5, [100, 100, 100]);
        img.put_pixel(2, 2, Rgba([100, 100, 100, 0]));
        let edges = detect_edges(&img);
        assert!(edges.as_slice().iter().all(|&m| m.abs() < 1e-6));
    }

    #[test]
    fn degenerate_images_produce_zero_maps() {
        for (w, h) in [(2, 50), (50, 2), (1, 1)] {
            let mut img = solid(w, h, [0, 0, 0]);
            img.put_pixel(0, 0, Rgba([255, 255, 255, 255]));
            let edges = detect_edges(&img);
            assert_eq!(edges.as_slice().len(), (w * h) as usize);
            assert!(edges.as_slice().iter().all(|&m| m.abs() < f32::EPSILON));
        }
    }

    #[test]
    fn count_above_respects_rect_and_threshold() {
        let mut img = solid(10, 10, [0, 0, 0]);
        for y in 0..10 {
            for x in 5..10 {
                img.put_pixel(x, y, Rgba([255, 255, 255, 255]));
            }
        }
        let edges = detect_edges(&img);
        // Columns 4 and 5 carry the step on interior rows 1..=8.
        assert_eq!(edges.count_above(Rect::new(0, 0, 10, 10), 30.0), 16);
        assert_eq!(edges.count_above(Rect::new(0, 0, 5, 10), 30.0), 8);
        assert_eq!(edges.count_above(Rect::new(0, 0, 4, 10), 30.0), 0);
        assert_eq!(edges.count_above(Rect::new(0, 0, 10, 10), 5000.0), 0);
    }
}
