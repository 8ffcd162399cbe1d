//! Grid-based blank-space detection.
//!
//! The image is cut into a fixed 25x25 grid. Each cell is scored from its
//! colour statistics and edge density, blank cells are merged into maximal
//! rectangles, and slivers below 2% of the image size are dropped.
//!
//! The thresholds below are empirically tuned values.

use image::RgbaImage;

use crate::edges::EdgeMap;
use crate::geometry::Rect;

/// Number of grid cells along each axis.
pub const GRID_SIZE: u32 = 25;
/// Edge magnitude above which a pixel counts as an edge pixel.
pub const EDGE_THRESHOLD: f32 = 30.0;

/// Brightness above which a neutral pixel counts as paper white.
pub const BRIGHT_LEVEL: f64 = 240.0;
/// Maximum channel spread for a bright pixel to count as white.
pub const BRIGHT_MAX_CONTRAST: f64 = 15.0;
/// Cell variance below which the cell counts as uniformly coloured.
pub const UNIFORM_MAX_VARIANCE: f64 = 100.0;
/// Maximum brightness deviation from the cell mean in a uniform cell.
pub const UNIFORM_MAX_DEVIATION: f64 = 20.0;
/// Maximum brightness deviation for a pixel to match the cell background.
pub const BACKGROUND_MAX_DEVIATION: f64 = 10.0;
/// Maximum channel spread for a pixel to match the cell background.
pub const BACKGROUND_MAX_CONTRAST: f64 = 20.0;

/// Cell variance below which the lower base threshold applies.
pub const FLAT_VARIANCE: f64 = 50.0;
/// Base blank-fraction threshold for flat cells.
pub const BASE_THRESHOLD_FLAT: f64 = 0.85;
/// Base blank-fraction threshold for textured cells.
pub const BASE_THRESHOLD_TEXTURED: f64 = 0.90;
/// Edge density above which the threshold is raised.
pub const DENSE_EDGE_DENSITY: f64 = 0.10;
/// Edge density below which the threshold is lowered.
pub const SPARSE_EDGE_DENSITY: f64 = 0.02;
/// Threshold adjustment applied for dense or sparse edges.
pub const THRESHOLD_STEP: f64 = 0.05;
/// Upper cap after raising the threshold.
pub const MAX_THRESHOLD: f64 = 0.95;
/// Lower floor after lowering the threshold.
pub const MIN_THRESHOLD: f64 = 0.80;

/// Maximum gap in pixels between rectangles that still merge.
pub const ADJACENCY_GAP: u32 = 5;
/// Minimum size of a blank region as a fraction of each image dimension.
pub const NOISE_FRACTION: f64 = 0.02;

/// Statistics and verdict for one grid cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellClassification {
    /// The cell that was scored.
    pub cell: Rect,
    /// Mean of the per-channel averages.
    pub mean_brightness: f64,
    /// Mean squared deviation from the average colour, summed over channels.
    pub variance: f64,
    /// Fraction of pixels whose edge magnitude exceeds [`EDGE_THRESHOLD`].
    pub edge_density: f64,
    /// Fraction of pixels that look blank on their own.
    pub blank_fraction: f64,
    /// Fraction `blank_fraction` had to exceed.
    pub threshold: f64,
    /// Whether the cell is classified blank.
    pub is_blank: bool,
}

/// Partition a `width` x `height` image into the analysis grid.
///
/// Cells are `floor(width / GRID_SIZE)` by `floor(height / GRID_SIZE)`; the
/// last column and row extend to the image edge. Cells covering no pixels,
/// which happens for images smaller than the grid, are left out. Cells are
/// returned row by row.
#[must_use]
pub fn grid_cells(width: u32, height: u32) -> Vec<Rect> {
    let cell_w = width / GRID_SIZE;
    let cell_h = height / GRID_SIZE;
    let last = GRID_SIZE - 1;

    let span = |i: u32, step: u32, extent: u32| -> (u32, u32) {
        let start = i * step;
        let end = if i == last { extent } else { start + step };
        (start, end - start)
    };

    let mut cells = Vec::with_capacity((GRID_SIZE * GRID_SIZE) as usize);
    for gy in 0..GRID_SIZE {
        let (y, h) = span(gy, cell_h, height);
        for gx in 0..GRID_SIZE {
            let (x, w) = span(gx, cell_w, width);
            let cell = Rect::new(x, y, w, h);
            if !cell.is_empty() {
                cells.push(cell);
            }
        }
    }
    cells
}

fn cell_pixels(image: &RgbaImage, cell: Rect) -> impl Iterator<Item = [f64; 3]> + '_ {
    (cell.y..cell.bottom()).flat_map(move |y| {
        (cell.x..cell.right()).map(move |x| {
            let px = image.get_pixel(x, y);
            [f64::from(px[0]), f64::from(px[1]), f64::from(px[2])]
        })
    })
}

fn brightness([r, g, b]: [f64; 3]) -> f64 {
    (r + g + b) / 3.0
}

/// Largest pairwise channel difference.
fn contrast([r, g, b]: [f64; 3]) -> f64 {
    (r - g).abs().max((r - b).abs()).max((g - b).abs())
}

/// Blank-fraction threshold for a cell with the given variance and edge density.
#[must_use]
pub fn adaptive_threshold(variance: f64, edge_density: f64) -> f64 {
    let mut threshold = if variance < FLAT_VARIANCE {
        BASE_THRESHOLD_FLAT
    } else {
        BASE_THRESHOLD_TEXTURED
    };

    if edge_density > DENSE_EDGE_DENSITY {
        threshold = (threshold + THRESHOLD_STEP).min(MAX_THRESHOLD);
    }
    if edge_density < SPARSE_EDGE_DENSITY {
        threshold = (threshold - THRESHOLD_STEP).max(MIN_THRESHOLD);
    }
    threshold
}

/// Score a single grid cell.
///
/// `cell` must be non-empty and lie inside both the image and the edge map.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn classify_cell(image: &RgbaImage, edges: &EdgeMap, cell: Rect) -> CellClassification {
    let total = cell.area() as f64;

    let mut sum = [0.0_f64; 3];
    for px in cell_pixels(image, cell) {
        for (s, c) in sum.iter_mut().zip(px) {
            *s += c;
        }
    }
    let mean = sum.map(|s| s / total);
    let mean_brightness = brightness(mean);

    let variance = cell_pixels(image, cell)
        .map(|px| {
            px.iter()
                .zip(mean)
                .map(|(c, m)| (c - m).powi(2))
                .sum::<f64>()
        })
        .sum::<f64>()
        / total;

    let edge_density = edges.count_above(cell, EDGE_THRESHOLD) as f64 / total;

    let blank_pixels = cell_pixels(image, cell)
        .filter(|&px| {
            let b = brightness(px);
            let spread = contrast(px);
            let deviation = (b - mean_brightness).abs();

            let white = b > BRIGHT_LEVEL && spread < BRIGHT_MAX_CONTRAST;
            let uniform = variance < UNIFORM_MAX_VARIANCE && deviation < UNIFORM_MAX_DEVIATION;
            let background =
                deviation < BACKGROUND_MAX_DEVIATION && spread < BACKGROUND_MAX_CONTRAST;
            white || uniform || background
        })
        .count();

    let blank_fraction = blank_pixels as f64 / total;
    let threshold = adaptive_threshold(variance, edge_density);

    CellClassification {
        cell,
        mean_brightness,
        variance,
        edge_density,
        blank_fraction,
        threshold,
        is_blank: blank_fraction > threshold,
    }
}

/// Whether a grid cell is mostly blank. See [`classify_cell`].
#[must_use]
pub fn is_cell_blank(image: &RgbaImage, edges: &EdgeMap, cell: Rect) -> bool {
    classify_cell(image, edges, cell).is_blank
}

/// Merge overlapping or adjacent rectangles into their bounding boxes.
///
/// Scans pairs `(i, j)` with `i < j` in order; the first pair that touches
/// or sits within [`ADJACENCY_GAP`] pixels is replaced by its union at `i`
/// and the scan restarts. Stops after a full scan with no merge, at which
/// point no two remaining rectangles touch.
#[must_use]
pub fn merge_blank_areas(mut areas: Vec<Rect>) -> Vec<Rect> {
    'scan: loop {
        for i in 0..areas.len() {
            for j in i + 1..areas.len() {
                let (a, b) = (areas[i], areas[j]);
                if a.touches(&b) || a.is_adjacent(&b, ADJACENCY_GAP) {
                    areas[i] = a.union(&b);
                    areas.remove(j);
                    log::trace!("merged {a:?} + {b:?} -> {:?}", areas[i]);
                    continue 'scan;
                }
            }
        }
        return areas;
    }
}

/// Drop rectangles no wider than 2% of the image width or no taller than 2%
/// of the image height.
#[must_use]
pub fn filter_noise(areas: Vec<Rect>, width: u32, height: u32) -> Vec<Rect> {
    let min_w = f64::from(width) * NOISE_FRACTION;
    let min_h = f64::from(height) * NOISE_FRACTION;
    areas
        .into_iter()
        .filter(|r| f64::from(r.width) > min_w && f64::from(r.height) > min_h)
        .collect()
}

fn blank_cells(image: &RgbaImage, edges: &EdgeMap, cells: &[Rect]) -> Vec<Rect> {
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        cells
            .par_iter()
            .filter(|&&cell| is_cell_blank(image, edges, cell))
            .copied()
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        cells
            .iter()
            .filter(|&&cell| is_cell_blank(image, edges, cell))
            .copied()
            .collect()
    }
}

/// Find the blank regions of an image.
///
/// `edges` must be the edge map of `image`. The returned rectangles are
/// pairwise disjoint and in no particular order.
#[must_use]
pub fn detect_blank_regions(image: &RgbaImage, edges: &EdgeMap) -> Vec<Rect> {
    debug_assert_eq!(image.dimensions(), (edges.width(), edges.height()));
    let (width, height) = image.dimensions();

    let cells = grid_cells(width, height);
    let blank = blank_cells(image, edges, &cells);
    log::debug!("{} of {} grid cells blank", blank.len(), cells.len());

    let merged = merge_blank_areas(blank);
    let merged_count = merged.len();
    let regions = filter_noise(merged, width, height);
    log::debug!(
        "{merged_count} merged blank areas, {} after noise filter",
        regions.len()
    );
    regions
}
