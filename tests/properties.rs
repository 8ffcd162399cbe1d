//! Property-based tests for geometry, merging and edge detection.
//!
//! Invariants:
//! - Overlap area is symmetric and coverage stays within [0, 100]
//! - Merged rectangles are pairwise disjoint and cover every input
//! - The grid tiles the image exactly
//! - Edge maps match image size and keep a zero border

use certscan::blank::{grid_cells, merge_blank_areas};
use certscan::edges::detect_edges;
use certscan::{analyze, Bounds, Rect};
use image::{Rgba, RgbaImage};
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

fn arb_rect() -> impl Strategy<Value = Rect> {
    (0u32..400, 0u32..400, 1u32..200, 1u32..200).prop_map(|(x, y, w, h)| Rect::new(x, y, w, h))
}

fn arb_image() -> impl Strategy<Value = RgbaImage> {
    (1u32..48, 1u32..48).prop_flat_map(|(w, h)| {
        prop::collection::vec(any::<u8>(), (w * h * 4) as usize).prop_map(move |bytes| {
            RgbaImage::from_raw(w, h, bytes).expect("buffer sized for image")
        })
    })
}

/// Images made of a few flat blocks, which produce real blank regions.
fn arb_blocky_image() -> impl Strategy<Value = RgbaImage> {
    (
        50u32..160,
        50u32..160,
        prop::collection::vec((any::<u8>(), any::<bool>()), 16),
    )
        .prop_map(|(w, h, blocks)| {
            RgbaImage::from_fn(w, h, |x, y| {
                let idx = ((y * 4 / h) * 4 + (x * 4 / w)) as usize;
                let (level, noisy) = blocks[idx];
                if noisy && (x + y) % 3 == 0 {
                    Rgba([255 - level, level, 0, 255])
                } else {
                    Rgba([level, level, level, 255])
                }
            })
        })
}

// ============================================================================
// Geometry
// ============================================================================

proptest! {
    #[test]
    fn overlap_area_is_symmetric(a in arb_rect(), b in arb_rect()) {
        prop_assert_eq!(a.overlap_area(&b), b.overlap_area(&a));
        prop_assert!(a.overlap_area(&b) <= a.area().min(b.area()));
    }

    #[test]
    fn coverage_percent_is_bounded(a in arb_rect(), b in arb_rect()) {
        let pct = Bounds::from(a).coverage_percent(&Bounds::from(b));
        prop_assert!((0.0..=100.0).contains(&pct));
    }

    #[test]
    fn union_contains_both(a in arb_rect(), b in arb_rect()) {
        let u = a.union(&b);
        prop_assert_eq!(u.overlap_area(&a), a.area());
        prop_assert_eq!(u.overlap_area(&b), b.area());
    }
}

// ============================================================================
// Merging and grid
// ============================================================================

proptest! {
    #[test]
    fn merged_rects_are_disjoint_and_cover_inputs(
        rects in prop::collection::vec(arb_rect(), 0..30)
    ) {
        let merged = merge_blank_areas(rects.clone());
        prop_assert!(merged.len() <= rects.len());

        for (i, a) in merged.iter().enumerate() {
            for b in &merged[i + 1..] {
                prop_assert!(!a.touches(b));
            }
        }
        for r in &rects {
            prop_assert!(merged.iter().any(|m| m.overlap_area(r) == r.area()));
        }
    }

    #[test]
    fn grid_tiles_image(w in 1u32..2000, h in 1u32..2000) {
        let cells = grid_cells(w, h);
        let total: u64 = cells.iter().map(Rect::area).sum();
        prop_assert_eq!(total, u64::from(w) * u64::from(h));
        prop_assert!(cells.iter().all(|c| !c.is_empty() && c.fits_within(w, h)));
    }
}

// ============================================================================
// Edge detection and full pipeline
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn edge_map_shape_and_border(img in arb_image()) {
        let (w, h) = img.dimensions();
        let map = detect_edges(&img);
        prop_assert_eq!((map.width(), map.height()), (w, h));
        for x in 0..w {
            prop_assert!(map.get(x, 0).abs() < f32::EPSILON);
            prop_assert!(map.get(x, h - 1).abs() < f32::EPSILON);
        }
        for y in 0..h {
            prop_assert!(map.get(0, y).abs() < f32::EPSILON);
            prop_assert!(map.get(w - 1, y).abs() < f32::EPSILON);
        }
    }

    #[test]
    fn analysis_is_consistent(img in arb_blocky_image()) {
        let (w, h) = img.dimensions();
        let analysis = analyze(&img).unwrap();

        for (i, a) in analysis.blank_regions.iter().enumerate() {
            prop_assert!(a.fits_within(w, h));
            for b in &analysis.blank_regions[i + 1..] {
                prop_assert!(!a.touches(b));
            }
        }
        for issue in &analysis.report.issues {
            for o in &issue.overlaps {
                prop_assert!(o.percentage > 70.0 && o.percentage <= 100.0);
            }
        }
        prop_assert_eq!(analysis.report.regions.len(), 5);
        prop_assert_eq!(&analysis, &analyze(&img).unwrap());
    }
}
