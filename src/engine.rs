//! Analysis pipeline, debug statistics, and file handling.

use std::fmt;
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};

use crate::blank::{self, EDGE_THRESHOLD, GRID_SIZE, NOISE_FRACTION};
use crate::edges;
use crate::error::{Error, Result};
use crate::geometry::Rect;
use crate::layout::{self, LayoutReport, OutlineStatus};

/// Fill colour for blank regions in the overlay.
const BLANK_TINT: Rgba<u8> = Rgba([59, 130, 246, 255]);
/// Blend weight of the blank tint.
const BLANK_TINT_ALPHA: f32 = 0.25;
const CLEAR_COLOR: Rgba<u8> = Rgba([34, 197, 94, 255]);
const WARN_COLOR: Rgba<u8> = Rgba([234, 179, 8, 255]);
const CRITICAL_COLOR: Rgba<u8> = Rgba([239, 68, 68, 255]);
/// Outline thickness in pixels.
const OUTLINE_WIDTH: u32 = 2;

/// Readout of a finished analysis, for debugging the detector.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AnalysisStats {
    /// Number of blank regions after merging and filtering.
    pub blank_count: usize,
    /// Summed blank area as a percentage of the image area.
    pub blank_coverage_percent: f64,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Cells per grid axis.
    pub grid_size: u32,
    /// Edge magnitude threshold.
    pub edge_threshold: f32,
    /// Minimum blank region size as a percentage of each dimension.
    pub min_area_percent: f64,
}

impl AnalysisStats {
    #[allow(clippy::cast_precision_loss)]
    fn new(width: u32, height: u32, blank_regions: &[Rect]) -> Self {
        let image_area = u64::from(width) * u64::from(height);
        let blank_area: u64 = blank_regions.iter().map(Rect::area).sum();
        Self {
            blank_count: blank_regions.len(),
            blank_coverage_percent: blank_area as f64 / image_area as f64 * 100.0,
            width,
            height,
            grid_size: GRID_SIZE,
            edge_threshold: EDGE_THRESHOLD,
            min_area_percent: NOISE_FRACTION * 100.0,
        }
    }
}

impl fmt::Display for AnalysisStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Blank areas:    {}", self.blank_count)?;
        writeln!(f, "Coverage:       {:.1}%", self.blank_coverage_percent)?;
        writeln!(f, "Dimensions:     {}x{}", self.width, self.height)?;
        writeln!(f, "Grid:           {0}x{0}", self.grid_size)?;
        writeln!(f, "Edge threshold: {}", self.edge_threshold)?;
        write!(f, "Min area:       {}%", self.min_area_percent)
    }
}

/// Everything computed for one image.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Analysis {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Merged, noise-filtered blank regions.
    pub blank_regions: Vec<Rect>,
    /// Layout validation result.
    pub report: LayoutReport,
    /// Debug readout.
    pub stats: AnalysisStats,
}

/// Run edge detection, blank-region detection and layout validation.
///
/// # Errors
///
/// Returns [`Error::EmptyImage`] if the image has zero width or height.
pub fn analyze(image: &RgbaImage) -> Result<Analysis> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(Error::EmptyImage { width, height });
    }

    let edge_map = edges::detect_edges(image);
    let blank_regions = blank::detect_blank_regions(image, &edge_map);
    let report = layout::validate_layout(width, height, &blank_regions);
    let stats = AnalysisStats::new(width, height, &blank_regions);

    log::debug!(
        "{width}x{height}: {} blank regions ({:.1}% coverage), {}",
        stats.blank_count,
        stats.blank_coverage_percent,
        report.verdict
    );

    Ok(Analysis {
        width,
        height,
        blank_regions,
        report,
        stats,
    })
}

/// Load an image file and analyse it.
///
/// # Errors
///
/// Returns an error if the file cannot be decoded or has zero area.
pub fn analyze_file(path: &Path) -> Result<Analysis> {
    let image = image::open(path)?.to_rgba8();
    analyze(&image)
}

fn blend(px: &mut Rgba<u8>, color: Rgba<u8>, alpha: f32) {
    for ch in 0..3 {
        let mixed = f32::from(px[ch]) * (1.0 - alpha) + f32::from(color[ch]) * alpha;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        {
            px[ch] = mixed.round().clamp(0.0, 255.0) as u8;
        }
    }
}

/// Paint a rectangle border of the given thickness, clipped to the image.
fn draw_outline(image: &mut RgbaImage, rect: Rect, color: Rgba<u8>, thickness: u32) {
    let (w, h) = image.dimensions();
    let x1 = rect.right().min(w);
    let y1 = rect.bottom().min(h);
    for y in rect.y..y1 {
        for x in rect.x..x1 {
            let on_border = x < rect.x + thickness
                || y < rect.y + thickness
                || x + thickness >= rect.right()
                || y + thickness >= rect.bottom();
            if on_border {
                image.put_pixel(x, y, color);
            }
        }
    }
}

/// Colour for an expected-region outline.
#[must_use]
pub fn outline_color(status: OutlineStatus) -> Rgba<u8> {
    match status {
        OutlineStatus::Clear => CLEAR_COLOR,
        OutlineStatus::Partial | OutlineStatus::Minor => WARN_COLOR,
        OutlineStatus::Critical => CRITICAL_COLOR,
    }
}

/// Draw the analysis on top of a copy of the image.
///
/// Blank regions are tinted and outlined in blue; every expected region is
/// outlined green, amber or red according to its status.
#[must_use]
pub fn render_overlay(image: &RgbaImage, analysis: &Analysis) -> RgbaImage {
    let mut out = image.clone();
    let (w, h) = out.dimensions();

    for area in &analysis.blank_regions {
        for y in area.y..area.bottom().min(h) {
            for x in area.x..area.right().min(w) {
                blend(out.get_pixel_mut(x, y), BLANK_TINT, BLANK_TINT_ALPHA);
            }
        }
        draw_outline(&mut out, *area, BLANK_TINT, OUTLINE_WIDTH);
    }

    for outline in &analysis.report.regions {
        let rect = outline.region.bounds.to_pixel_rect(w, h);
        draw_outline(&mut out, rect, outline_color(outline.status), OUTLINE_WIDTH);
    }

    out
}

/// Result of analysing a single image file.
#[derive(Debug)]
pub struct ProcessResult {
    /// Path of the analysed file.
    pub path: PathBuf,
    /// Whether loading, analysis and any overlay write succeeded.
    pub success: bool,
    /// The analysis, when the image could be analysed.
    pub analysis: Option<Analysis>,
    /// Human-readable status message.
    pub message: String,
}

/// Analyse one image file and optionally write its overlay.
///
/// Failures are reported in the returned [`ProcessResult`] rather than as
/// errors.
#[must_use]
pub fn process_file(input: &Path, overlay: Option<&Path>) -> ProcessResult {
    let mut result = ProcessResult {
        path: input.to_path_buf(),
        success: false,
        analysis: None,
        message: String::new(),
    };

    let image = match image::open(input) {
        Ok(img) => img.to_rgba8(),
        Err(e) => {
            result.message = format!("Failed to load: {e}");
            return result;
        }
    };

    let analysis = match analyze(&image) {
        Ok(a) => a,
        Err(e) => {
            result.message = format!("Failed to analyse: {e}");
            return result;
        }
    };

    result.message = format!(
        "{} ({})",
        analysis.report.verdict.summary(),
        analysis.report.verdict.detail()
    );

    if let Some(output) = overlay {
        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    result.message = format!("Failed to create output directory: {e}");
                    result.analysis = Some(analysis);
                    return result;
                }
            }
        }

        let rendered = render_overlay(&image, &analysis);
        if let Err(e) = save_image(&rendered, output) {
            result.message = format!("Failed to save overlay: {e}");
            result.analysis = Some(analysis);
            return result;
        }
        log::info!("overlay written to {}", output.display());
    }

    result.success = true;
    result.analysis = Some(analysis);
    result
}

/// Check if a file has a supported image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => matches!(
            ext.to_lowercase().as_str(),
            "jpg" | "jpeg" | "png" | "webp" | "bmp"
        ),
        None => false,
    }
}

/// Save an RGBA image, choosing the encoder from the file extension.
///
/// JPEG output drops the alpha channel.
///
/// # Errors
///
/// Returns an error if the format is unsupported or writing fails.
pub fn save_image(img: &RgbaImage, path: &Path) -> Result<()> {
    let format =
        ImageFormat::from_path(path).map_err(|e| Error::UnsupportedFormat(e.to_string()))?;

    let dyn_img = DynamicImage::ImageRgba8(img.clone());

    match format {
        ImageFormat::Jpeg => {
            let file = std::io::BufWriter::new(std::fs::File::create(path)?);
            let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(file, 95);
            DynamicImage::ImageRgb8(dyn_img.to_rgb8()).write_with_encoder(encoder)?;
        }
        ImageFormat::Png | ImageFormat::WebP | ImageFormat::Bmp => {
            dyn_img.save(path)?;
        }
        _ => {
            return Err(Error::UnsupportedFormat(format!("{format:?}")));
        }
    }

    Ok(())
}

/// Default location for the overlay of an input image.
///
/// Example: `"cert.jpg"` becomes `"cert_overlay.png"`.
#[must_use]
pub fn default_overlay_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let parent = input.parent().unwrap_or(Path::new("."));
    parent.join(format!("{stem}_overlay.png"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Verdict;

    #[test]
    fn analyze_rejects_empty_image() {
        let img = RgbaImage::new(0, 10);
        assert!(matches!(
            analyze(&img),
            Err(Error::EmptyImage {
                width: 0,
                height: 10
            })
        ));
    }

    #[test]
    fn analyze_tiny_image_does_not_panic() {
        let img = RgbaImage::from_pixel(2, 2, Rgba([255, 255, 255, 255]));
        let analysis = analyze(&img).unwrap();
        assert_eq!(analysis.blank_regions, vec![Rect::new(0, 0, 2, 2)]);
    }

    #[test]
    fn stats_report_coverage_and_constants() {
        let img = RgbaImage::from_pixel(100, 100, Rgba([255, 255, 255, 255]));
        let analysis = analyze(&img).unwrap();
        let stats = analysis.stats;
        assert_eq!(stats.blank_count, 1);
        assert!((stats.blank_coverage_percent - 100.0).abs() < 1e-9);
        assert_eq!(stats.grid_size, 25);
        assert!((stats.min_area_percent - 2.0).abs() < 1e-9);

        let text = stats.to_string();
        assert!(text.contains("100.0%"));
        assert!(text.contains("25x25"));
        assert!(text.contains("100x100"));
    }

    #[test]
    fn overlay_marks_blank_and_critical_regions() {
        let img = RgbaImage::from_pixel(100, 100, Rgba([255, 255, 255, 255]));
        let analysis = analyze(&img).unwrap();
        assert!(matches!(analysis.report.verdict, Verdict::Critical { .. }));

        let out = render_overlay(&img, &analysis);
        assert_eq!(out.dimensions(), img.dimensions());
        // Image border is the blank region's outline.
        assert_eq!(*out.get_pixel(0, 0), BLANK_TINT);
        // Title starts at (20, 20) and is critical.
        assert_eq!(*out.get_pixel(20, 20), CRITICAL_COLOR);
        // Interior of the blank region is tinted, not left white.
        let inner = out.get_pixel(10, 10);
        assert!(inner[0] < 255 && inner[2] > inner[0]);
    }

    #[test]
    fn outline_colors_follow_status() {
        assert_eq!(outline_color(OutlineStatus::Clear), CLEAR_COLOR);
        assert_eq!(outline_color(OutlineStatus::Partial), WARN_COLOR);
        assert_eq!(outline_color(OutlineStatus::Minor), WARN_COLOR);
        assert_eq!(outline_color(OutlineStatus::Critical), CRITICAL_COLOR);
    }

    #[test]
    fn default_overlay_path_appends_suffix() {
        let p = default_overlay_path(Path::new("/tmp/cert.jpg"));
        assert_eq!(p, PathBuf::from("/tmp/cert_overlay.png"));

        let p = default_overlay_path(Path::new("scan.png"));
        assert_eq!(p.file_name().unwrap().to_str().unwrap(), "scan_overlay.png");
    }

    #[test]
    fn is_supported_image_accepts_common_formats() {
        assert!(is_supported_image(Path::new("cert.jpg")));
        assert!(is_supported_image(Path::new("cert.JPEG")));
        assert!(is_supported_image(Path::new("cert.png")));
        assert!(is_supported_image(Path::new("cert.webp")));
        assert!(is_supported_image(Path::new("cert.bmp")));
        assert!(!is_supported_image(Path::new("cert.gif")));
        assert!(!is_supported_image(Path::new("cert")));
    }

    #[test]
    fn process_file_reports_missing_input() {
        let result = process_file(Path::new("/nonexistent/cert.png"), None);
        assert!(!result.success);
        assert!(result.analysis.is_none());
        assert!(result.message.starts_with("Failed to load"));
    }
}
