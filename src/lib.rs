//! Detect blank space in certificate images and validate their layout.
//!
//! A certificate scan is split into a 25x25 grid. Each cell is classified as
//! blank or content from its colour statistics and Sobel edge density, blank
//! cells are merged into rectangles, and the result is checked against five
//! areas where certificate content is expected (title, recipient name, date,
//! signature, logo/seal).
//!
//! # Quick Start
//!
//! ```no_run
//! let img = image::open("certificate.png").unwrap().to_rgba8();
//! let analysis = certscan::analyze(&img).expect("image has pixels");
//!
//! println!("{}", analysis.report.verdict);
//! for area in &analysis.blank_regions {
//!     println!("blank: {}x{} at ({}, {})", area.width, area.height, area.x, area.y);
//! }
//! ```
//!
//! # Stages
//!
//! The stages are also exposed individually:
//!
//! ```no_run
//! use certscan::{blank, edges, layout};
//!
//! let img = image::open("certificate.png").unwrap().to_rgba8();
//! let edge_map = edges::detect_edges(&img);
//! let regions = blank::detect_blank_regions(&img, &edge_map);
//! let report = layout::validate_layout(img.width(), img.height(), &regions);
//! println!("{}", report.verdict.detail());
//! ```

#![deny(missing_docs)]

pub mod blank;
pub mod edges;
mod engine;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod session;

pub use engine::{
    analyze, analyze_file, default_overlay_path, is_supported_image, outline_color, process_file,
    render_overlay, save_image, Analysis, AnalysisStats, ProcessResult,
};
pub use error::{Error, Result};
pub use geometry::{Bounds, Rect};
pub use layout::{LayoutIssue, LayoutReport, Severity, Verdict};
pub use session::{AnalysisSession, RequestTicket};
