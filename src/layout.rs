//! Certificate layout validation.
//!
//! A certificate is expected to carry content in five fixed areas, given as
//! fractions of the image size. Each area is checked against the large blank
//! regions found by [`crate::blank`]; an area that is more than 70% covered
//! by a single blank region is reported as an issue.

use std::fmt;

use crate::geometry::{Bounds, Rect};

/// Blank regions must exceed this fraction of both image dimensions to take
/// part in validation.
pub const LARGE_BLANK_FRACTION: f64 = 0.05;
/// Coverage percentage above which an expected region counts as blank.
pub const OVERLAP_LIMIT_PERCENT: f64 = 70.0;

/// Fractional placement of a catalog entry: name, x, y, width, height, required.
const CATALOG: [(&str, f64, f64, f64, f64, bool); 5] = [
    ("Title", 0.20, 0.20, 0.60, 0.15, true),
    ("Recipient Name", 0.25, 0.40, 0.50, 0.10, true),
    ("Date", 0.35, 0.55, 0.30, 0.05, false),
    ("Signature", 0.10, 0.70, 0.35, 0.15, false),
    ("Logo/Seal", 0.55, 0.70, 0.35, 0.15, false),
];

/// A named area where certificate content should appear.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ExpectedRegion {
    /// Display name.
    pub name: &'static str,
    /// Placement resolved against the image size.
    pub bounds: Bounds,
    /// Whether a missing region is a critical problem.
    pub required: bool,
}

/// Resolve the expected-region catalog against an image size.
#[must_use]
pub fn expected_regions(width: u32, height: u32) -> [ExpectedRegion; 5] {
    CATALOG.map(|(name, fx, fy, fw, fh, required)| ExpectedRegion {
        name,
        bounds: Bounds::scaled(fx, fy, fw, fh, width, height),
        required,
    })
}

/// How serious a layout issue is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Severity {
    /// A required region is blank.
    High,
    /// An optional region is blank.
    Medium,
}

/// One blank region covering part of an expected region.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct BlankOverlap {
    /// The blank region.
    pub area: Rect,
    /// Share of the expected region it covers, in `[0, 100]`.
    pub percentage: f64,
}

/// An expected region that is mostly blank.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LayoutIssue {
    /// Name of the affected expected region.
    pub region: &'static str,
    /// Every large blank region covering more than 70% of it.
    pub overlaps: Vec<BlankOverlap>,
    /// High for required regions, medium otherwise.
    pub severity: Severity,
}

/// Overall layout classification.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "status", rename_all = "lowercase"))]
pub enum Verdict {
    /// No expected region is blank.
    Valid,
    /// Only optional regions are blank.
    Minor {
        /// Number of issues.
        count: usize,
        /// Names of all affected regions.
        regions: Vec<&'static str>,
    },
    /// At least one required region is blank.
    Critical {
        /// Number of high-severity issues.
        count: usize,
        /// Names of the regions with high-severity issues.
        regions: Vec<&'static str>,
    },
}

impl Verdict {
    fn from_issues(issues: &[LayoutIssue]) -> Self {
        let high: Vec<_> = issues
            .iter()
            .filter(|i| i.severity == Severity::High)
            .map(|i| i.region)
            .collect();

        if !high.is_empty() {
            Verdict::Critical {
                count: high.len(),
                regions: high,
            }
        } else if !issues.is_empty() {
            Verdict::Minor {
                count: issues.len(),
                regions: issues.iter().map(|i| i.region).collect(),
            }
        } else {
            Verdict::Valid
        }
    }

    /// Short status-badge text, e.g. `"2 Critical Layout Issues"`.
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            Verdict::Valid => "Layout Valid".to_string(),
            Verdict::Minor { count, .. } => format!("{count} Minor Layout Issues"),
            Verdict::Critical { count, .. } => format!("{count} Critical Layout Issues"),
        }
    }

    /// Longer description naming the affected regions.
    #[must_use]
    pub fn detail(&self) -> String {
        match self {
            Verdict::Valid => "All certificate content areas are properly positioned".to_string(),
            Verdict::Minor { regions, .. } => format!("Minor issues in: {}", regions.join(", ")),
            Verdict::Critical { regions, .. } => {
                format!("Critical issues in: {}", regions.join(", "))
            }
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

/// Outline colour class of an expected region in the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum OutlineStatus {
    /// No large blank region overlaps it.
    Clear,
    /// Some large blank region overlaps it, none by more than 70%.
    Partial,
    /// Optional region with an issue.
    Minor,
    /// Required region with an issue.
    Critical,
}

/// Expected region together with its overlay status.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RegionOutline {
    /// The catalog entry.
    pub region: ExpectedRegion,
    /// How to colour it.
    pub status: OutlineStatus,
}

/// Result of [`validate_layout`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LayoutReport {
    /// Every catalog entry, in catalog order.
    pub regions: Vec<RegionOutline>,
    /// At most one issue per catalog entry, in catalog order.
    pub issues: Vec<LayoutIssue>,
    /// Overall classification.
    pub verdict: Verdict,
}

impl LayoutReport {
    /// Whether no issue was found.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.verdict == Verdict::Valid
    }

    /// Number of issues on required regions.
    #[must_use]
    pub fn high_severity_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::High)
            .count()
    }

    /// Issue recorded for the named region, if any.
    #[must_use]
    pub fn issue_for(&self, name: &str) -> Option<&LayoutIssue> {
        self.issues.iter().find(|i| i.region == name)
    }
}

/// Blank regions large enough to matter for layout validation.
#[must_use]
pub fn large_blank_regions(blank_regions: &[Rect], width: u32, height: u32) -> Vec<Rect> {
    let min_w = f64::from(width) * LARGE_BLANK_FRACTION;
    let min_h = f64::from(height) * LARGE_BLANK_FRACTION;
    blank_regions
        .iter()
        .filter(|r| f64::from(r.width) > min_w && f64::from(r.height) > min_h)
        .copied()
        .collect()
}

/// Check the expected regions of a `width` x `height` certificate against
/// its blank regions.
#[must_use]
pub fn validate_layout(width: u32, height: u32, blank_regions: &[Rect]) -> LayoutReport {
    let large = large_blank_regions(blank_regions, width, height);
    let mut issues = Vec::new();
    let mut regions = Vec::with_capacity(CATALOG.len());

    for region in expected_regions(width, height) {
        let mut touched = false;
        let mut overlaps = Vec::new();

        for &area in &large {
            let blank = Bounds::from(area);
            if !region.bounds.touches(&blank) {
                continue;
            }
            let percentage = region.bounds.coverage_percent(&blank);
            if percentage > 0.0 {
                touched = true;
            }
            if percentage > OVERLAP_LIMIT_PERCENT {
                overlaps.push(BlankOverlap { area, percentage });
            }
        }

        let status = if overlaps.is_empty() {
            if touched {
                OutlineStatus::Partial
            } else {
                OutlineStatus::Clear
            }
        } else {
            let severity = if region.required {
                Severity::High
            } else {
                Severity::Medium
            };
            log::debug!(
                "{} is {:.0}% blank ({severity:?})",
                region.name,
                overlaps
                    .iter()
                    .map(|o| o.percentage)
                    .fold(0.0_f64, f64::max)
            );
            issues.push(LayoutIssue {
                region: region.name,
                overlaps,
                severity,
            });
            match severity {
                Severity::High => OutlineStatus::Critical,
                Severity::Medium => OutlineStatus::Minor,
            }
        };

        regions.push(RegionOutline { region, status });
    }

    let verdict = Verdict::from_issues(&issues);
    LayoutReport {
        regions,
        issues,
        verdict,
    }
}
