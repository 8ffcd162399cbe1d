//! Axis-aligned rectangles in pixel space.
//!
//! [`Rect`] holds whole-pixel rectangles (grid cells and blank regions).
//! [`Bounds`] holds fractional rectangles, used for the expected-content
//! catalog whose coordinates are fractions of the image size.

/// An integer rectangle in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Rect {
    /// Create a rectangle from its top-left corner and size.
    #[must_use]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge (`x + width`).
    #[must_use]
    pub const fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Exclusive bottom edge (`y + height`).
    #[must_use]
    pub const fn bottom(&self) -> u32 {
        self.y + self.height
    }

    /// Area in pixels.
    #[must_use]
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Whether the rectangle covers no pixels.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Whether the rectangle lies inside a `width` x `height` image.
    #[must_use]
    pub const fn fits_within(&self, width: u32, height: u32) -> bool {
        self.right() <= width && self.bottom() <= height
    }

    /// Intersection test where shared edges count as touching.
    ///
    /// Two rectangles are disjoint only when one starts strictly past the
    /// other's far edge on some axis.
    #[must_use]
    pub const fn touches(&self, other: &Rect) -> bool {
        !(self.right() < other.x
            || other.right() < self.x
            || self.bottom() < other.y
            || other.bottom() < self.y)
    }

    /// Whether `other` sits within `gap` pixels of one of this rectangle's
    /// edges while sharing a strictly overlapping span on the other axis.
    #[must_use]
    pub const fn is_adjacent(&self, other: &Rect, gap: u32) -> bool {
        let horizontal = (self.x.abs_diff(other.right()) < gap
            || other.x.abs_diff(self.right()) < gap)
            && (self.y < other.bottom() && self.bottom() > other.y);

        let vertical = (self.y.abs_diff(other.bottom()) < gap
            || other.y.abs_diff(self.bottom()) < gap)
            && (self.x < other.right() && self.right() > other.x);

        horizontal || vertical
    }

    /// Smallest rectangle containing both inputs.
    #[must_use]
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Rect {
            x,
            y,
            width: self.right().max(other.right()) - x,
            height: self.bottom().max(other.bottom()) - y,
        }
    }

    /// Area of the intersection in pixels (0 when disjoint or edge-touching).
    #[must_use]
    pub fn overlap_area(&self, other: &Rect) -> u64 {
        let w = self
            .right()
            .min(other.right())
            .saturating_sub(self.x.max(other.x));
        let h = self
            .bottom()
            .min(other.bottom())
            .saturating_sub(self.y.max(other.y));
        u64::from(w) * u64::from(h)
    }
}

/// A rectangle with fractional coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bounds {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl Bounds {
    /// Create bounds from a corner and size.
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Resolve fractional coordinates against an image size.
    #[must_use]
    pub fn scaled(fx: f64, fy: f64, fw: f64, fh: f64, width: u32, height: u32) -> Self {
        let w = f64::from(width);
        let h = f64::from(height);
        Self::new(w * fx, h * fy, w * fw, h * fh)
    }

    /// Exclusive right edge.
    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Area.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Same edge-inclusive intersection test as [`Rect::touches`].
    #[must_use]
    pub fn touches(&self, other: &Bounds) -> bool {
        !(self.right() < other.x
            || other.right() < self.x
            || self.bottom() < other.y
            || other.bottom() < self.y)
    }

    /// Area of the intersection (0 when disjoint).
    #[must_use]
    pub fn overlap_area(&self, other: &Bounds) -> f64 {
        let w = (self.right().min(other.right()) - self.x.max(other.x)).max(0.0);
        let h = (self.bottom().min(other.bottom()) - self.y.max(other.y)).max(0.0);
        w * h
    }

    /// Percentage of this rectangle's area covered by `other`, in `[0, 100]`.
    ///
    /// Degenerate (zero-area) bounds report 0.
    #[must_use]
    pub fn coverage_percent(&self, other: &Bounds) -> f64 {
        let area = self.area();
        if area <= 0.0 {
            return 0.0;
        }
        (self.overlap_area(other) / area * 100.0).clamp(0.0, 100.0)
    }

    /// Smallest pixel rectangle containing these bounds, clipped to the image.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn to_pixel_rect(&self, width: u32, height: u32) -> Rect {
        let clip = |v: f64, max: u32| -> u32 { (v.max(0.0) as u32).min(max) };
        let x0 = clip(self.x.floor(), width);
        let y0 = clip(self.y.floor(), height);
        let x1 = clip(self.right().ceil(), width);
        let y1 = clip(self.bottom().ceil(), height);
        Rect::new(x0, y0, x1 - x0, y1 - y0)
    }
}

impl From<Rect> for Bounds {
    fn from(r: Rect) -> Self {
        Self::new(
            f64::from(r.x),
            f64::from(r.y),
            f64::from(r.width),
            f64::from(r.height),
        )
    }
}
