#![forbid(unsafe_code)]

//! Geometric primitives.

/// A rectangle for layout bounds, clipping, and hit testing.
///
/// Uses terminal coordinates (0-indexed, origin at top-left).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    /// Left edge (inclusive).
    pub x: u16,
    /// Top edge (inclusive).
    pub y: u16,
    /// Width in cells.
    pub width: u16,
    /// Height in cells.
    pub height: u16,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle at the origin with the given size.
    #[inline]
    pub const fn from_size(width: u16, height: u16) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Right edge (exclusive).
    #[inline]
    pub const fn right(&self) -> u16 {
        self.x.saturating_add(self.width)
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub const fn bottom(&self) -> u16 {
        self.y.saturating_add(self.height)
    }

    /// Check if the rectangle has zero area.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Check if a point is inside the rectangle.
    #[inline]
    pub const fn contains(&self, x: u16, y: u16) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Intersection with another rectangle, empty when they don't overlap.
    pub fn intersection(&self, other: &Rect) -> Rect {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if x < right && y < bottom {
            Rect::new(x, y, right - x, bottom - y)
        } else {
            Rect::default()
        }
    }

    /// Shrink by a margin on each side, saturating at zero size.
    pub fn inner(&self, margin: Sides) -> Rect {
        Rect {
            x: self.x.saturating_add(margin.left),
            y: self.y.saturating_add(margin.top),
            width: self.width.saturating_sub(margin.left.saturating_add(margin.right)),
            height: self.height.saturating_sub(margin.top.saturating_add(margin.bottom)),
        }
    }

    /// Split into a left column of at most `width` cells and the remainder.
    pub fn split_left(&self, width: u16) -> (Rect, Rect) {
        let w = width.min(self.width);
        (
            Rect::new(self.x, self.y, w, self.height),
            Rect::new(self.x.saturating_add(w), self.y, self.width - w, self.height),
        )
    }

    /// Split into a top band of at most `height` rows and the remainder.
    pub fn split_top(&self, height: u16) -> (Rect, Rect) {
        let h = height.min(self.height);
        (
            Rect::new(self.x, self.y, self.width, h),
            Rect::new(self.x, self.y.saturating_add(h), self.width, self.height - h),
        )
    }

    /// The single-row rectangle at offset `dy`, or `None` past the bottom.
    pub fn row(&self, dy: u16) -> Option<Rect> {
        (dy < self.height).then(|| Rect::new(self.x, self.y.saturating_add(dy), self.width, 1))
    }
}

/// Sides for padding/margin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Sides {
    pub top: u16,
    pub right: u16,
    pub bottom: u16,
    pub left: u16,
}

impl Sides {
    /// Equal values on every side.
    pub const fn all(val: u16) -> Self {
        Self::new(val, val, val, val)
    }

    /// Left and right only.
    pub const fn horizontal(val: u16) -> Self {
        Self::new(0, val, 0, val)
    }

    /// Explicit values, clockwise from the top.
    pub const fn new(top: u16, right: u16, bottom: u16, left: u16) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }
}
