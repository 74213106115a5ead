#![forbid(unsafe_code)]

//! Frame = Buffer + metadata for a render pass.
//!
//! The `Frame` is the render target that `Model::view()` writes to. It
//! bundles the cell grid ([`Buffer`]) with an optional hit grid for mouse
//! hit testing.
//!
//! ```
//! use navshell_core::geometry::Rect;
//! use navshell_render::frame::{Frame, HitId};
//!
//! let mut frame = Frame::with_hit_grid(20, 5);
//! frame.register_hit_region(Rect::new(0, 0, 5, 1), HitId::new(7));
//! assert_eq!(frame.hit_test(2, 0), Some(HitId::new(7)));
//! ```

use crate::buffer::Buffer;
use crate::cell::{Cell, PackedRgba};
use crate::drawing::{BorderChars, Draw};
use navshell_core::geometry::Rect;

/// Identifier for a clickable region in the hit grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct HitId(pub u32);

impl HitId {
    /// Create a new hit ID from a raw value.
    #[inline]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[inline]
    pub const fn id(self) -> u32 {
        self.0
    }
}

/// Hit testing grid for mouse interaction.
///
/// Maps screen positions to the id of the last region registered there.
#[derive(Debug, Clone)]
pub struct HitGrid {
    width: u16,
    height: u16,
    cells: Vec<Option<HitId>>,
}

impl HitGrid {
    /// Create an empty hit grid.
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![None; width as usize * height as usize],
        }
    }

    #[inline]
    fn index(&self, x: u16, y: u16) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y as usize * self.width as usize + x as usize)
    }

    /// Register `rect` as belonging to `id`; later registrations win.
    pub fn register(&mut self, rect: Rect, id: HitId) {
        let clipped = rect.intersection(&Rect::from_size(self.width, self.height));
        for y in clipped.y..clipped.bottom() {
            for x in clipped.x..clipped.right() {
                if let Some(idx) = self.index(x, y) {
                    self.cells[idx] = Some(id);
                }
            }
        }
    }

    /// The id registered at (x, y), if any.
    pub fn hit_test(&self, x: u16, y: u16) -> Option<HitId> {
        self.index(x, y).and_then(|idx| self.cells[idx])
    }
}

/// Render target handed to `Model::view()`.
#[derive(Debug)]
pub struct Frame {
    /// The cell grid for this render pass.
    pub buffer: Buffer,

    /// When `Some`, views can register clickable regions.
    pub hit_grid: Option<HitGrid>,
}

impl Frame {
    /// Create a frame without hit testing.
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            buffer: Buffer::new(width, height),
            hit_grid: None,
        }
    }

    /// Create a frame with hit testing enabled.
    pub fn with_hit_grid(width: u16, height: u16) -> Self {
        let buffer = Buffer::new(width, height);
        let hit_grid = HitGrid::new(buffer.width(), buffer.height());
        Self {
            buffer,
            hit_grid: Some(hit_grid),
        }
    }

    /// Frame width.
    #[inline]
    pub fn width(&self) -> u16 {
        self.buffer.width()
    }

    /// Frame height.
    #[inline]
    pub fn height(&self) -> u16 {
        self.buffer.height()
    }

    /// The full frame area.
    #[inline]
    pub fn bounds(&self) -> Rect {
        self.buffer.bounds()
    }

    /// Register a hit region (if hit grid is enabled).
    ///
    /// The region is clipped to the current scissor. Returns `false` when
    /// the frame has no hit grid.
    pub fn register_hit_region(&mut self, rect: Rect, id: HitId) -> bool {
        let Some(grid) = self.hit_grid.as_mut() else {
            return false;
        };
        let clipped = rect.intersection(&self.buffer.current_scissor());
        if !clipped.is_empty() {
            grid.register(clipped, id);
        }
        true
    }

    /// Hit test at the given position (if hit grid is enabled).
    pub fn hit_test(&self, x: u16, y: u16) -> Option<HitId> {
        self.hit_grid.as_ref().and_then(|grid| grid.hit_test(x, y))
    }
}

impl Draw for Frame {
    fn draw_horizontal_line(&mut self, x: u16, y: u16, width: u16, cell: Cell) {
        self.buffer.draw_horizontal_line(x, y, width, cell);
    }

    fn draw_vertical_line(&mut self, x: u16, y: u16, height: u16, cell: Cell) {
        self.buffer.draw_vertical_line(x, y, height, cell);
    }

    fn draw_rect_filled(&mut self, rect: Rect, cell: Cell) {
        self.buffer.draw_rect_filled(rect, cell);
    }

    fn print_text(&mut self, x: u16, y: u16, text: &str, base_cell: Cell) -> u16 {
        self.buffer.print_text(x, y, text, base_cell)
    }

    fn print_text_clipped(
        &mut self,
        x: u16,
        y: u16,
        text: &str,
        base_cell: Cell,
        max_x: u16,
    ) -> u16 {
        self.buffer.print_text_clipped(x, y, text, base_cell, max_x)
    }

    fn draw_border(&mut self, rect: Rect, chars: BorderChars, base_cell: Cell) {
        self.buffer.draw_border(rect, chars, base_cell);
    }

    fn draw_box(&mut self, rect: Rect, chars: BorderChars, border_cell: Cell, fill_cell: Cell) {
        self.buffer.draw_box(rect, chars, border_cell, fill_cell);
    }

    fn paint_area(&mut self, rect: Rect, fg: Option<PackedRgba>, bg: Option<PackedRgba>) {
        self.buffer.paint_area(rect, fg, bg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_without_grid_returns_false() {
        let mut frame = Frame::new(4, 4);
        assert!(!frame.register_hit_region(Rect::new(0, 0, 1, 1), HitId::new(1)));
        assert_eq!(frame.hit_test(0, 0), None);
    }

    #[test]
    fn later_registration_wins() {
        let mut frame = Frame::with_hit_grid(10, 2);
        frame.register_hit_region(Rect::new(0, 0, 10, 2), HitId::new(1));
        frame.register_hit_region(Rect::new(3, 1, 2, 1), HitId::new(2));
        assert_eq!(frame.hit_test(0, 0), Some(HitId::new(1)));
        assert_eq!(frame.hit_test(3, 1), Some(HitId::new(2)));
    }

    #[test]
    fn hit_regions_respect_scissor() {
        let mut frame = Frame::with_hit_grid(10, 1);
        frame.buffer.push_scissor(Rect::new(0, 0, 4, 1));
        frame.register_hit_region(Rect::new(0, 0, 10, 1), HitId::new(9));
        frame.buffer.pop_scissor();
        assert_eq!(frame.hit_test(3, 0), Some(HitId::new(9)));
        assert_eq!(frame.hit_test(4, 0), None);
    }
}
