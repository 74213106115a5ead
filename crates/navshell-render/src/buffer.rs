#![forbid(unsafe_code)]

//! Buffer grid storage.
//!
//! The `Buffer` is a 2D grid of [`Cell`]s representing the terminal display,
//! with a scissor (clipping) stack for nested regions.
//!
//! # Layout
//!
//! Cells are stored in row-major order: `index = y * width + x`.
//!
//! # Invariants
//!
//! 1. `cells.len() == width * height`
//! 2. Width and height never change after creation
//! 3. Scissor stack intersection monotonically decreases on push
//! 4. The scissor stack always has at least one element

use crate::cell::{Cell, CellContent, PackedRgba};
use navshell_core::geometry::Rect;
use unicode_width::UnicodeWidthChar;

/// A 2D grid of terminal cells.
///
/// # Example
///
/// ```
/// use navshell_render::buffer::Buffer;
/// use navshell_render::cell::Cell;
///
/// let mut buffer = Buffer::new(80, 24);
/// buffer.set(0, 0, Cell::from_char('H'));
/// buffer.set(1, 0, Cell::from_char('i'));
/// ```
#[derive(Debug, Clone)]
pub struct Buffer {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
    scissor_stack: Vec<Rect>,
}

impl Buffer {
    /// Create a new buffer with the given dimensions.
    ///
    /// Zero dimensions are bumped to 1 so the grid is never empty.
    pub fn new(width: u16, height: u16) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let size = width as usize * height as usize;

        Self {
            width,
            height,
            cells: vec![Cell::default(); size],
            scissor_stack: vec![Rect::from_size(width, height)],
        }
    }

    /// Buffer width in cells.
    #[inline]
    pub const fn width(&self) -> u16 {
        self.width
    }

    /// Buffer height in cells.
    #[inline]
    pub const fn height(&self) -> u16 {
        self.height
    }

    /// Bounding rect of the entire buffer.
    #[inline]
    pub const fn bounds(&self) -> Rect {
        Rect::from_size(self.width, self.height)
    }

    #[inline]
    fn index(&self, x: u16, y: u16) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(y as usize * self.width as usize + x as usize)
        } else {
            None
        }
    }

    /// Get the cell at (x, y), `None` when out of bounds.
    #[inline]
    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        self.index(x, y).map(|i| &self.cells[i])
    }

    /// Mutable access to the cell at (x, y).
    #[inline]
    pub fn get_mut(&mut self, x: u16, y: u16) -> Option<&mut Cell> {
        self.index(x, y).map(|i| &mut self.cells[i])
    }

    /// Set the cell at (x, y).
    ///
    /// - Skips cells outside the current scissor or the buffer bounds.
    /// - A transparent background keeps whatever background is already there.
    /// - Wide characters write a continuation cell to their right; if the
    ///   whole character doesn't fit, nothing is written.
    pub fn set(&mut self, x: u16, y: u16, cell: Cell) {
        let width = match cell.content {
            CellContent::Char(c) => UnicodeWidthChar::width(c).unwrap_or(0).max(1),
            _ => 1,
        } as u16;

        let scissor = self.current_scissor();
        for i in 0..width {
            let cx = x.saturating_add(i);
            if cx >= self.width || y >= self.height || !scissor.contains(cx, y) {
                return;
            }
        }

        let Some(idx) = self.index(x, y) else {
            return;
        };
        let mut final_cell = cell;
        if !final_cell.bg.is_set() {
            final_cell.bg = self.cells[idx].bg;
        }
        self.cells[idx] = final_cell;

        for i in 1..width {
            if let Some(tail) = self.index(x + i, y) {
                self.cells[tail] = Cell {
                    bg: final_cell.bg,
                    ..Cell::CONTINUATION
                };
            }
        }
    }

    /// Fill a rectangular region with the given cell, respecting the scissor.
    pub fn fill(&mut self, rect: Rect, cell: Cell) {
        let clipped = self.current_scissor().intersection(&rect);
        if clipped.is_empty() {
            return;
        }

        for y in clipped.y..clipped.bottom() {
            for x in clipped.x..clipped.right() {
                self.set(x, y, cell);
            }
        }
    }

    /// Darken every cell in `rect` by `factor`, keeping content.
    ///
    /// Used for modal backdrops; unset backgrounds become `fallback_bg`
    /// before darkening so the dim is visible on default-colored cells.
    pub fn dim_area(&mut self, rect: Rect, factor: f32, fallback_bg: PackedRgba) {
        let clipped = self.current_scissor().intersection(&rect);
        for y in clipped.y..clipped.bottom() {
            for x in clipped.x..clipped.right() {
                if let Some(cell) = self.get_mut(x, y) {
                    let bg = if cell.bg.is_set() { cell.bg } else { fallback_bg };
                    cell.bg = bg.darken(factor);
                    cell.fg = cell.fg.darken(factor);
                }
            }
        }
    }

    /// Raw access to the cell slice.
    #[inline]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// The cells of row `y`; empty when `y` is out of bounds.
    #[inline]
    pub fn row_cells(&self, y: u16) -> &[Cell] {
        if y >= self.height {
            return &[];
        }
        let start = y as usize * self.width as usize;
        &self.cells[start..start + self.width as usize]
    }

    // ========== Scissor Stack ==========

    /// Push a scissor region; the effective scissor is the intersection of all pushed rects.
    pub fn push_scissor(&mut self, rect: Rect) {
        let intersected = self.current_scissor().intersection(&rect);
        self.scissor_stack.push(intersected);
    }

    /// Pop a scissor region. Does nothing if only the base scissor remains.
    pub fn pop_scissor(&mut self) {
        if self.scissor_stack.len() > 1 {
            self.scissor_stack.pop();
        }
    }

    /// The current effective scissor region.
    #[inline]
    pub fn current_scissor(&self) -> Rect {
        self.scissor_stack.last().copied().unwrap_or_default()
    }
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new(1, 1)
    }
}
