#![forbid(unsafe_code)]

//! Drawing primitives for the buffer.
//!
//! Helpers on top of `Buffer::set()` so views can draw borders, lines,
//! text, and filled regions without duplicating low-level cell loops.
//! All operations respect the buffer's scissor stack.

use crate::buffer::Buffer;
use crate::cell::{Cell, CellContent, PackedRgba};
use navshell_core::geometry::Rect;
use unicode_width::UnicodeWidthChar;

/// Characters used to draw a border around a rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BorderChars {
    pub top_left: char,
    pub top_right: char,
    pub bottom_left: char,
    pub bottom_right: char,
    pub horizontal: char,
    pub vertical: char,
}

impl BorderChars {
    /// Simple box-drawing characters (U+250x).
    pub const SQUARE: Self = Self {
        top_left: '┌',
        top_right: '┐',
        bottom_left: '└',
        bottom_right: '┘',
        horizontal: '─',
        vertical: '│',
    };

    /// Rounded corners.
    pub const ROUNDED: Self = Self {
        top_left: '╭',
        top_right: '╮',
        bottom_left: '╰',
        bottom_right: '╯',
        horizontal: '─',
        vertical: '│',
    };

    /// ASCII-only border.
    pub const ASCII: Self = Self {
        top_left: '+',
        top_right: '+',
        bottom_left: '+',
        bottom_right: '+',
        horizontal: '-',
        vertical: '|',
    };
}

/// Extension trait for drawing on a Buffer.
pub trait Draw {
    /// Draw a horizontal line of cells.
    fn draw_horizontal_line(&mut self, x: u16, y: u16, width: u16, cell: Cell);

    /// Draw a vertical line of cells.
    fn draw_vertical_line(&mut self, x: u16, y: u16, height: u16, cell: Cell);

    /// Draw a filled rectangle.
    fn draw_rect_filled(&mut self, rect: Rect, cell: Cell);

    /// Print text at the given coordinates using the cell's colors/attrs.
    ///
    /// Stops at the buffer edge. Returns the x position after the last character.
    fn print_text(&mut self, x: u16, y: u16, text: &str, base_cell: Cell) -> u16;

    /// Like `print_text` but stops at `max_x` (exclusive).
    fn print_text_clipped(
        &mut self,
        x: u16,
        y: u16,
        text: &str,
        base_cell: Cell,
        max_x: u16,
    ) -> u16;

    /// Draw a border inside `rect` (edges + corners).
    fn draw_border(&mut self, rect: Rect, chars: BorderChars, base_cell: Cell);

    /// Draw a border and fill the interior.
    ///
    /// If the rect is too small for an interior (width or height <= 2),
    /// only the border is drawn.
    fn draw_box(&mut self, rect: Rect, chars: BorderChars, border_cell: Cell, fill_cell: Cell);

    /// Set fg/bg on every cell in `rect` without changing content.
    fn paint_area(&mut self, rect: Rect, fg: Option<PackedRgba>, bg: Option<PackedRgba>);
}

impl Draw for Buffer {
    fn draw_horizontal_line(&mut self, x: u16, y: u16, width: u16, cell: Cell) {
        for i in 0..width {
            self.set(x.saturating_add(i), y, cell);
        }
    }

    fn draw_vertical_line(&mut self, x: u16, y: u16, height: u16, cell: Cell) {
        for i in 0..height {
            self.set(x, y.saturating_add(i), cell);
        }
    }

    fn draw_rect_filled(&mut self, rect: Rect, cell: Cell) {
        self.fill(rect, cell);
    }

    fn print_text(&mut self, x: u16, y: u16, text: &str, base_cell: Cell) -> u16 {
        self.print_text_clipped(x, y, text, base_cell, self.width())
    }

    fn print_text_clipped(
        &mut self,
        x: u16,
        y: u16,
        text: &str,
        base_cell: Cell,
        max_x: u16,
    ) -> u16 {
        let mut cx = x;
        for c in text.chars() {
            let width = UnicodeWidthChar::width(c).unwrap_or(0);
            if width == 0 {
                continue;
            }
            if cx >= max_x {
                break;
            }
            // Don't start a wide char if it won't fit
            if cx as u32 + width as u32 > max_x as u32 {
                break;
            }

            self.set(cx, y, base_cell.with_char(c));
            cx = cx.saturating_add(width as u16);
        }
        cx
    }

    fn draw_border(&mut self, rect: Rect, chars: BorderChars, base_cell: Cell) {
        if rect.is_empty() {
            return;
        }

        let h_cell = base_cell.with_char(chars.horizontal);
        let v_cell = base_cell.with_char(chars.vertical);
        let right = rect.right() - 1;
        let bottom = rect.bottom() - 1;

        self.draw_horizontal_line(rect.x, rect.y, rect.width, h_cell);
        if rect.height > 1 {
            self.draw_horizontal_line(rect.x, bottom, rect.width, h_cell);
        }
        if rect.height > 2 {
            self.draw_vertical_line(rect.x, rect.y + 1, rect.height - 2, v_cell);
            if rect.width > 1 {
                self.draw_vertical_line(right, rect.y + 1, rect.height - 2, v_cell);
            }
        }

        // Corners last so they overwrite edge chars.
        self.set(rect.x, rect.y, base_cell.with_char(chars.top_left));
        if rect.width > 1 {
            self.set(right, rect.y, base_cell.with_char(chars.top_right));
        }
        if rect.height > 1 {
            self.set(rect.x, bottom, base_cell.with_char(chars.bottom_left));
            if rect.width > 1 {
                self.set(right, bottom, base_cell.with_char(chars.bottom_right));
            }
        }
    }

    fn draw_box(&mut self, rect: Rect, chars: BorderChars, border_cell: Cell, fill_cell: Cell) {
        if rect.is_empty() {
            return;
        }
        if rect.width > 2 && rect.height > 2 {
            let inner = Rect::new(rect.x + 1, rect.y + 1, rect.width - 2, rect.height - 2);
            self.fill(inner, fill_cell);
        }
        self.draw_border(rect, chars, border_cell);
    }

    fn paint_area(&mut self, rect: Rect, fg: Option<PackedRgba>, bg: Option<PackedRgba>) {
        let clipped = self.current_scissor().intersection(&rect);
        for y in clipped.y..clipped.bottom() {
            for x in clipped.x..clipped.right() {
                if let Some(cell) = self.get_mut(x, y) {
                    if let Some(fg) = fg {
                        cell.fg = fg;
                    }
                    if let Some(bg) = bg {
                        cell.bg = bg;
                    }
                    if matches!(cell.content, CellContent::Empty) {
                        cell.content = CellContent::Char(' ');
                    }
                }
            }
        }
    }
}
