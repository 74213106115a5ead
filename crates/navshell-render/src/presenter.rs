#![forbid(unsafe_code)]

//! Presenter: state-tracked ANSI emission.
//!
//! Writes a [`Buffer`] to a terminal, tracking the current style and cursor so
//! escape sequences are only emitted when something changes. When a previous
//! buffer of the same size is supplied, only rows that differ are rewritten.
//!
//! ```
//! use navshell_render::buffer::Buffer;
//! use navshell_render::presenter::Presenter;
//!
//! let mut presenter = Presenter::new(Vec::new());
//! let next = Buffer::new(4, 1);
//! presenter.present(None, &next).unwrap();
//! ```

use std::io::{self, BufWriter, Write};

use crate::buffer::Buffer;
use crate::cell::{Cell, PackedRgba, StyleFlags};

/// Size of the internal write buffer (64KB).
const BUFFER_CAPACITY: usize = 64 * 1024;

/// Cached style state for comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct CellStyle {
    fg: PackedRgba,
    bg: PackedRgba,
    attrs: StyleFlags,
}

impl CellStyle {
    fn from_cell(cell: &Cell) -> Self {
        Self {
            fg: cell.fg,
            bg: cell.bg,
            attrs: cell.attrs,
        }
    }
}

/// State-tracked ANSI presenter.
pub struct Presenter<W: Write> {
    writer: BufWriter<W>,
    /// Current style state (None = unknown/reset).
    current_style: Option<CellStyle>,
    /// Current cursor position. None = unknown.
    cursor: Option<(u16, u16)>,
}

impl<W: Write> Presenter<W> {
    /// Create a new presenter around `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::with_capacity(BUFFER_CAPACITY, writer),
            current_style: None,
            cursor: None,
        }
    }

    /// Present `next`, rewriting only rows that differ from `prev`.
    ///
    /// A missing or differently sized `prev` redraws everything.
    pub fn present(&mut self, prev: Option<&Buffer>, next: &Buffer) -> io::Result<()> {
        let prev = prev.filter(|p| p.width() == next.width() && p.height() == next.height());

        let mut rows_written = 0usize;
        for y in 0..next.height() {
            let row = next.row_cells(y);
            if prev.is_some_and(|p| p.row_cells(y) == row) {
                continue;
            }
            self.move_cursor_to(0, y)?;
            for cell in row {
                self.emit_cell(cell)?;
            }
            rows_written += 1;
        }

        // Reset style at end (clean state for next frame)
        self.writer.write_all(b"\x1b[0m")?;
        self.current_style = None;

        #[cfg(feature = "tracing")]
        tracing::trace!(rows_written, "frame presented");
        #[cfg(not(feature = "tracing"))]
        let _ = rows_written;

        self.writer.flush()
    }

    fn emit_cell(&mut self, cell: &Cell) -> io::Result<()> {
        // Skip continuation cells (second cell of wide characters)
        if cell.is_continuation() {
            if let Some((x, y)) = self.cursor {
                self.cursor = Some((x.saturating_add(1), y));
            }
            return Ok(());
        }

        self.emit_style_changes(cell)?;

        let ch = cell.content.as_char().unwrap_or(' ');
        let mut buf = [0u8; 4];
        self.writer.write_all(ch.encode_utf8(&mut buf).as_bytes())?;

        if let Some((x, y)) = self.cursor {
            self.cursor = Some((x.saturating_add(1), y));
        }
        Ok(())
    }

    /// Emit style changes if the cell style differs from current.
    fn emit_style_changes(&mut self, cell: &Cell) -> io::Result<()> {
        let new_style = CellStyle::from_cell(cell);
        if self.current_style == Some(new_style) {
            return Ok(());
        }

        // Reset + apply is simpler than incremental updates.
        self.writer.write_all(b"\x1b[0m")?;
        if new_style.fg.is_set() {
            let c = new_style.fg;
            write!(self.writer, "\x1b[38;2;{};{};{}m", c.r(), c.g(), c.b())?;
        }
        if new_style.bg.is_set() {
            let c = new_style.bg;
            write!(self.writer, "\x1b[48;2;{};{};{}m", c.r(), c.g(), c.b())?;
        }
        for (flag, code) in [
            (StyleFlags::BOLD, 1),
            (StyleFlags::DIM, 2),
            (StyleFlags::ITALIC, 3),
            (StyleFlags::UNDERLINE, 4),
            (StyleFlags::REVERSE, 7),
        ] {
            if new_style.attrs.contains(flag) {
                write!(self.writer, "\x1b[{code}m")?;
            }
        }

        self.current_style = Some(new_style);
        Ok(())
    }

    /// Move cursor to the specified position (CUP is 1-indexed).
    fn move_cursor_to(&mut self, x: u16, y: u16) -> io::Result<()> {
        if self.cursor == Some((x, y)) {
            return Ok(());
        }
        write!(
            self.writer,
            "\x1b[{};{}H",
            u32::from(y) + 1,
            u32::from(x) + 1
        )?;
        self.cursor = Some((x, y));
        Ok(())
    }

    /// Clear the entire screen and home the cursor.
    pub fn clear_screen(&mut self) -> io::Result<()> {
        self.writer.write_all(b"\x1b[2J\x1b[H")?;
        self.cursor = Some((0, 0));
        self.current_style = None;
        self.writer.flush()
    }

    /// Forget tracked state, e.g. after the terminal was resized.
    pub fn reset(&mut self) {
        self.current_style = None;
        self.cursor = None;
    }

    /// Flush buffered output.
    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    /// Recover the underlying writer.
    pub fn into_inner(self) -> Result<W, io::Error> {
        self.writer.into_inner().map_err(|e| e.into_error())
    }
}
