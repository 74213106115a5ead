#![forbid(unsafe_code)]

//! Read rendered buffers back as text for assertions.
//!
//! ```ignore
//! use navshell_harness::{assert_buffer_contains, find_text};
//!
//! let buf = sim.capture_frame(120, 40);
//! assert_buffer_contains!(buf, "Menu Items");
//! let (x, y) = find_text(buf, "Billing").expect("billing link rendered");
//! ```

use navshell_render::buffer::Buffer;

// ============================================================================
// Buffer → Text Conversion
// ============================================================================

/// Convert a `Buffer` to a plain text string.
///
/// Each row becomes one line. Empty cells become spaces. Continuation cells
/// (trailing cells of wide characters) are skipped so wide characters occupy
/// their natural display width in the output string.
pub fn buffer_to_text(buf: &Buffer) -> String {
    let capacity = (buf.width() as usize + 1) * buf.height() as usize;
    let mut out = String::with_capacity(capacity);

    for y in 0..buf.height() {
        if y > 0 {
            out.push('\n');
        }
        out.push_str(&row_text(buf, y));
    }
    out
}

/// Text of a single row; empty when `y` is out of bounds.
pub fn row_text(buf: &Buffer, y: u16) -> String {
    row_chars(buf, y)
        .into_iter()
        .map(|(_, c)| c)
        .collect()
}

/// Position `(x, y)` of the first occurrence of `needle`, scanning rows top
/// to bottom. `x` is the buffer column of the first character, so it can be
/// fed straight into a click event.
pub fn find_text(buf: &Buffer, needle: &str) -> Option<(u16, u16)> {
    if needle.is_empty() {
        return None;
    }
    let needle: Vec<char> = needle.chars().collect();
    for y in 0..buf.height() {
        let row = row_chars(buf, y);
        if row.len() < needle.len() {
            continue;
        }
        for start in 0..=row.len() - needle.len() {
            if row[start..start + needle.len()]
                .iter()
                .zip(&needle)
                .all(|((_, a), b)| a == b)
            {
                return Some((row[start].0, y));
            }
        }
    }
    None
}

/// Whether `needle` appears on any single row.
pub fn contains_text(buf: &Buffer, needle: &str) -> bool {
    find_text(buf, needle).is_some()
}

/// Number of rows containing `needle`.
pub fn count_rows_with(buf: &Buffer, needle: &str) -> usize {
    (0..buf.height())
        .filter(|&y| row_text(buf, y).contains(needle))
        .count()
}

/// Characters of row `y`, tagged with their column.
fn row_chars(buf: &Buffer, y: u16) -> Vec<(u16, char)> {
    if y >= buf.height() {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(buf.width() as usize);
    for x in 0..buf.width() {
        let Some(cell) = buf.get(x, y) else {
            continue;
        };
        if cell.is_continuation() {
            continue;
        }
        let c = if cell.is_empty() {
            ' '
        } else {
            cell.content.as_char().unwrap_or('?')
        };
        out.push((x, c));
    }
    out
}

// ============================================================================
// Assertions
// ============================================================================

/// Assert that a buffer shows `needle` somewhere, printing the screen on failure.
#[macro_export]
macro_rules! assert_buffer_contains {
    ($buf:expr, $needle:expr) => {{
        let buf = &$buf;
        let needle: &str = $needle;
        assert!(
            $crate::contains_text(buf, needle),
            "expected {:?} on screen:\n{}",
            needle,
            $crate::buffer_to_text(buf)
        );
    }};
}

/// Assert that a buffer does not show `needle`, printing the screen on failure.
#[macro_export]
macro_rules! assert_buffer_lacks {
    ($buf:expr, $needle:expr) => {{
        let buf = &$buf;
        let needle: &str = $needle;
        assert!(
            !$crate::contains_text(buf, needle),
            "did not expect {:?} on screen:\n{}",
            needle,
            $crate::buffer_to_text(buf)
        );
    }};
}
