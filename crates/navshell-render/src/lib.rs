#![forbid(unsafe_code)]

//! Render kernel: cells, buffers, drawing, hit testing, and ANSI presentation.
//!
//! `Model::view()` draws into a [`frame::Frame`]; the runtime hands the
//! resulting [`buffer::Buffer`] to a [`presenter::Presenter`], and tests read
//! it back as text.

pub mod buffer;
pub mod cell;
pub mod drawing;
pub mod frame;
pub mod presenter;

/// Display width of a string in terminal cells.
#[inline]
pub fn display_width(text: &str) -> usize {
    unicode_width::UnicodeWidthStr::width(text)
}

/// Truncate `text` so it fits in `max` cells, appending `…` when cut.
pub fn truncate_to_width(text: &str, max: usize) -> String {
    use unicode_width::UnicodeWidthChar;

    if display_width(text) <= max {
        return text.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w > max - 1 {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_width_ascii_and_wide() {
        assert_eq!(display_width("abc"), 3);
        assert_eq!(display_width("日本"), 4);
    }

    #[test]
    fn truncate_short_text_is_unchanged() {
        assert_eq!(truncate_to_width("owner", 10), "owner");
    }

    #[test]
    fn truncate_long_text_adds_ellipsis() {
        assert_eq!(truncate_to_width("owner@example.com", 8), "owner@e…");
        assert_eq!(display_width(&truncate_to_width("owner@example.com", 8)), 8);
    }

    #[test]
    fn truncate_to_zero() {
        assert_eq!(truncate_to_width("abc", 0), "");
    }
}
