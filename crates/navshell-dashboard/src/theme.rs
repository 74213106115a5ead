#![forbid(unsafe_code)]

//! Palette, spacing tokens, and cell styles for the shell.
//!
//! # Spacing System
//!
//! | Token | Value | Use Case |
//! |-------|-------|----------|
//! | `XS` | 1 | Tight spacing (icon to label, inline elements) |
//! | `SM` | 2 | Panel padding, content inset |
//! | `MD` | 3 | Top bar height |

use navshell_render::cell::{Cell, PackedRgba, StyleFlags};

pub mod spacing {
    pub const XS: u16 = 1;
    pub const SM: u16 = 2;
    pub const MD: u16 = 3;
}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

/// Terminals at least this wide get the fixed desktop sidebar.
pub const LAYOUT_WIDE_MIN_WIDTH: u16 = 100;
/// Desktop sidebar width.
pub const SIDEBAR_WIDTH: u16 = 30;
/// Mobile drawer width.
pub const DRAWER_WIDTH: u16 = 28;
/// Top bar height.
pub const TOP_BAR_HEIGHT: u16 = spacing::MD;
/// Widest the search field grows.
pub const SEARCH_MAX_WIDTH: u16 = 60;
/// Backdrop dim factor behind the drawer.
pub const BACKDROP_DIM: f32 = 0.4;

// ---------------------------------------------------------------------------
// Palette
// ---------------------------------------------------------------------------

pub mod palette {
    use super::PackedRgba;

    pub const PAGE_BG: PackedRgba = PackedRgba::rgb(0xF5, 0xF5, 0xF7);
    pub const PANEL_BG: PackedRgba = PackedRgba::rgb(0xFF, 0xFF, 0xFF);
    pub const SIDEBAR_BG: PackedRgba = PackedRgba::rgb(0x1A, 0x1D, 0x29);
    /// Sidebar background lifted 10% toward white.
    pub const SIDEBAR_RAISED: PackedRgba = PackedRgba::rgb(0x31, 0x34, 0x3E);
    pub const SIDEBAR_RULE: PackedRgba = PackedRgba::rgb(0x3A, 0x3D, 0x48);
    pub const TEXT_ON_DARK: PackedRgba = PackedRgba::rgb(0xFF, 0xFF, 0xFF);
    pub const MUTED_ON_DARK: PackedRgba = PackedRgba::rgb(0x9C, 0xA3, 0xAF);
    pub const TEXT: PackedRgba = PackedRgba::rgb(0x11, 0x18, 0x27);
    pub const MUTED: PackedRgba = PackedRgba::rgb(0x6B, 0x72, 0x80);
    pub const PLACEHOLDER: PackedRgba = PackedRgba::rgb(0x9C, 0xA3, 0xAF);
    pub const KBD_BG: PackedRgba = PackedRgba::rgb(0xF3, 0xF4, 0xF6);
    pub const ACCENT_AMBER: PackedRgba = PackedRgba::rgb(0xE6, 0xA8, 0x5C);
    pub const ACCENT_PINK: PackedRgba = PackedRgba::rgb(0xE8, 0x5A, 0x9B);
    pub const ACCENT_VIOLET: PackedRgba = PackedRgba::rgb(0xD9, 0x46, 0xEF);
    pub const SUCCESS_BG: PackedRgba = PackedRgba::rgb(0x16, 0xA3, 0x4A);
    pub const DANGER: PackedRgba = PackedRgba::rgb(0xEF, 0x44, 0x44);
}

// ---------------------------------------------------------------------------
// Cell styles
// ---------------------------------------------------------------------------

/// Blank page background.
pub fn page() -> Cell {
    Cell::blank(palette::PAGE_BG)
}

/// Body text on the page.
pub fn page_text() -> Cell {
    Cell::default().with_fg(palette::TEXT)
}

pub fn page_muted() -> Cell {
    Cell::default().with_fg(palette::MUTED)
}

pub fn page_heading() -> Cell {
    Cell::default()
        .with_fg(palette::TEXT)
        .with_attrs(StyleFlags::BOLD)
}

/// Blank sidebar/drawer background.
pub fn sidebar() -> Cell {
    Cell::blank(palette::SIDEBAR_BG)
}

pub fn sidebar_text() -> Cell {
    Cell::default().with_fg(palette::TEXT_ON_DARK)
}

pub fn sidebar_muted() -> Cell {
    Cell::default().with_fg(palette::MUTED_ON_DARK)
}

pub fn sidebar_rule() -> Cell {
    Cell::from_char('─').with_fg(palette::SIDEBAR_RULE)
}

/// A navigation row; the active entry is raised and bold.
pub fn nav_item(active: bool) -> Cell {
    if active {
        Cell::default()
            .with_fg(palette::TEXT_ON_DARK)
            .with_bg(palette::SIDEBAR_RAISED)
            .with_attrs(StyleFlags::BOLD)
    } else {
        sidebar_muted()
    }
}

/// Keyboard cursor marker in front of a navigation row.
pub fn nav_cursor() -> Cell {
    Cell::from_char('▸').with_fg(palette::ACCENT_PINK)
}

/// Round avatar/badge accent.
pub fn accent_badge() -> Cell {
    Cell::default()
        .with_fg(palette::TEXT_ON_DARK)
        .with_bg(palette::ACCENT_PINK)
        .with_attrs(StyleFlags::BOLD)
}

/// The upgrade button.
pub fn upgrade_button() -> Cell {
    Cell::blank(palette::ACCENT_VIOLET)
        .with_fg(palette::TEXT_ON_DARK)
        .with_attrs(StyleFlags::BOLD)
}

/// Card background inside the sidebar.
pub fn card() -> Cell {
    Cell::blank(palette::SIDEBAR_RAISED)
}

pub fn panel() -> Cell {
    Cell::blank(palette::PANEL_BG)
}

pub fn panel_border() -> Cell {
    Cell::default()
        .with_fg(palette::KBD_BG)
        .with_bg(palette::PANEL_BG)
}

pub fn kbd() -> Cell {
    Cell::default()
        .with_fg(palette::MUTED)
        .with_bg(palette::KBD_BG)
        .with_attrs(StyleFlags::BOLD)
}

pub fn unread_dot() -> Cell {
    Cell::from_char('•').with_fg(palette::DANGER)
}

pub fn success_banner() -> Cell {
    Cell::blank(palette::SUCCESS_BG)
        .with_fg(palette::TEXT_ON_DARK)
        .with_attrs(StyleFlags::BOLD)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_fits_sidebar_and_content() {
        assert!(SIDEBAR_WIDTH * 2 < LAYOUT_WIDE_MIN_WIDTH);
        assert!(DRAWER_WIDTH <= SIDEBAR_WIDTH);
    }

    #[test]
    fn active_nav_is_distinguishable() {
        assert_ne!(nav_item(true), nav_item(false));
        assert!(nav_item(true).attrs.contains(StyleFlags::BOLD));
        assert!(nav_item(true).bg.is_set());
    }

    #[test]
    fn opaque_backgrounds() {
        for cell in [page(), sidebar(), card(), panel(), success_banner(), upgrade_button()] {
            assert_eq!(cell.bg.a(), 255);
        }
    }
}
