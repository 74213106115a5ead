#![forbid(unsafe_code)]

//! Cell types: content, colors, and style flags.

/// What a cell shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum CellContent {
    /// Nothing drawn; presented as a space.
    #[default]
    Empty,
    /// A single character.
    Char(char),
    /// Trailing half of a wide character drawn in the cell to the left.
    Continuation,
}

impl CellContent {
    /// The character, if this cell holds one.
    #[inline]
    pub const fn as_char(self) -> Option<char> {
        match self {
            Self::Char(c) => Some(c),
            _ => None,
        }
    }
}

/// A packed RGBA color.
///
/// Alpha 0 means "no color set": the terminal default is used when presenting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[repr(transparent)]
pub struct PackedRgba(pub u32);

impl PackedRgba {
    /// Fully transparent (alpha = 0).
    pub const TRANSPARENT: Self = Self(0);
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    /// Create an opaque RGB color.
    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    /// Create an RGBA color with explicit alpha.
    #[inline]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self(((r as u32) << 24) | ((g as u32) << 16) | ((b as u32) << 8) | (a as u32))
    }

    /// Red channel.
    #[inline]
    pub const fn r(self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// Green channel.
    #[inline]
    pub const fn g(self) -> u8 {
        (self.0 >> 16) as u8
    }

    /// Blue channel.
    #[inline]
    pub const fn b(self) -> u8 {
        (self.0 >> 8) as u8
    }

    /// Alpha channel.
    #[inline]
    pub const fn a(self) -> u8 {
        self.0 as u8
    }

    /// Whether any color is set.
    #[inline]
    pub const fn is_set(self) -> bool {
        self.a() > 0
    }

    /// Scale RGB toward black by `factor` in `[0.0, 1.0]` (1.0 = unchanged).
    pub fn darken(self, factor: f32) -> Self {
        if !self.is_set() {
            return self;
        }
        let f = factor.clamp(0.0, 1.0);
        let scale = |c: u8| ((c as f32) * f).round() as u8;
        Self::rgba(scale(self.r()), scale(self.g()), scale(self.b()), self.a())
    }
}

bitflags::bitflags! {
    /// Cell style flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct StyleFlags: u8 {
        /// Bold / increased intensity.
        const BOLD          = 0b0000_0001;
        /// Dim / decreased intensity.
        const DIM           = 0b0000_0010;
        /// Italic text.
        const ITALIC        = 0b0000_0100;
        /// Underlined text.
        const UNDERLINE     = 0b0000_1000;
        /// Reverse video.
        const REVERSE       = 0b0010_0000;
    }
}

/// A single terminal cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    /// Character content.
    pub content: CellContent,
    /// Foreground color.
    pub fg: PackedRgba,
    /// Background color.
    pub bg: PackedRgba,
    /// Style flags.
    pub attrs: StyleFlags,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            content: CellContent::Empty,
            fg: PackedRgba::TRANSPARENT,
            bg: PackedRgba::TRANSPARENT,
            attrs: StyleFlags::empty(),
        }
    }
}

impl Cell {
    /// Trailing half of a wide character.
    pub const CONTINUATION: Self = Self {
        content: CellContent::Continuation,
        fg: PackedRgba::TRANSPARENT,
        bg: PackedRgba::TRANSPARENT,
        attrs: StyleFlags::empty(),
    };

    /// A cell showing `c` with no colors set.
    #[inline]
    pub const fn from_char(c: char) -> Self {
        Self {
            content: CellContent::Char(c),
            fg: PackedRgba::TRANSPARENT,
            bg: PackedRgba::TRANSPARENT,
            attrs: StyleFlags::empty(),
        }
    }

    /// A blank cell carrying only a background color.
    #[inline]
    pub const fn blank(bg: PackedRgba) -> Self {
        Self {
            content: CellContent::Char(' '),
            fg: PackedRgba::TRANSPARENT,
            bg,
            attrs: StyleFlags::empty(),
        }
    }

    /// Whether this is the trailing half of a wide character.
    #[inline]
    pub const fn is_continuation(&self) -> bool {
        matches!(self.content, CellContent::Continuation)
    }

    /// Whether nothing was drawn here.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        matches!(self.content, CellContent::Empty)
    }

    /// Replace the character, keeping colors and flags.
    #[inline]
    pub const fn with_char(mut self, c: char) -> Self {
        self.content = CellContent::Char(c);
        self
    }

    /// Set the foreground color.
    #[inline]
    pub const fn with_fg(mut self, fg: PackedRgba) -> Self {
        self.fg = fg;
        self
    }

    /// Set the background color.
    #[inline]
    pub const fn with_bg(mut self, bg: PackedRgba) -> Self {
        self.bg = bg;
        self
    }

    /// Set the style flags.
    #[inline]
    pub const fn with_attrs(mut self, attrs: StyleFlags) -> Self {
        self.attrs = attrs;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgba_channels_round_trip() {
        let c = PackedRgba::rgba(0x1A, 0x1D, 0x29, 0xFF);
        assert_eq!((c.r(), c.g(), c.b(), c.a()), (0x1A, 0x1D, 0x29, 0xFF));
    }

    #[test]
    fn transparent_is_unset() {
        assert!(!PackedRgba::TRANSPARENT.is_set());
        assert!(PackedRgba::BLACK.is_set());
    }

    #[test]
    fn darken_halves_channels() {
        let c = PackedRgba::rgb(200, 100, 50).darken(0.5);
        assert_eq!((c.r(), c.g(), c.b()), (100, 50, 25));
        assert_eq!(c.a(), 255);
    }

    #[test]
    fn darken_leaves_transparent_alone() {
        assert_eq!(PackedRgba::TRANSPARENT.darken(0.2), PackedRgba::TRANSPARENT);
    }

    #[test]
    fn default_cell_is_empty() {
        let cell = Cell::default();
        assert!(cell.is_empty());
        assert!(!cell.is_continuation());
        assert_eq!(cell.content.as_char(), None);
    }

    #[test]
    fn builders_compose() {
        let cell = Cell::from_char('x')
            .with_fg(PackedRgba::WHITE)
            .with_bg(PackedRgba::BLACK)
            .with_attrs(StyleFlags::BOLD);
        assert_eq!(cell.content.as_char(), Some('x'));
        assert_eq!(cell.fg, PackedRgba::WHITE);
        assert_eq!(cell.bg, PackedRgba::BLACK);
        assert!(cell.attrs.contains(StyleFlags::BOLD));
        assert_eq!(cell.with_char('y').fg, PackedRgba::WHITE);
    }
}
