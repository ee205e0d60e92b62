#![forbid(unsafe_code)]

//! Cell types.
//!
//! The `Cell` is the fundamental unit of the terminal grid: one character
//! plus the attributes needed to draw it. Cell equality is what the shadow
//! buffer uses to decide whether a position actually changed, so every field
//! participates in `PartialEq`/`Eq`.

use bitflags::bitflags;
use unicode_width::UnicodeWidthChar;

bitflags! {
    /// Per-cell style attributes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StyleFlags: u8 {
        /// Bold/increased intensity.
        const BOLD          = 0b0000_0001;
        /// Dim/decreased intensity.
        const DIM           = 0b0000_0010;
        /// Italic.
        const ITALIC        = 0b0000_0100;
        /// Underline.
        const UNDERLINE     = 0b0000_1000;
        /// Swap foreground and background.
        const REVERSE       = 0b0001_0000;
        /// Strikethrough.
        const STRIKETHROUGH = 0b0010_0000;
    }
}

impl Default for StyleFlags {
    fn default() -> Self {
        Self::empty()
    }
}

/// A cell color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Color {
    /// The terminal's configured default for the channel.
    #[default]
    Default,

    /// One of the 256 indexed ANSI colors.
    Ansi(u8),

    /// 24-bit truecolor.
    Rgb(u8, u8, u8),
}

/// One terminal cell: a character plus its rendering attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    /// The character to draw.
    pub ch: char,
    /// Foreground color.
    pub fg: Color,
    /// Background color.
    pub bg: Color,
    /// Style attributes.
    pub flags: StyleFlags,
}

impl Default for Cell {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Cell {
    /// A blank cell with default colors and no attributes.
    pub const EMPTY: Self = Self {
        ch: ' ',
        fg: Color::Default,
        bg: Color::Default,
        flags: StyleFlags::empty(),
    };

    /// Create a cell with the given character and default style.
    #[inline]
    pub const fn from_char(ch: char) -> Self {
        Self {
            ch,
            fg: Color::Default,
            bg: Color::Default,
            flags: StyleFlags::empty(),
        }
    }

    /// Replace the foreground color.
    #[must_use]
    #[inline]
    pub const fn with_fg(mut self, fg: Color) -> Self {
        self.fg = fg;
        self
    }

    /// Replace the background color.
    #[must_use]
    #[inline]
    pub const fn with_bg(mut self, bg: Color) -> Self {
        self.bg = bg;
        self
    }

    /// Replace the style attributes.
    #[must_use]
    #[inline]
    pub const fn with_flags(mut self, flags: StyleFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Display width of this cell's character (0 for control characters,
    /// 2 for wide CJK forms).
    #[inline]
    pub fn width(&self) -> usize {
        UnicodeWidthChar::width(self.ch).unwrap_or(0)
    }

    /// Check if the character occupies more than one column.
    #[inline]
    pub fn is_wide(&self) -> bool {
        self.width() > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_empty() {
        assert_eq!(Cell::default(), Cell::EMPTY);
        assert_eq!(Cell::EMPTY.ch, ' ');
        assert_eq!(Cell::EMPTY.fg, Color::Default);
        assert!(Cell::EMPTY.flags.is_empty());
    }

    #[test]
    fn equality_drives_change_detection() {
        let a = Cell::from_char('x');
        let b = Cell::from_char('x');
        assert_eq!(a, b);

        // A style-only difference is still a change.
        let styled = b.with_flags(StyleFlags::BOLD);
        assert_ne!(a, styled);

        let colored = b.with_fg(Color::Ansi(4));
        assert_ne!(a, colored);

        let truecolor = b.with_bg(Color::Rgb(10, 20, 30));
        assert_ne!(a, truecolor);
    }

    #[test]
    fn builders_compose() {
        let cell = Cell::from_char('q')
            .with_fg(Color::Rgb(1, 2, 3))
            .with_bg(Color::Ansi(7))
            .with_flags(StyleFlags::BOLD | StyleFlags::UNDERLINE);
        assert_eq!(cell.ch, 'q');
        assert_eq!(cell.fg, Color::Rgb(1, 2, 3));
        assert_eq!(cell.bg, Color::Ansi(7));
        assert!(cell.flags.contains(StyleFlags::BOLD));
        assert!(cell.flags.contains(StyleFlags::UNDERLINE));
        assert!(!cell.flags.contains(StyleFlags::ITALIC));
    }

    #[test]
    fn width_ascii_and_wide() {
        assert_eq!(Cell::from_char('a').width(), 1);
        assert_eq!(Cell::from_char(' ').width(), 1);
        assert_eq!(Cell::from_char('世').width(), 2);
        assert!(Cell::from_char('世').is_wide());
        assert!(!Cell::from_char('a').is_wide());
    }

    #[test]
    fn width_control_char_is_zero() {
        assert_eq!(Cell::from_char('\u{0007}').width(), 0);
    }
}
