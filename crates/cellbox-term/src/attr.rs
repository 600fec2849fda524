// SPDX-License-Identifier: MIT
//
// Packed cell attributes and output modes.
//
// An Attribute is one u16:
//
//   bits 0..=8   color selector, 0 = terminal default, 1..=256 otherwise
//   bit  9       BOLD
//   bit  10      UNDERLINE
//   bit  11      REVERSE
//   bit  12      BLINK
//
// The selector has no fixed meaning. The active OutputMode decides whether
// value 3 is ANSI green, cube entry 2, or the third gray step.

use std::ops::BitOr;

// ─── Style ───────────────────────────────────────────────────────────────────

bitflags::bitflags! {
    /// Style flags carried in the high bits of an [`Attribute`].
    ///
    /// Flags compose freely with each other and with any color:
    ///
    /// ```
    /// use cellbox_term::attr::{Attribute, Style};
    ///
    /// let attr = Attribute::RED | Style::BOLD | Style::UNDERLINE;
    /// assert_eq!(attr.color_value(), 2);
    /// assert!(attr.style().contains(Style::BOLD));
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct Style: u16 {
        const BOLD      = 1 << 9;
        const UNDERLINE = 1 << 10;
        const REVERSE   = 1 << 11;
        const BLINK     = 1 << 12;
    }
}

// ─── Attribute ───────────────────────────────────────────────────────────────

/// A color selector plus style flags, packed into 16 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Attribute(u16);

impl Attribute {
    /// Bits holding the color selector.
    pub const COLOR_MASK: u16 = 0x01FF;

    /// Largest valid color selector.
    pub const MAX_COLOR: u16 = 256;

    pub const DEFAULT: Self = Self(0);
    pub const BLACK: Self = Self(1);
    pub const RED: Self = Self(2);
    pub const GREEN: Self = Self(3);
    pub const YELLOW: Self = Self(4);
    pub const BLUE: Self = Self(5);
    pub const MAGENTA: Self = Self(6);
    pub const CYAN: Self = Self(7);
    pub const WHITE: Self = Self(8);

    /// Attribute with color selector `value` and no style.
    ///
    /// Only the low 9 bits are kept. Selectors above 256 are representable
    /// but render as the terminal default.
    #[inline]
    #[must_use]
    pub const fn color(value: u16) -> Self {
        Self(value & Self::COLOR_MASK)
    }

    /// Attribute selecting palette slot `slot` (selector `slot + 1`).
    #[inline]
    #[must_use]
    pub const fn from_palette(slot: u8) -> Self {
        Self(slot as u16 + 1)
    }

    /// Reassemble an attribute from [`bits`](Self::bits).
    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    #[inline]
    #[must_use]
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// The raw color selector, `0..=511`.
    #[inline]
    #[must_use]
    pub const fn color_value(self) -> u16 {
        self.0 & Self::COLOR_MASK
    }

    /// Palette slot this attribute selects, if the selector is `1..=256`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // value - 1 is at most 255
    pub const fn palette_index(self) -> Option<u8> {
        match self.color_value() {
            value @ 1..=Self::MAX_COLOR => Some((value - 1) as u8),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub const fn style(self) -> Style {
        Style::from_bits_truncate(self.0)
    }

    /// Same color, with `style` added.
    #[inline]
    #[must_use]
    pub const fn with_style(self, style: Style) -> Self {
        Self(self.0 | style.bits())
    }
}

impl BitOr<Style> for Attribute {
    type Output = Self;

    fn bitor(self, rhs: Style) -> Self {
        self.with_style(rhs)
    }
}

impl From<Style> for Attribute {
    fn from(style: Style) -> Self {
        Self(style.bits())
    }
}

// ─── OutputMode ──────────────────────────────────────────────────────────────

/// How color selectors are turned into SGR sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum OutputMode {
    /// Query only; never stored as the active mode.
    Current,
    /// 8 ANSI colors, selectors `1..=8`.
    #[default]
    Normal,
    /// 24-step gray ramp, selectors `1..=24`.
    Grayscale,
    /// 6×6×6 color cube, selectors `1..=216`.
    Cube216,
    /// Full 256-color palette, selectors `1..=256`.
    Output256,
    /// 256 palette slots loaded with arbitrary RGB values.
    Rgb,
}

/// The SGR color parameter chosen for a selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorCode {
    /// `3n` / `4n`, `n` in `0..=7`.
    Ansi(u8),
    /// `38;5;n` / `48;5;n`.
    Indexed(u8),
}

impl OutputMode {
    /// Whether the mode needs a 256-color terminal.
    #[inline]
    #[must_use]
    pub const fn needs_256_colors(self) -> bool {
        matches!(
            self,
            Self::Grayscale | Self::Cube216 | Self::Output256 | Self::Rgb
        )
    }

    /// SGR parameter for color selector `value`, or `None` for the terminal
    /// default (selector 0 or out of range for the mode).
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // every arm bounds the result to u8
    pub const fn encode(self, value: u16) -> Option<ColorCode> {
        match self {
            Self::Current | Self::Normal => match value {
                1..=8 => Some(ColorCode::Ansi((value - 1) as u8)),
                _ => None,
            },
            Self::Grayscale => match value {
                1..=24 => Some(ColorCode::Indexed((value - 1 + 232) as u8)),
                _ => None,
            },
            Self::Cube216 => match value {
                1..=216 => Some(ColorCode::Indexed((value - 1 + 16) as u8)),
                _ => None,
            },
            Self::Output256 | Self::Rgb => match value {
                1..=256 => Some(ColorCode::Indexed((value - 1) as u8)),
                _ => None,
            },
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
