// SPDX-License-Identifier: MIT
//
// Cell: one character position on screen.
//
// A cell is a char plus a foreground and a background Attribute. Equality is
// structural, and the renderer redraws exactly the cells whose value differs
// between the front and back buffers.
//
// Wide characters (CJK, most emoji) occupy two columns on screen but one
// cell here. The renderer skips the cell to the right of a wide character,
// since the glyph already covers it, and draws a space instead of a wide
// character that would not fit in the last column. Control characters are
// drawn as spaces.

use std::fmt;

use unicode_width::UnicodeWidthChar;

use crate::attr::Attribute;

/// A single terminal cell.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    pub ch: char,
    pub fg: Attribute,
    pub bg: Attribute,
}

impl Cell {
    /// Space on default colors.
    pub const BLANK: Self = Self::styled(' ', Attribute::DEFAULT, Attribute::DEFAULT);

    /// A cell with `ch` on default colors.
    #[inline]
    #[must_use]
    pub const fn new(ch: char) -> Self {
        Self::styled(ch, Attribute::DEFAULT, Attribute::DEFAULT)
    }

    #[inline]
    #[must_use]
    pub const fn styled(ch: char, fg: Attribute, bg: Attribute) -> Self {
        Self { ch, fg, bg }
    }

    /// A space with the given colors. What a clear fills the buffer with.
    #[inline]
    #[must_use]
    pub const fn blank(fg: Attribute, bg: Attribute) -> Self {
        Self::styled(' ', fg, bg)
    }

    #[inline]
    #[must_use]
    pub const fn with_fg(self, fg: Attribute) -> Self {
        Self { fg, ..self }
    }

    #[inline]
    #[must_use]
    pub const fn with_bg(self, bg: Attribute) -> Self {
        Self { bg, ..self }
    }

    /// Columns the character occupies on screen: 1 or 2.
    ///
    /// Zero-width and control characters count as 1, since the renderer
    /// always writes something into the cell's column.
    #[inline]
    #[must_use]
    pub fn width(self) -> u16 {
        match self.ch.width() {
            Some(2) => 2,
            _ => 1,
        }
    }

    /// The character to send to the terminal: C0 controls and DEL become a
    /// space so they cannot move the cursor or start a sequence.
    #[inline]
    #[must_use]
    pub const fn printable(self) -> char {
        if self.ch < ' ' || self.ch == '\x7f' {
            ' '
        } else {
            self.ch
        }
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::BLANK
    }
}

impl fmt::Debug for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cell({:?}, fg={:#06x}, bg={:#06x})", self.ch, self.fg.bits(), self.bg.bits())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
