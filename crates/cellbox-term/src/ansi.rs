// SPDX-License-Identifier: MIT
//
// Escape sequences that are not terminfo capabilities.
//
// Cursor addressing, color SGRs, and palette programming are the same on
// every terminal this crate drives, so they are generated here rather than
// looked up. Everything else (alternate screen, sgr0, bold, ...) comes from
// the capability table.
//
// Coordinates are 0-based in the API and 1-based on the wire.

use std::io::{self, Write};

use crate::attr::{Attribute, ColorCode, OutputMode};

/// Resets every palette entry to the terminal's default (OSC 104).
pub const RESET_PALETTE: &[u8] = b"\x1b]104\x1b\\";

/// Written by the panic hook: leave the alternate screen, show the cursor,
/// drop attributes, disable mouse reporting.
pub const EMERGENCY_RESTORE: &[u8] =
    b"\x1b[?1000l\x1b[?1002l\x1b[?1006l\x1b[0m\x1b[?25h\x1b[?1049l";

// ─── Cursor ──────────────────────────────────────────────────────────────────

/// Move the cursor to `(x, y)` (CUP).
#[inline]
pub fn cursor_to(w: &mut impl Write, x: u16, y: u16) -> io::Result<()> {
    write!(w, "\x1b[{};{}H", u32::from(y) + 1, u32::from(x) + 1)
}

// ─── Color ───────────────────────────────────────────────────────────────────

/// Foreground SGR for `attr`'s color under `mode`. Writes nothing for the
/// terminal default.
pub fn fg(w: &mut impl Write, mode: OutputMode, attr: Attribute) -> io::Result<()> {
    match mode.encode(attr.color_value()) {
        Some(ColorCode::Ansi(n)) => write!(w, "\x1b[3{n}m"),
        Some(ColorCode::Indexed(n)) => write!(w, "\x1b[38;5;{n}m"),
        None => Ok(()),
    }
}

/// Background SGR for `attr`'s color under `mode`.
pub fn bg(w: &mut impl Write, mode: OutputMode, attr: Attribute) -> io::Result<()> {
    match mode.encode(attr.color_value()) {
        Some(ColorCode::Ansi(n)) => write!(w, "\x1b[4{n}m"),
        Some(ColorCode::Indexed(n)) => write!(w, "\x1b[48;5;{n}m"),
        None => Ok(()),
    }
}

// ─── Palette ─────────────────────────────────────────────────────────────────

/// Load palette entry `slot` with an RGB value (OSC 4).
pub fn palette_entry(w: &mut impl Write, slot: u8, [r, g, b]: [u8; 3]) -> io::Result<()> {
    write!(w, "\x1b]4;{slot};rgb:{r:02x}/{g:02x}/{b:02x}\x1b\\")
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attr::Style;

    fn emit(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut out = Vec::new();
        f(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn cursor_is_one_based() {
        assert_eq!(emit(|w| cursor_to(w, 0, 0)), "\x1b[1;1H");
        assert_eq!(emit(|w| cursor_to(w, 5, 3)), "\x1b[4;6H");
        assert_eq!(emit(|w| cursor_to(w, u16::MAX, 0)), "\x1b[1;65536H");
    }

    #[test]
    fn normal_colors_use_short_form() {
        assert_eq!(emit(|w| fg(w, OutputMode::Normal, Attribute::RED)), "\x1b[31m");
        assert_eq!(emit(|w| bg(w, OutputMode::Normal, Attribute::WHITE)), "\x1b[47m");
    }

    #[test]
    fn style_bits_do_not_leak_into_color() {
        let attr = Attribute::BLUE | Style::BOLD | Style::REVERSE;
        assert_eq!(emit(|w| fg(w, OutputMode::Normal, attr)), "\x1b[34m");
    }

    #[test]
    fn default_color_writes_nothing() {
        assert_eq!(emit(|w| fg(w, OutputMode::Output256, Attribute::DEFAULT)), "");
        assert_eq!(emit(|w| bg(w, OutputMode::Normal, Attribute::color(9))), "");
    }

    #[test]
    fn indexed_modes_use_extended_form() {
        assert_eq!(
            emit(|w| fg(w, OutputMode::Output256, Attribute::color(200))),
            "\x1b[38;5;199m"
        );
        assert_eq!(
            emit(|w| bg(w, OutputMode::Grayscale, Attribute::color(1))),
            "\x1b[48;5;232m"
        );
        assert_eq!(
            emit(|w| fg(w, OutputMode::Rgb, Attribute::from_palette(7))),
            "\x1b[38;5;7m"
        );
    }

    #[test]
    fn palette_entry_is_lower_hex() {
        assert_eq!(
            emit(|w| palette_entry(w, 17, [0xAB, 0x05, 0xFF])),
            "\x1b]4;17;rgb:ab/05/ff\x1b\\"
        );
    }
}
