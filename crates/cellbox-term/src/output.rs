// SPDX-License-Identifier: MIT
//
// Output buffering and stateful cell writing.
//
//   OutputBuffer collects a whole frame of bytes so the driver sees a single
//   write per render.
//
//   CellWriter remembers the last color pair it emitted and where the
//   terminal cursor sits after the last character. A cell that continues
//   the current run with the same colors costs only its UTF-8 bytes.

use std::io::{self, Write};

use cellbox_terminfo::{Capabilities, Func};

use crate::ansi;
use crate::attr::{Attribute, OutputMode, Style};
use crate::cell::Cell;

// ─── OutputBuffer ────────────────────────────────────────────────────────────

/// Bytes accumulated for one write to the terminal.
#[derive(Debug, Default)]
pub struct OutputBuffer {
    bytes: Vec<u8>,
}

const FRAME_CAPACITY: usize = 8 * 1024;

impl OutputBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            bytes: Vec::with_capacity(FRAME_CAPACITY),
        }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[inline]
    pub fn push_bytes(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    /// Append `ch` as UTF-8.
    #[inline]
    pub fn push_char(&mut self, ch: char) {
        let mut enc = [0u8; 4];
        self.bytes.extend_from_slice(ch.encode_utf8(&mut enc).as_bytes());
    }

    /// Empty the buffer, keeping its capacity.
    #[inline]
    pub fn clear(&mut self) {
        self.bytes.clear();
    }
}

impl Write for OutputBuffer {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// ─── CellWriter ──────────────────────────────────────────────────────────────

/// Emits cells, skipping attribute changes and cursor moves the terminal
/// does not need.
///
/// - **Attributes** are re-sent only when the `(fg, bg)` pair differs from
///   the last pair sent. A change is always a full reset: `sgr0`, both
///   colors, then the style capabilities.
/// - **Cursor** moves are skipped when the cell sits right after the last
///   written column on the same row. Wide characters advance that column
///   by two.
#[allow(clippy::struct_field_names)]
#[derive(Debug)]
pub struct CellWriter {
    last_x: i32,
    last_y: i32,
    last_colors: Option<(Attribute, Attribute)>,
}

impl CellWriter {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last_x: -1,
            last_y: -1,
            last_colors: None,
        }
    }

    /// Forget everything. Call after anything that resets the terminal's
    /// attributes (a clear, a mode switch).
    #[allow(clippy::missing_const_for_fn)]
    pub fn reset_state(&mut self) {
        *self = Self::new();
    }

    /// Forget the cursor position but keep the color pair. The terminal
    /// cursor may have moved since the last frame.
    pub const fn reset_position(&mut self) {
        self.last_x = -1;
        self.last_y = -1;
    }

    /// Write `cell` at `(x, y)`.
    pub fn render_cell(
        &mut self,
        out: &mut OutputBuffer,
        caps: &Capabilities,
        mode: OutputMode,
        x: u16,
        y: u16,
        cell: Cell,
    ) {
        if self.last_colors != Some((cell.fg, cell.bg)) {
            send_attributes(out, caps, mode, cell.fg, cell.bg);
            self.last_colors = Some((cell.fg, cell.bg));
        }

        let xi = i32::from(x);
        let yi = i32::from(y);
        if yi != self.last_y || xi != self.last_x + 1 {
            // Writing into a Vec cannot fail.
            ansi::cursor_to(out, x, y).ok();
        }

        out.push_char(cell.printable());
        self.last_x = xi + i32::from(cell.width()) - 1;
        self.last_y = yi;
    }
}

impl Default for CellWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Full attribute reset for a color pair. Style flags from either side are
/// honored.
fn send_attributes(
    out: &mut OutputBuffer,
    caps: &Capabilities,
    mode: OutputMode,
    fg: Attribute,
    bg: Attribute,
) {
    out.push_bytes(caps.func(Func::Sgr0));
    ansi::fg(out, mode, fg).ok();
    ansi::bg(out, mode, bg).ok();

    let style = fg.style() | bg.style();
    for (flag, func) in [
        (Style::BOLD, Func::Bold),
        (Style::UNDERLINE, Func::Underline),
        (Style::BLINK, Func::Blink),
        (Style::REVERSE, Func::Reverse),
    ] {
        if style.contains(flag) {
            out.push_bytes(caps.func(func));
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use cellbox_terminfo::builtin;
    use pretty_assertions::assert_eq;

    fn xterm() -> Capabilities {
        builtin::exact("xterm").unwrap()
    }

    fn render_seq(mode: OutputMode, cells: &[(u16, u16, Cell)]) -> String {
        let caps = xterm();
        let mut out = OutputBuffer::new();
        let mut writer = CellWriter::new();
        for &(x, y, cell) in cells {
            writer.render_cell(&mut out, &caps, mode, x, y, cell);
        }
        String::from_utf8(out.as_bytes().to_vec()).unwrap()
    }

    // ── OutputBuffer ────────────────────────────────────────────────────

    #[test]
    fn write_trait_appends() {
        let mut buf = OutputBuffer::new();
        write!(buf, "n={}", 42).unwrap();
        buf.push_char('é');
        assert_eq!(buf.as_bytes(), "n=42é".as_bytes());
        assert_eq!(buf.len(), 6);
    }

    #[test]
    fn clear_keeps_capacity() {
        let mut buf = OutputBuffer::new();
        buf.push_bytes(b"data");
        let cap = buf.bytes.capacity();
        buf.clear();
        assert!(buf.is_empty());
        assert_eq!(buf.bytes.capacity(), cap);
    }

    // ── CellWriter: cursor ──────────────────────────────────────────────

    #[test]
    fn first_cell_resets_and_moves() {
        let out = render_seq(OutputMode::Normal, &[(5, 3, Cell::new('A'))]);
        assert_eq!(out, "\x1b(B\x1b[m\x1b[4;6HA");
    }

    #[test]
    fn adjacent_cells_skip_cursor_move() {
        let out = render_seq(
            OutputMode::Normal,
            &[(0, 0, Cell::new('A')), (1, 0, Cell::new('B')), (2, 0, Cell::new('C'))],
        );
        assert_eq!(out.matches('H').count(), 1);
        assert!(out.ends_with("ABC"));
    }

    #[test]
    fn gap_or_new_row_moves_cursor() {
        let out = render_seq(
            OutputMode::Normal,
            &[(0, 0, Cell::new('A')), (4, 0, Cell::new('B')), (0, 1, Cell::new('C'))],
        );
        assert!(out.contains("\x1b[1;5HB"));
        assert!(out.contains("\x1b[2;1HC"));
    }

    #[test]
    fn wide_char_advances_two_columns() {
        let out = render_seq(
            OutputMode::Normal,
            &[(0, 0, Cell::new('中')), (2, 0, Cell::new('x'))],
        );
        assert!(out.ends_with("中x"));
        assert_eq!(out.matches('H').count(), 1);
    }

    #[test]
    fn control_characters_are_written_as_spaces() {
        let out = render_seq(
            OutputMode::Normal,
            &[(0, 0, Cell::new('\x1b')), (1, 0, Cell::new('\n'))],
        );
        assert_eq!(out, "\x1b(B\x1b[m\x1b[1;1H  ");
    }

    // ── CellWriter: attributes ──────────────────────────────────────────

    #[test]
    fn same_pair_is_sent_once() {
        let red = Cell::new('a').with_fg(Attribute::RED);
        let out = render_seq(OutputMode::Normal, &[(0, 0, red), (1, 0, red)]);
        assert_eq!(out.matches("\x1b[31m").count(), 1);
    }

    #[test]
    fn pair_change_resends_everything() {
        let a = Cell::styled('a', Attribute::RED, Attribute::BLUE);
        let b = Cell::styled('b', Attribute::RED, Attribute::GREEN);
        let out = render_seq(OutputMode::Normal, &[(0, 0, a), (1, 0, b)]);
        assert_eq!(out.matches("\x1b(B\x1b[m").count(), 2);
        assert_eq!(out.matches("\x1b[31m").count(), 2);
        assert!(out.contains("\x1b[44m"));
        assert!(out.contains("\x1b[42m"));
    }

    #[test]
    fn style_flags_emit_capabilities_in_order() {
        let cell = Cell::styled(
            'a',
            Attribute::DEFAULT | Style::BOLD | Style::UNDERLINE,
            Attribute::DEFAULT | Style::REVERSE | Style::BLINK,
        );
        let out = render_seq(OutputMode::Normal, &[(0, 0, cell)]);
        assert_eq!(out, "\x1b(B\x1b[m\x1b[1m\x1b[4m\x1b[5m\x1b[7m\x1b[1;1Ha");
    }

    #[test]
    fn output_mode_selects_color_form() {
        let cell = Cell::styled('a', Attribute::color(10), Attribute::color(1));
        let out = render_seq(OutputMode::Output256, &[(0, 0, cell)]);
        assert!(out.contains("\x1b[38;5;9m\x1b[48;5;0m"));
    }

    #[test]
    fn reset_position_keeps_colors() {
        let caps = xterm();
        let mut out = OutputBuffer::new();
        let mut writer = CellWriter::new();
        let red = Cell::new('a').with_fg(Attribute::RED);
        writer.render_cell(&mut out, &caps, OutputMode::Normal, 0, 0, red);
        out.clear();
        writer.reset_position();
        writer.render_cell(&mut out, &caps, OutputMode::Normal, 1, 0, red);
        assert_eq!(out.as_bytes(), b"\x1b[1;2Ha");
    }
}
