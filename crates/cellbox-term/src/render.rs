// SPDX-License-Identifier: MIT
//
// Differential renderer.
//
// The renderer owns the front buffer: what the terminal is believed to be
// showing. Each render walks the caller's back buffer, emits only the cells
// that differ from the front buffer, and copies them across. Once a render
// returns, front equals back, and rendering again without changes emits
// nothing at all.
//
// Per frame:
//
//   1. Unchanged rows are skipped with one slice comparison.
//   2. Changed cells go through CellWriter, which elides repeated attribute
//      pairs and contiguous cursor moves.
//   3. The terminal cursor is parked at the session cursor, if visible.
//   4. The caller hands output_bytes() to the driver in one write.
//
// After a resize the front buffer is refilled and a force flag makes the
// next render redraw every cell, even cells that happen to compare equal.

use tracing::trace;

use cellbox_terminfo::Capabilities;

use crate::ansi;
use crate::attr::OutputMode;
use crate::buffer::CellBuffer;
use crate::cell::Cell;
use crate::output::{CellWriter, OutputBuffer};

// ─── RenderStats ─────────────────────────────────────────────────────────────

/// What a render pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderStats {
    /// Cells that differed from the front buffer and were written.
    pub cells_rendered: usize,
    /// Cells that matched and were skipped.
    pub cells_skipped: usize,
    /// Bytes this pass appended to the output.
    pub bytes_written: usize,
}

impl RenderStats {
    #[inline]
    #[must_use]
    pub const fn total_cells(&self) -> usize {
        self.cells_rendered + self.cells_skipped
    }
}

// ─── DiffRenderer ────────────────────────────────────────────────────────────

/// Front buffer plus the output state needed to bring the terminal in line
/// with a back buffer.
#[derive(Debug)]
pub struct DiffRenderer {
    front: CellBuffer,
    output: OutputBuffer,
    writer: CellWriter,
    force_redraw: bool,
    /// Where the last render left the visible cursor.
    parked_cursor: Option<(u16, u16)>,
}

impl DiffRenderer {
    /// A renderer whose front buffer is `width × height` cells of `fill`,
    /// matching a freshly cleared screen.
    #[must_use]
    pub fn new(width: u16, height: u16, fill: Cell) -> Self {
        Self {
            front: CellBuffer::new(width, height, fill),
            output: OutputBuffer::new(),
            writer: CellWriter::new(),
            force_redraw: false,
            parked_cursor: None,
        }
    }

    /// What the terminal is believed to show.
    #[inline]
    #[must_use]
    pub const fn front(&self) -> &CellBuffer {
        &self.front
    }

    /// Resize and refill the front buffer. The next render redraws every
    /// cell.
    pub fn resize(&mut self, width: u16, height: u16, fill: Cell) {
        self.front = CellBuffer::new(width, height, fill);
        self.force_redraw();
    }

    /// Make the next render treat every cell as changed.
    pub fn force_redraw(&mut self) {
        self.force_redraw = true;
        self.invalidate();
    }

    /// Forget the terminal's attribute and cursor state, e.g. after a
    /// screen clear or an output mode change.
    pub fn invalidate(&mut self) {
        self.writer.reset_state();
        self.parked_cursor = None;
    }

    /// Diff `back` against the front buffer and append the escape
    /// sequences that reconcile them.
    ///
    /// `cursor` is where the visible cursor should end up, or `None` when
    /// it is hidden. Nothing is written to the terminal; take the bytes
    /// from [`output_bytes`](Self::output_bytes).
    pub fn render(
        &mut self,
        back: &CellBuffer,
        caps: &Capabilities,
        mode: OutputMode,
        cursor: Option<(u16, u16)>,
    ) -> RenderStats {
        if back.width() != self.front.width() || back.height() != self.front.height() {
            self.resize(back.width(), back.height(), Cell::BLANK);
        }

        let start_len = self.output.len();
        let width = back.width();
        let mut stats = RenderStats::default();
        self.writer.reset_position();

        for y in 0..back.height() {
            let (Some(back_row), Some(front_row)) = (back.row(y), self.front.row(y)) else {
                continue;
            };
            if !self.force_redraw && back_row == front_row {
                stats.cells_skipped += usize::from(width);
                continue;
            }

            let mut x = 0;
            while x < width {
                let (Some(&cell), Some(front)) = (back.get(x, y), self.front.get_mut(x, y)) else {
                    x += 1;
                    continue;
                };
                if !self.force_redraw && *front == cell {
                    stats.cells_skipped += 1;
                    x += 1;
                    continue;
                }
                *front = cell;

                // A wide glyph in the last column would wrap.
                let drawn = if cell.width() == 2 && x + 1 >= width {
                    Cell::blank(cell.fg, cell.bg)
                } else {
                    cell
                };
                self.writer
                    .render_cell(&mut self.output, caps, mode, x, y, drawn);
                stats.cells_rendered += 1;

                if drawn.width() == 2 {
                    // The glyph covers the next column; writing it would erase the glyph.
                    if let (Some(&next), Some(front)) =
                        (back.get(x + 1, y), self.front.get_mut(x + 1, y))
                    {
                        *front = next;
                    }
                    stats.cells_skipped += 1;
                    x += 2;
                } else {
                    x += 1;
                }
            }
        }
        self.force_redraw = false;

        if let Some((cx, cy)) = cursor {
            if stats.cells_rendered > 0 || self.parked_cursor != cursor {
                ansi::cursor_to(&mut self.output, cx, cy).ok();
            }
        }
        self.parked_cursor = cursor;

        stats.bytes_written = self.output.len() - start_len;
        trace!(
            rendered = stats.cells_rendered,
            skipped = stats.cells_skipped,
            bytes = stats.bytes_written,
            "render pass"
        );
        stats
    }

    /// Append bytes to be sent with the next flush (mode switches, clears).
    #[inline]
    pub fn queue(&mut self, bytes: &[u8]) {
        self.output.push_bytes(bytes);
    }

    /// Everything appended since the last [`clear_output`](Self::clear_output).
    #[inline]
    #[must_use]
    pub fn output_bytes(&self) -> &[u8] {
        self.output.as_bytes()
    }

    #[inline]
    pub fn clear_output(&mut self) {
        self.output.clear();
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
