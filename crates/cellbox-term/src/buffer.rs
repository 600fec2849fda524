// SPDX-License-Identifier: MIT
//
// CellBuffer: a width × height grid of cells in row-major order.
//
// A session keeps two of these: the back buffer the caller draws into and
// the front buffer holding what the terminal is believed to show. The
// renderer compares them cell by cell.
//
// Resizing keeps the overlapping top-left rectangle and fills everything
// else with the caller's fill cell, so a window that shrinks and grows back
// loses only what fell outside the smaller size.

use crate::cell::Cell;

/// A 2-D grid of [`Cell`]s.
///
/// ```
/// use cellbox_term::buffer::CellBuffer;
/// use cellbox_term::cell::Cell;
///
/// let mut buf = CellBuffer::new(80, 24, Cell::BLANK);
/// assert!(buf.set(5, 3, Cell::new('X')));
/// assert_eq!(buf.get(5, 3).map(|c| c.ch), Some('X'));
/// assert!(!buf.set(80, 0, Cell::new('Y')));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellBuffer {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
}

impl CellBuffer {
    /// A buffer filled with `fill`.
    #[must_use]
    pub fn new(width: u16, height: u16, fill: Cell) -> Self {
        Self {
            width,
            height,
            cells: vec![fill; usize::from(width) * usize::from(height)],
        }
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    #[inline]
    #[must_use]
    pub const fn width(&self) -> u16 {
        self.width
    }

    #[inline]
    #[must_use]
    pub const fn height(&self) -> u16 {
        self.height
    }

    #[inline]
    #[must_use]
    pub const fn in_bounds(&self, x: u16, y: u16) -> bool {
        x < self.width && y < self.height
    }

    #[inline]
    const fn index(&self, x: u16, y: u16) -> usize {
        y as usize * self.width as usize + x as usize
    }

    #[inline]
    #[must_use]
    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        if self.in_bounds(x, y) {
            Some(&self.cells[self.index(x, y)])
        } else {
            None
        }
    }

    #[inline]
    pub fn get_mut(&mut self, x: u16, y: u16) -> Option<&mut Cell> {
        if self.in_bounds(x, y) {
            let idx = self.index(x, y);
            Some(&mut self.cells[idx])
        } else {
            None
        }
    }

    /// Every cell, row-major.
    #[inline]
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Row `y` as a slice, or `None` if out of bounds.
    #[must_use]
    pub fn row(&self, y: u16) -> Option<&[Cell]> {
        if y < self.height {
            let start = self.index(0, y);
            Some(&self.cells[start..start + usize::from(self.width)])
        } else {
            None
        }
    }

    /// Cells with their `(x, y)` coordinates.
    #[allow(clippy::cast_possible_truncation)]
    pub fn iter(&self) -> impl Iterator<Item = (u16, u16, &Cell)> {
        let w = usize::from(self.width).max(1);
        self.cells.iter().enumerate().map(move |(i, cell)| {
            // i % w < width and i / w < height, both u16.
            ((i % w) as u16, (i / w) as u16, cell)
        })
    }

    // ─── Writes ──────────────────────────────────────────────────────────

    /// Write one cell. Returns `false` (and writes nothing) when `(x, y)`
    /// is out of bounds.
    #[inline]
    pub fn set(&mut self, x: u16, y: u16, cell: Cell) -> bool {
        match self.get_mut(x, y) {
            Some(slot) => {
                *slot = cell;
                true
            }
            None => false,
        }
    }

    /// Copy a `w`-wide rectangle of cells, given row-major, with its
    /// top-left corner at `(x, y)`. Parts outside the buffer are dropped.
    ///
    /// A trailing partial row in `cells` is ignored.
    pub fn blit(&mut self, x: u16, y: u16, w: u16, cells: &[Cell]) {
        if w == 0 || x >= self.width {
            return;
        }
        let visible = usize::from(w.min(self.width - x));
        for (row, src) in cells.chunks_exact(usize::from(w)).enumerate() {
            let Some(dy) = u16::try_from(row).ok().and_then(|r| y.checked_add(r)) else {
                break;
            };
            if dy >= self.height {
                break;
            }
            let start = self.index(x, dy);
            self.cells[start..start + visible].copy_from_slice(&src[..visible]);
        }
    }

    /// Fill every cell with `fill`.
    pub fn clear(&mut self, fill: Cell) {
        self.cells.fill(fill);
    }

    /// Change the dimensions, keeping the overlapping top-left rectangle
    /// and filling new cells with `fill`.
    pub fn resize(&mut self, width: u16, height: u16, fill: Cell) {
        if width == self.width && height == self.height {
            return;
        }
        let mut next = Self::new(width, height, fill);
        let keep_w = usize::from(width.min(self.width));
        for y in 0..height.min(self.height) {
            let src = self.index(0, y);
            let dst = next.index(0, y);
            next.cells[dst..dst + keep_w].copy_from_slice(&self.cells[src..src + keep_w]);
        }
        *self = next;
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
