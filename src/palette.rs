// SPDX-License-Identifier: MIT
//
// 24-bit colors and the terminal palette.
//
// Terminals without direct-color support can still show arbitrary RGB
// values: each distinct color is uploaded into one of the 256 palette
// slots (OSC 4) and cells then select it by index. The allocator tracks
// which color lives in which slot so a color is uploaded only once.

use std::collections::HashMap;

use cellbox_term::Attribute;

/// Number of palette slots a terminal exposes.
pub const PALETTE_SIZE: usize = 256;

/// A 24-bit color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    #[inline]
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    #[inline]
    #[must_use]
    pub const fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

impl From<(u8, u8, u8)> for Rgb {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Self::new(r, g, b)
    }
}

// ─── xterm default palette ───────────────────────────────────────────────────

/// Levels of the 6×6×6 cube, per channel.
const CUBE_LEVELS: [u8; 6] = [0, 95, 135, 175, 215, 255];

/// xterm's default 256-color palette.
///
/// - 0..16: the ANSI colors. Normal intensity is 205 (238 for blue), bright
///   is 255, with a 127 gray at 8 and a 92/92/255 bright blue at 12.
/// - 16..232: the 6×6×6 cube.
/// - 232..256: a 24-step gray ramp from 8 to 238.
#[must_use]
pub fn xterm_256() -> [Rgb; PALETTE_SIZE] {
    let mut palette = [Rgb::default(); PALETTE_SIZE];

    let (r, g, b) = (205, 205, 238);
    palette[..8].copy_from_slice(&[
        Rgb::new(0, 0, 0),
        Rgb::new(r, 0, 0),
        Rgb::new(0, g, 0),
        Rgb::new(r, g, 0),
        Rgb::new(0, 0, b),
        Rgb::new(r, 0, b),
        Rgb::new(0, g, b),
        Rgb::new(r, g, b),
    ]);
    palette[8..16].copy_from_slice(&[
        Rgb::new(127, 127, 127),
        Rgb::new(255, 0, 0),
        Rgb::new(0, 255, 0),
        Rgb::new(255, 255, 0),
        Rgb::new(92, 92, 255),
        Rgb::new(255, 0, 255),
        Rgb::new(0, 255, 255),
        Rgb::new(255, 255, 255),
    ]);

    let cube = CUBE_LEVELS.iter().flat_map(|&r| {
        CUBE_LEVELS
            .iter()
            .flat_map(move |&g| CUBE_LEVELS.iter().map(move |&b| Rgb::new(r, g, b)))
    });
    for (slot, color) in palette[16..232].iter_mut().zip(cube) {
        *slot = color;
    }

    for (slot, v) in palette[232..].iter_mut().zip((8..=238u8).step_by(10)) {
        *slot = Rgb::new(v, v, v);
    }

    palette
}

// ─── PaletteAllocator ────────────────────────────────────────────────────────

/// Assigns palette slots to RGB colors, first come first served.
#[derive(Debug, Default)]
pub struct PaletteAllocator {
    slots: HashMap<Rgb, u8>,
}

impl PaletteAllocator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of slots in use.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slot already holding `color`.
    #[must_use]
    pub fn lookup(&self, color: Rgb) -> Option<u8> {
        self.slots.get(&color).copied()
    }

    /// Give `color` the next free slot. `None` when all slots are taken.
    /// The caller uploads the color.
    pub fn insert(&mut self, color: Rgb) -> Option<u8> {
        let slot = u8::try_from(self.slots.len()).ok()?;
        self.slots.insert(color, slot);
        Some(slot)
    }

    /// Forget every assignment.
    pub fn reset(&mut self) {
        self.slots.clear();
    }

    /// The attribute selecting `color`, if it has a slot.
    #[must_use]
    pub fn attribute(&self, color: Rgb) -> Option<Attribute> {
        self.lookup(color).map(Attribute::from_palette)
    }
}
