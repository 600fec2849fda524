// SPDX-License-Identifier: MIT
//
// Capability identifiers and the resolved, immutable capability table.
//
// The table is two lookups:
//
//   keys   (byte sequence, SpecialKey) pairs the input decoder matches
//           against. Stored longest-first so the first hit is the greedy
//           longest-prefix match.
//   funcs  one byte string per Func, written verbatim by the renderer
//           and the session. Absent capabilities are empty strings.

use std::path::PathBuf;

// ─── SpecialKey ──────────────────────────────────────────────────────────────

/// Keys that terminals report with multi-byte escape sequences.
///
/// The declaration order matches the order of the terminfo key index list
/// and of every built-in key table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialKey {
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
    Insert,
    Delete,
    Home,
    End,
    PageUp,
    PageDown,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
}

impl SpecialKey {
    /// Number of special keys.
    pub const COUNT: usize = 22;

    /// Every special key, in table order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::F1,
        Self::F2,
        Self::F3,
        Self::F4,
        Self::F5,
        Self::F6,
        Self::F7,
        Self::F8,
        Self::F9,
        Self::F10,
        Self::F11,
        Self::F12,
        Self::Insert,
        Self::Delete,
        Self::Home,
        Self::End,
        Self::PageUp,
        Self::PageDown,
        Self::ArrowUp,
        Self::ArrowDown,
        Self::ArrowLeft,
        Self::ArrowRight,
    ];

    /// Function key `F{n}` for `n` in `1..=12`.
    #[must_use]
    pub const fn function(n: u8) -> Option<Self> {
        if n >= 1 && n <= 12 {
            Some(Self::ALL[(n - 1) as usize])
        } else {
            None
        }
    }
}

// ─── Func ────────────────────────────────────────────────────────────────────

/// Parameterless control functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Func {
    /// Enter the alternate screen (`smcup`).
    EnterCa,
    /// Leave the alternate screen (`rmcup`).
    ExitCa,
    ShowCursor,
    HideCursor,
    ClearScreen,
    /// Reset all SGR attributes.
    Sgr0,
    Underline,
    Bold,
    Blink,
    Reverse,
    /// Enter keypad transmit mode (`smkx`).
    EnterKeypad,
    /// Leave keypad transmit mode (`rmkx`).
    ExitKeypad,
    /// Enable mouse reporting. Not a terminfo capability; filled with a
    /// fixed sequence for every terminal that supports it.
    EnterMouse,
    ExitMouse,
}

impl Func {
    /// Number of control functions.
    pub const COUNT: usize = 14;

    /// Every function, in table order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::EnterCa,
        Self::ExitCa,
        Self::ShowCursor,
        Self::HideCursor,
        Self::ClearScreen,
        Self::Sgr0,
        Self::Underline,
        Self::Bold,
        Self::Blink,
        Self::Reverse,
        Self::EnterKeypad,
        Self::ExitKeypad,
        Self::EnterMouse,
        Self::ExitMouse,
    ];

    #[inline]
    const fn index(self) -> usize {
        self as usize
    }
}

/// Mouse reporting: button events, drag motion, urxvt and SGR extended
/// coordinates.
pub const MOUSE_ENTER: &[u8] = b"\x1b[?1000h\x1b[?1002h\x1b[?1015h\x1b[?1006h";
/// Reverse of [`MOUSE_ENTER`].
pub const MOUSE_EXIT: &[u8] = b"\x1b[?1006l\x1b[?1015l\x1b[?1002l\x1b[?1000l";

// ─── Source ──────────────────────────────────────────────────────────────────

/// Where a capability table came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Built-in entry matching the terminal name exactly.
    Builtin,
    /// Compiled terminfo file.
    Terminfo(PathBuf),
    /// Built-in entry chosen because the name contains its pattern.
    Compatible(&'static str),
}

// ─── KeyMatch ────────────────────────────────────────────────────────────────

/// Result of matching buffered input against the key table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyMatch {
    /// The longest sequence that is a prefix of the input, and its length.
    Key(SpecialKey, usize),
    /// No sequence matches yet, but the input is a strict prefix of one.
    Partial,
    /// Nothing matches and nothing could.
    None,
}

// ─── Capabilities ────────────────────────────────────────────────────────────

/// A resolved capability table. Immutable after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capabilities {
    name: String,
    source: Source,
    keys: Vec<(Vec<u8>, SpecialKey)>,
    funcs: [Vec<u8>; Func::COUNT],
}

impl Capabilities {
    /// Build a table. Empty key sequences are dropped; the rest are sorted
    /// longest first (stable, so earlier entries win ties).
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        source: Source,
        keys: impl IntoIterator<Item = (Vec<u8>, SpecialKey)>,
        funcs: [Vec<u8>; Func::COUNT],
    ) -> Self {
        let mut keys: Vec<_> = keys.into_iter().filter(|(seq, _)| !seq.is_empty()).collect();
        keys.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        Self {
            name: name.into(),
            source,
            keys,
            funcs,
        }
    }

    /// The terminal name this table was resolved for.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn source(&self) -> &Source {
        &self.source
    }

    /// Control sequence for `func`. Empty if the terminal lacks it.
    #[inline]
    #[must_use]
    pub fn func(&self, func: Func) -> &[u8] {
        &self.funcs[func.index()]
    }

    /// The sequence the terminal sends for `key`, if known.
    #[must_use]
    pub fn key_sequence(&self, key: SpecialKey) -> Option<&[u8]> {
        self.keys
            .iter()
            .find(|(_, k)| *k == key)
            .map(|(seq, _)| seq.as_slice())
    }

    /// Key sequences, longest first.
    pub fn keys(&self) -> impl Iterator<Item = (&[u8], SpecialKey)> {
        self.keys.iter().map(|(seq, key)| (seq.as_slice(), *key))
    }

    /// Greedy longest-prefix match of `input` against the key table.
    ///
    /// A full match always wins over a possible longer match: once a
    /// complete sequence is buffered it is reported without waiting.
    #[must_use]
    pub fn match_key(&self, input: &[u8]) -> KeyMatch {
        let mut partial = false;
        for (seq, key) in &self.keys {
            if input.starts_with(seq) {
                return KeyMatch::Key(*key, seq.len());
            }
            if seq.len() > input.len() && seq.starts_with(input) {
                partial = true;
            }
        }
        if partial { KeyMatch::Partial } else { KeyMatch::None }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
