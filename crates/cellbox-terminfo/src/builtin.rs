// SPDX-License-Identifier: MIT
//
// Built-in capability entries for the handful of terminals that cover
// nearly every real session. Used when the name matches exactly, and again
// as a substring fallback when no compiled terminfo entry is found.

use crate::caps::{Capabilities, Func, MOUSE_ENTER, MOUSE_EXIT, Source, SpecialKey};

/// A static capability entry.
struct Entry {
    name: &'static str,
    keys: [&'static [u8]; SpecialKey::COUNT],
    funcs: [&'static [u8]; Func::COUNT],
}

impl Entry {
    fn to_capabilities(&self, name: &str, source: Source) -> Capabilities {
        let keys = self
            .keys
            .iter()
            .zip(SpecialKey::ALL)
            .map(|(seq, key)| (seq.to_vec(), key));
        Capabilities::new(name, source, keys, self.funcs.map(<[u8]>::to_vec))
    }
}

// ─── Key tables ──────────────────────────────────────────────────────────────

#[rustfmt::skip]
const RXVT_KEYS: [&[u8]; SpecialKey::COUNT] = [
    b"\x1b[11~", b"\x1b[12~", b"\x1b[13~", b"\x1b[14~", b"\x1b[15~", b"\x1b[17~",
    b"\x1b[18~", b"\x1b[19~", b"\x1b[20~", b"\x1b[21~", b"\x1b[23~", b"\x1b[24~",
    b"\x1b[2~", b"\x1b[3~", b"\x1b[7~", b"\x1b[8~", b"\x1b[5~", b"\x1b[6~",
    b"\x1b[A", b"\x1b[B", b"\x1b[D", b"\x1b[C",
];

#[rustfmt::skip]
const SCREEN_KEYS: [&[u8]; SpecialKey::COUNT] = [
    b"\x1bOP", b"\x1bOQ", b"\x1bOR", b"\x1bOS", b"\x1b[15~", b"\x1b[17~",
    b"\x1b[18~", b"\x1b[19~", b"\x1b[20~", b"\x1b[21~", b"\x1b[23~", b"\x1b[24~",
    b"\x1b[2~", b"\x1b[3~", b"\x1b[1~", b"\x1b[4~", b"\x1b[5~", b"\x1b[6~",
    b"\x1bOA", b"\x1bOB", b"\x1bOD", b"\x1bOC",
];

#[rustfmt::skip]
const XTERM_KEYS: [&[u8]; SpecialKey::COUNT] = [
    b"\x1bOP", b"\x1bOQ", b"\x1bOR", b"\x1bOS", b"\x1b[15~", b"\x1b[17~",
    b"\x1b[18~", b"\x1b[19~", b"\x1b[20~", b"\x1b[21~", b"\x1b[23~", b"\x1b[24~",
    b"\x1b[2~", b"\x1b[3~", b"\x1bOH", b"\x1bOF", b"\x1b[5~", b"\x1b[6~",
    b"\x1bOA", b"\x1bOB", b"\x1bOD", b"\x1bOC",
];

#[rustfmt::skip]
const LINUX_KEYS: [&[u8]; SpecialKey::COUNT] = [
    b"\x1b[[A", b"\x1b[[B", b"\x1b[[C", b"\x1b[[D", b"\x1b[[E", b"\x1b[17~",
    b"\x1b[18~", b"\x1b[19~", b"\x1b[20~", b"\x1b[21~", b"\x1b[23~", b"\x1b[24~",
    b"\x1b[2~", b"\x1b[3~", b"\x1b[1~", b"\x1b[4~", b"\x1b[5~", b"\x1b[6~",
    b"\x1b[A", b"\x1b[B", b"\x1b[D", b"\x1b[C",
];

// ─── Entries ─────────────────────────────────────────────────────────────────
//
// Function order: enter_ca, exit_ca, show_cursor, hide_cursor, clear_screen,
// sgr0, underline, bold, blink, reverse, enter_keypad, exit_keypad,
// enter_mouse, exit_mouse.

#[rustfmt::skip]
const ETERM: Entry = Entry {
    name: "Eterm",
    keys: RXVT_KEYS,
    funcs: [
        b"\x1b7\x1b[?47h", b"\x1b[2J\x1b[?47l\x1b8", b"\x1b[?25h", b"\x1b[?25l",
        b"\x1b[H\x1b[2J", b"\x1b[m", b"\x1b[4m", b"\x1b[1m", b"\x1b[5m", b"\x1b[7m",
        b"", b"", b"", b"",
    ],
};

#[rustfmt::skip]
const SCREEN: Entry = Entry {
    name: "screen",
    keys: SCREEN_KEYS,
    funcs: [
        b"\x1b[?1049h", b"\x1b[?1049l", b"\x1b[34h\x1b[?25h", b"\x1b[?25l",
        b"\x1b[H\x1b[J", b"\x1b[m", b"\x1b[4m", b"\x1b[1m", b"\x1b[5m", b"\x1b[7m",
        b"\x1b[?1h\x1b=", b"\x1b[?1l\x1b>", MOUSE_ENTER, MOUSE_EXIT,
    ],
};

#[rustfmt::skip]
const XTERM: Entry = Entry {
    name: "xterm",
    keys: XTERM_KEYS,
    funcs: [
        b"\x1b[?1049h", b"\x1b[?1049l", b"\x1b[?12l\x1b[?25h", b"\x1b[?25l",
        b"\x1b[H\x1b[2J", b"\x1b(B\x1b[m", b"\x1b[4m", b"\x1b[1m", b"\x1b[5m", b"\x1b[7m",
        b"\x1b[?1h\x1b=", b"\x1b[?1l\x1b>", MOUSE_ENTER, MOUSE_EXIT,
    ],
};

#[rustfmt::skip]
const RXVT_UNICODE: Entry = Entry {
    name: "rxvt-unicode",
    keys: RXVT_KEYS,
    funcs: [
        b"\x1b[?1049h", b"\x1b[r\x1b[?1049l", b"\x1b[?25h", b"\x1b[?25l",
        b"\x1b[H\x1b[2J", b"\x1b[m\x1b(B", b"\x1b[4m", b"\x1b[1m", b"\x1b[5m", b"\x1b[7m",
        b"\x1b=", b"\x1b>", MOUSE_ENTER, MOUSE_EXIT,
    ],
};

#[rustfmt::skip]
const LINUX: Entry = Entry {
    name: "linux",
    keys: LINUX_KEYS,
    funcs: [
        b"", b"", b"\x1b[?25h\x1b[?0c", b"\x1b[?25l\x1b[?1c",
        b"\x1b[H\x1b[J", b"\x1b[0;10m", b"\x1b[4m", b"\x1b[1m", b"\x1b[5m", b"\x1b[7m",
        b"", b"", b"", b"",
    ],
};

#[rustfmt::skip]
const RXVT_256COLOR: Entry = Entry {
    name: "rxvt-256color",
    keys: RXVT_KEYS,
    funcs: [
        b"\x1b7\x1b[?47h", b"\x1b[2J\x1b[?47l\x1b8", b"\x1b[?25h", b"\x1b[?25l",
        b"\x1b[H\x1b[2J", b"\x1b[m", b"\x1b[4m", b"\x1b[1m", b"\x1b[5m", b"\x1b[7m",
        b"\x1b=", b"\x1b>", MOUSE_ENTER, MOUSE_EXIT,
    ],
};

const EXACT: [&Entry; 6] = [&ETERM, &SCREEN, &XTERM, &RXVT_UNICODE, &LINUX, &RXVT_256COLOR];

/// Substring fallbacks, tried in order. Cygwin's console speaks xterm.
const COMPATIBLE: [(&str, &Entry); 6] = [
    ("xterm", &XTERM),
    ("rxvt", &RXVT_UNICODE),
    ("linux", &LINUX),
    ("Eterm", &ETERM),
    ("screen", &SCREEN),
    ("cygwin", &XTERM),
];

// ─── Lookup ──────────────────────────────────────────────────────────────────

/// Built-in entry whose name equals `name`.
#[must_use]
pub fn exact(name: &str) -> Option<Capabilities> {
    EXACT
        .iter()
        .find(|entry| entry.name == name)
        .map(|entry| entry.to_capabilities(name, Source::Builtin))
}

/// First built-in entry whose pattern occurs in `name`.
#[must_use]
pub fn compatible(name: &str) -> Option<Capabilities> {
    COMPATIBLE
        .iter()
        .find(|(pattern, _)| name.contains(pattern))
        .map(|(pattern, entry)| entry.to_capabilities(name, Source::Compatible(pattern)))
}

// ─── Tests ───────────────────────────────────────────────────────────────────
