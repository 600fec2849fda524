// SPDX-License-Identifier: MIT
//
// Input events and the byte-stream decoder.
//
// The decoder owns a byte buffer that the reader thread's chunks are
// appended to. Each call to `next_event` runs one extraction step over the
// head of the buffer and removes exactly the bytes it consumed:
//
//   ESC ...     mouse report (when enabled), then the longest key sequence
//               from the capability table. With no match, ESC mode emits
//               Escape; ALT mode marks the next event with ALT and loops on
//               the remaining bytes.
//   <= 0x20     Control(byte), as does DEL (0x7F).
//   otherwise   one UTF-8 scalar.
//
// A prefix that could still grow into something longer (a lone ESC, half a
// key sequence, a split UTF-8 character) is left in the buffer. For an
// ESC-led prefix the caller waits at most the escape timeout and then calls
// `flush`, which resolves it with whatever it has: a lone ESC becomes Escape.
// A split UTF-8 character is never forced. It waits until the rest arrives,
// and is dropped only once a byte shows up that cannot continue it.

use std::fmt;
use std::io;
use std::sync::Arc;

use bitflags::bitflags;
use thiserror::Error;
use tracing::trace;

use cellbox_terminfo::{Capabilities, KeyMatch, SpecialKey};

use crate::driver::Size;

// ─── Modes and modifiers ─────────────────────────────────────────────────────

bitflags! {
    /// How an unmatched ESC is read, and whether mouse reports are decoded.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct InputMode: u8 {
        /// Unmatched ESC is the Escape key.
        const ESC   = 1 << 0;
        /// Unmatched ESC marks the next key with ALT.
        const ALT   = 1 << 1;
        /// Decode mouse reports.
        const MOUSE = 1 << 2;
    }
}

impl InputMode {
    /// Exactly one of ESC and ALT: ESC is added when neither is set and
    /// wins when both are.
    #[must_use]
    pub const fn normalized(self) -> Self {
        if self.contains(Self::ESC) {
            self.difference(Self::ALT)
        } else if self.contains(Self::ALT) {
            self
        } else {
            self.union(Self::ESC)
        }
    }
}

impl Default for InputMode {
    fn default() -> Self {
        Self::ESC
    }
}

bitflags! {
    /// Modifiers attached to key and mouse events.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct Modifiers: u8 {
        /// The key was prefixed by ESC in ALT mode, or Alt was held.
        const ALT    = 1 << 0;
        /// The mouse moved with a button held.
        const MOTION = 1 << 1;
    }
}

// ─── Keys ────────────────────────────────────────────────────────────────────

/// Identity of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// A printable character.
    Char(char),
    /// A control byte: `0x00..=0x20` or `0x7F`.
    Control(u8),
    /// A key reported by a multi-byte sequence.
    Special(SpecialKey),
}

impl Key {
    pub const ESC: Self = Self::Control(0x1B);
    pub const ENTER: Self = Self::Control(0x0D);
    pub const TAB: Self = Self::Control(0x09);
    pub const SPACE: Self = Self::Control(0x20);
    /// Ctrl-H, which some terminals send for Backspace.
    pub const BACKSPACE: Self = Self::Control(0x08);
    /// DEL, which most terminals send for Backspace.
    pub const BACKSPACE2: Self = Self::Control(0x7F);

    /// Ctrl plus `byte`: `Key::ctrl(b'c')` is `Control(0x03)`.
    #[inline]
    #[must_use]
    pub const fn ctrl(byte: u8) -> Self {
        Self::Control(byte & 0x1F)
    }
}

/// A key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    #[inline]
    #[must_use]
    pub const fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::empty(),
        }
    }

    #[inline]
    #[must_use]
    pub const fn with_modifiers(self, modifiers: Modifiers) -> Self {
        Self { modifiers, ..self }
    }
}

// ─── Mouse ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    /// A button went up. Reports do not say which.
    Release,
    WheelUp,
    WheelDown,
}

/// A mouse report. Coordinates are 0-based cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MouseEvent {
    pub button: MouseButton,
    pub x: u16,
    pub y: u16,
    pub modifiers: Modifiers,
}

// ─── Event ───────────────────────────────────────────────────────────────────

/// The reader failed. Carried inside [`Event::Error`].
#[derive(Debug, Clone, Error)]
#[error("terminal input failed: {0}")]
pub struct ReadError(#[source] Arc<io::Error>);

impl ReadError {
    #[must_use]
    pub fn kind(&self) -> io::ErrorKind {
        self.0.kind()
    }
}

impl From<io::Error> for ReadError {
    fn from(err: io::Error) -> Self {
        Self(Arc::new(err))
    }
}

impl PartialEq for ReadError {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
            || (self.0.kind() == other.0.kind() && self.0.to_string() == other.0.to_string())
    }
}

impl Eq for ReadError {}

/// Something that happened at the terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Key(KeyEvent),
    Mouse(MouseEvent),
    /// The terminal has a new size.
    Resize(Size),
    /// Reading input failed. The reader has stopped.
    Error(ReadError),
    /// A blocked poll was woken by an interrupter.
    Interrupt,
    /// A timed poll expired.
    None,
}

impl Event {
    /// A key event without modifiers.
    #[inline]
    #[must_use]
    pub const fn key(key: Key) -> Self {
        Self::Key(KeyEvent::new(key))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Char(ch) => write!(f, "{ch}"),
            Self::Control(0x1B) => f.write_str("Esc"),
            Self::Control(0x0D) => f.write_str("Enter"),
            Self::Control(0x09) => f.write_str("Tab"),
            Self::Control(0x20) => f.write_str("Space"),
            Self::Control(0x7F) => f.write_str("Backspace"),
            Self::Control(byte @ 0..=0x1F) => write!(f, "Ctrl-{}", char::from(byte | 0x40)),
            Self::Control(byte) => write!(f, "{byte:#04x}"),
            Self::Special(key) => write!(f, "{key:?}"),
        }
    }
}

// ─── Decoder ─────────────────────────────────────────────────────────────────

const ESC: u8 = 0x1B;
const X10_PREFIX: &[u8] = b"\x1b[M";
const SGR_PREFIX: &[u8] = b"\x1b[<";

/// Outcome of one extraction step.
#[derive(Debug, PartialEq, Eq)]
enum Parsed {
    /// An event and the number of bytes it consumed.
    Event(Event, usize),
    /// The buffer holds a prefix of something longer.
    Incomplete,
    /// These bytes decode to nothing and are dropped.
    Skip(usize),
}

/// Incremental decoder from terminal bytes to [`Event`]s.
#[derive(Debug, Default)]
pub struct Decoder {
    buf: Vec<u8>,
    mode: InputMode,
}

impl Decoder {
    #[must_use]
    pub fn new(mode: InputMode) -> Self {
        Self {
            buf: Vec::with_capacity(128),
            mode: mode.normalized(),
        }
    }

    #[inline]
    #[must_use]
    pub const fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: InputMode) {
        self.mode = mode.normalized();
    }

    /// Append raw bytes.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Whether bytes are waiting for more input or a flush.
    #[inline]
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.buf.is_empty()
    }

    /// Decode the next event, or `None` if the buffer is empty or holds
    /// only an incomplete prefix.
    pub fn next_event(&mut self, caps: &Capabilities) -> Option<Event> {
        self.extract_event(caps, false)
    }

    /// Whether the pending bytes start with ESC, so that the escape timeout
    /// applies to them.
    #[inline]
    #[must_use]
    pub fn awaits_escape_timeout(&self) -> bool {
        self.buf.first() == Some(&ESC)
    }

    /// Like [`next_event`](Self::next_event), but resolve an incomplete
    /// escape sequence instead of waiting. Call when the escape timeout
    /// expires. A split UTF-8 character stays pending.
    pub fn flush(&mut self, caps: &Capabilities) -> Option<Event> {
        self.extract_event(caps, true)
    }

    fn extract_event(&mut self, caps: &Capabilities, force: bool) -> Option<Event> {
        while !self.buf.is_empty() {
            match extract(&self.buf, self.mode, caps, force) {
                Parsed::Event(event, len) => {
                    self.buf.drain(..len);
                    return Some(event);
                }
                Parsed::Skip(len) => {
                    trace!(bytes = ?&self.buf[..len], "dropping undecodable input");
                    self.buf.drain(..len);
                }
                Parsed::Incomplete => return None,
            }
        }
        None
    }
}

/// One extraction step over `buf`, which is non-empty.
fn extract(buf: &[u8], mode: InputMode, caps: &Capabilities, force: bool) -> Parsed {
    let mut pos = 0;
    let mut modifiers = Modifiers::empty();

    loop {
        let rest = &buf[pos..];
        let Some(&lead) = rest.first() else {
            return Parsed::Incomplete;
        };

        if lead == ESC {
            if mode.contains(InputMode::MOUSE) {
                match parse_mouse(rest) {
                    MouseParse::Event(mut event, len) => {
                        event.modifiers |= modifiers;
                        return Parsed::Event(Event::Mouse(event), pos + len);
                    }
                    MouseParse::Incomplete if !force => return Parsed::Incomplete,
                    MouseParse::Invalid(len) => return Parsed::Skip(pos + len),
                    MouseParse::Incomplete | MouseParse::NotMouse => {}
                }
            }

            match caps.match_key(rest) {
                KeyMatch::Key(key, len) => {
                    let event = KeyEvent::new(Key::Special(key)).with_modifiers(modifiers);
                    return Parsed::Event(Event::Key(event), pos + len);
                }
                KeyMatch::Partial if !force => return Parsed::Incomplete,
                KeyMatch::Partial | KeyMatch::None => {}
            }

            if mode.contains(InputMode::ALT) && rest.len() > 1 {
                modifiers |= Modifiers::ALT;
                pos += 1;
                continue;
            }
            let event = KeyEvent::new(Key::ESC).with_modifiers(modifiers);
            return Parsed::Event(Event::Key(event), pos + 1);
        }

        if lead <= b' ' || lead == 0x7F {
            let event = KeyEvent::new(Key::Control(lead)).with_modifiers(modifiers);
            return Parsed::Event(Event::Key(event), pos + 1);
        }

        return match decode_utf8(rest) {
            Utf8::Char(ch, len) => {
                let event = KeyEvent::new(Key::Char(ch)).with_modifiers(modifiers);
                Parsed::Event(Event::Key(event), pos + len)
            }
            Utf8::Incomplete => Parsed::Incomplete,
            Utf8::Invalid => Parsed::Skip(pos + 1),
        };
    }
}

// ─── UTF-8 ───────────────────────────────────────────────────────────────────

enum Utf8 {
    Char(char, usize),
    Incomplete,
    Invalid,
}

/// Expected length of a UTF-8 sequence from its lead byte, 0 if the byte
/// cannot start one.
const fn utf8_char_len(lead: u8) -> usize {
    match lead {
        0x00..=0x7F => 1,
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => 0,
    }
}

fn decode_utf8(buf: &[u8]) -> Utf8 {
    let len = utf8_char_len(buf[0]);
    if len == 0 {
        return Utf8::Invalid;
    }
    if buf.len() < len {
        return if buf[1..].iter().all(|b| b & 0xC0 == 0x80) {
            Utf8::Incomplete
        } else {
            Utf8::Invalid
        };
    }
    match std::str::from_utf8(&buf[..len]).ok().and_then(|s| s.chars().next()) {
        Some(ch) => Utf8::Char(ch, len),
        None => Utf8::Invalid,
    }
}

// ─── Mouse reports ───────────────────────────────────────────────────────────

enum MouseParse {
    Event(MouseEvent, usize),
    Incomplete,
    /// A malformed report of this length.
    Invalid(usize),
    NotMouse,
}

fn parse_mouse(buf: &[u8]) -> MouseParse {
    if buf.starts_with(X10_PREFIX) {
        parse_x10_mouse(buf)
    } else if buf.starts_with(SGR_PREFIX) {
        parse_sgr_mouse(buf)
    } else if X10_PREFIX.starts_with(buf) || SGR_PREFIX.starts_with(buf) {
        MouseParse::Incomplete
    } else {
        MouseParse::NotMouse
    }
}

/// `ESC [ M b x y`, each payload byte offset by 32, coordinates 1-based.
fn parse_x10_mouse(buf: &[u8]) -> MouseParse {
    let [_, _, _, b, x, y, ..] = *buf else {
        return MouseParse::Incomplete;
    };
    let (button, modifiers) = decode_button(u16::from(b.wrapping_sub(32)));
    MouseParse::Event(
        MouseEvent {
            button,
            x: u16::from(x.saturating_sub(33)),
            y: u16::from(y.saturating_sub(33)),
            modifiers,
        },
        6,
    )
}

/// `ESC [ < b ; x ; y M` for a press or motion, `... m` for a release.
fn parse_sgr_mouse(buf: &[u8]) -> MouseParse {
    let start = SGR_PREFIX.len();
    let mut end = start;
    while end < buf.len() {
        match buf[end] {
            b'M' | b'm' => break,
            b'0'..=b'9' | b';' => end += 1,
            _ => return MouseParse::Invalid(end + 1),
        }
    }
    if end >= buf.len() {
        return MouseParse::Incomplete;
    }

    let (cb, rest) = parse_u16_from(&buf[start..end]);
    let rest = skip_byte(rest, b';');
    let (raw_x, rest) = parse_u16_from(rest);
    let rest = skip_byte(rest, b';');
    let (raw_y, rest) = parse_u16_from(rest);
    if !rest.is_empty() {
        return MouseParse::Invalid(end + 1);
    }

    let (mut button, modifiers) = decode_button(cb);
    if buf[end] == b'm' {
        button = MouseButton::Release;
    }
    MouseParse::Event(
        MouseEvent {
            button,
            x: raw_x.saturating_sub(1),
            y: raw_y.saturating_sub(1),
            modifiers,
        },
        end + 1,
    )
}

/// Button code to button and modifiers: low two bits pick the button, 64
/// turns buttons 0 and 1 into the wheel, 32 is motion.
const fn decode_button(cb: u16) -> (MouseButton, Modifiers) {
    let wheel = cb & 64 != 0;
    let button = match cb & 3 {
        0 if wheel => MouseButton::WheelUp,
        0 => MouseButton::Left,
        1 if wheel => MouseButton::WheelDown,
        1 => MouseButton::Middle,
        2 => MouseButton::Right,
        _ => MouseButton::Release,
    };
    let modifiers = if cb & 32 != 0 {
        Modifiers::MOTION
    } else {
        Modifiers::empty()
    };
    (button, modifiers)
}

/// Parse a u16 from the start of `buf`. Returns `(value, remaining)`.
fn parse_u16_from(buf: &[u8]) -> (u16, &[u8]) {
    let mut val: u16 = 0;
    let mut pos = 0;
    while pos < buf.len() && buf[pos].is_ascii_digit() {
        val = val
            .saturating_mul(10)
            .saturating_add(u16::from(buf[pos] - b'0'));
        pos += 1;
    }
    (val, &buf[pos..])
}

fn skip_byte(buf: &[u8], expected: u8) -> &[u8] {
    if buf.first() == Some(&expected) {
        &buf[1..]
    } else {
        buf
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use cellbox_terminfo::builtin;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn xterm() -> Capabilities {
        builtin::exact("xterm").unwrap()
    }

    /// Feed `data` and collect every event it yields without flushing.
    fn decode(mode: InputMode, data: &[u8]) -> Vec<Event> {
        let caps = xterm();
        let mut decoder = Decoder::new(mode);
        decoder.feed(data);
        std::iter::from_fn(|| decoder.next_event(&caps)).collect()
    }

    fn key(key: Key) -> Event {
        Event::key(key)
    }

    fn alt(key: Key) -> Event {
        Event::Key(KeyEvent::new(key).with_modifiers(Modifiers::ALT))
    }

    fn mouse(button: MouseButton, x: u16, y: u16, modifiers: Modifiers) -> Event {
        Event::Mouse(MouseEvent {
            button,
            x,
            y,
            modifiers,
        })
    }

    // ── Modes ───────────────────────────────────────────────────────────

    #[test]
    fn mode_normalization() {
        assert_eq!(InputMode::empty().normalized(), InputMode::ESC);
        assert_eq!(InputMode::MOUSE.normalized(), InputMode::ESC | InputMode::MOUSE);
        assert_eq!((InputMode::ESC | InputMode::ALT).normalized(), InputMode::ESC);
        assert_eq!(InputMode::ALT.normalized(), InputMode::ALT);
    }

    // ── Characters and control bytes ────────────────────────────────────

    #[test]
    fn ascii_and_unicode() {
        assert_eq!(
            decode(InputMode::ESC, "aé中🔥".as_bytes()),
            vec![
                key(Key::Char('a')),
                key(Key::Char('é')),
                key(Key::Char('中')),
                key(Key::Char('🔥')),
            ]
        );
    }

    #[test]
    fn control_bytes() {
        assert_eq!(
            decode(InputMode::ESC, b"\r\t \x7f\x03\x00"),
            vec![
                key(Key::ENTER),
                key(Key::TAB),
                key(Key::SPACE),
                key(Key::BACKSPACE2),
                key(Key::ctrl(b'c')),
                key(Key::Control(0)),
            ]
        );
    }

    #[test]
    fn split_utf8_yields_one_char() {
        let caps = xterm();
        let mut decoder = Decoder::new(InputMode::ESC);
        let euro = "€".as_bytes();

        decoder.feed(&euro[..1]);
        assert_eq!(decoder.next_event(&caps), None);
        assert!(decoder.has_pending());

        decoder.feed(&euro[1..]);
        assert_eq!(decoder.next_event(&caps), Some(key(Key::Char('€'))));
        assert_eq!(decoder.next_event(&caps), None);
        assert!(!decoder.has_pending());
    }

    #[test]
    fn flush_keeps_split_utf8_pending() {
        let caps = xterm();
        let mut decoder = Decoder::new(InputMode::ESC);
        decoder.feed(&[0xE2]);
        assert!(!decoder.awaits_escape_timeout());
        assert_eq!(decoder.flush(&caps), None);
        assert!(decoder.has_pending());

        decoder.feed(&[0x82]);
        assert_eq!(decoder.flush(&caps), None);
        decoder.feed(&[0xAC]);
        assert_eq!(decoder.next_event(&caps), Some(key(Key::Char('€'))));
    }

    #[test]
    fn split_utf8_dropped_when_broken() {
        let caps = xterm();
        let mut decoder = Decoder::new(InputMode::ESC);
        decoder.feed(&[0xE2, 0x82]);
        assert_eq!(decoder.next_event(&caps), None);
        decoder.feed(b"x");
        assert_eq!(decoder.next_event(&caps), Some(key(Key::Char('x'))));
        assert!(!decoder.has_pending());
    }

    #[test]
    fn invalid_bytes_are_dropped() {
        assert_eq!(
            decode(InputMode::ESC, b"\xffa\x80b\xe2(c"),
            vec![
                key(Key::Char('a')),
                key(Key::Char('b')),
                key(Key::Char('(')),
                key(Key::Char('c')),
            ]
        );
    }

    // ── Escape sequences ────────────────────────────────────────────────

    #[test]
    fn function_key_sequence() {
        assert_eq!(
            decode(InputMode::ESC, b"\x1bOP"),
            vec![key(Key::Special(SpecialKey::F1))]
        );
    }

    #[test]
    fn longest_sequence_is_consumed_exactly() {
        assert_eq!(
            decode(InputMode::ESC, b"\x1b[15~x"),
            vec![key(Key::Special(SpecialKey::F5)), key(Key::Char('x'))]
        );
    }

    #[test]
    fn lone_escape_waits_then_flushes() {
        let caps = xterm();
        let mut decoder = Decoder::new(InputMode::ESC);
        decoder.feed(b"\x1b");
        assert_eq!(decoder.next_event(&caps), None);
        assert!(decoder.awaits_escape_timeout());
        assert_eq!(decoder.flush(&caps), Some(key(Key::ESC)));
        assert!(!decoder.has_pending());
    }

    #[test]
    fn escape_then_letter_in_separate_feeds() {
        let caps = xterm();
        let mut decoder = Decoder::new(InputMode::ESC);
        decoder.feed(b"\x1b");
        assert_eq!(decoder.next_event(&caps), None);
        decoder.feed(b"x");
        assert_eq!(decoder.next_event(&caps), Some(key(Key::ESC)));
        assert_eq!(decoder.next_event(&caps), Some(key(Key::Char('x'))));
    }

    #[test]
    fn partial_sequence_waits() {
        let caps = xterm();
        let mut decoder = Decoder::new(InputMode::ESC);
        decoder.feed(b"\x1b[1");
        assert_eq!(decoder.next_event(&caps), None);
        decoder.feed(b"5~");
        assert_eq!(
            decoder.next_event(&caps),
            Some(key(Key::Special(SpecialKey::F5)))
        );
    }

    #[test]
    fn flushed_partial_sequence_falls_apart() {
        let caps = xterm();
        let mut decoder = Decoder::new(InputMode::ESC);
        decoder.feed(b"\x1b[1");
        assert_eq!(decoder.flush(&caps), Some(key(Key::ESC)));
        assert_eq!(decoder.next_event(&caps), Some(key(Key::Char('['))));
        assert_eq!(decoder.next_event(&caps), Some(key(Key::Char('1'))));
    }

    // ── Alt mode ────────────────────────────────────────────────────────

    #[test]
    fn alt_mode_prefixes_next_key() {
        assert_eq!(decode(InputMode::ALT, b"\x1ba"), vec![alt(Key::Char('a'))]);
    }

    #[test]
    fn esc_mode_splits_prefix() {
        assert_eq!(
            decode(InputMode::ESC, b"\x1ba"),
            vec![key(Key::ESC), key(Key::Char('a'))]
        );
    }

    #[test]
    fn alt_mode_applies_to_special_keys() {
        assert_eq!(
            decode(InputMode::ALT, b"\x1b\x1bOA"),
            vec![alt(Key::Special(SpecialKey::ArrowUp))]
        );
    }

    #[test]
    fn alt_mode_double_escape_flushes_as_alt_escape() {
        let caps = xterm();
        let mut decoder = Decoder::new(InputMode::ALT);
        decoder.feed(b"\x1b\x1b");
        assert_eq!(decoder.next_event(&caps), None);
        assert_eq!(decoder.flush(&caps), Some(alt(Key::ESC)));
        assert!(!decoder.has_pending());
    }

    #[test]
    fn alt_mode_waits_for_split_utf8() {
        let caps = xterm();
        let mut decoder = Decoder::new(InputMode::ALT);
        decoder.feed(b"\x1b\xc3");
        assert_eq!(decoder.next_event(&caps), None);
        decoder.feed(b"\xa9");
        assert_eq!(decoder.next_event(&caps), Some(alt(Key::Char('é'))));
    }

    // ── Mouse ───────────────────────────────────────────────────────────

    const MOUSE: InputMode = InputMode::ESC.union(InputMode::MOUSE);

    #[test]
    fn x10_press() {
        assert_eq!(
            decode(MOUSE, b"\x1b[M !!"),
            vec![mouse(MouseButton::Left, 0, 0, Modifiers::empty())]
        );
        assert_eq!(
            decode(MOUSE, b"\x1b[M\"5*"),
            vec![mouse(MouseButton::Right, 20, 9, Modifiers::empty())]
        );
    }

    #[test]
    fn x10_wheel_and_release() {
        assert_eq!(
            decode(MOUSE, b"\x1b[M`!!\x1b[Ma!!\x1b[M#!!"),
            vec![
                mouse(MouseButton::WheelUp, 0, 0, Modifiers::empty()),
                mouse(MouseButton::WheelDown, 0, 0, Modifiers::empty()),
                mouse(MouseButton::Release, 0, 0, Modifiers::empty()),
            ]
        );
    }

    #[test]
    fn x10_drag_sets_motion() {
        assert_eq!(
            decode(MOUSE, b"\x1b[M@+#"),
            vec![mouse(MouseButton::Left, 10, 2, Modifiers::MOTION)]
        );
    }

    #[test]
    fn x10_waits_for_payload() {
        let caps = xterm();
        let mut decoder = Decoder::new(MOUSE);
        decoder.feed(b"\x1b[M ");
        assert_eq!(decoder.next_event(&caps), None);
        decoder.feed(b"!!");
        assert_eq!(
            decoder.next_event(&caps),
            Some(mouse(MouseButton::Left, 0, 0, Modifiers::empty()))
        );
    }

    #[test]
    fn sgr_press_and_release() {
        assert_eq!(
            decode(MOUSE, b"\x1b[<0;10;5M\x1b[<0;10;5m"),
            vec![
                mouse(MouseButton::Left, 9, 4, Modifiers::empty()),
                mouse(MouseButton::Release, 9, 4, Modifiers::empty()),
            ]
        );
    }

    #[test]
    fn sgr_wheel_and_motion() {
        assert_eq!(
            decode(MOUSE, b"\x1b[<65;300;200M\x1b[<34;1;1M"),
            vec![
                mouse(MouseButton::WheelDown, 299, 199, Modifiers::empty()),
                mouse(MouseButton::Right, 0, 0, Modifiers::MOTION),
            ]
        );
    }

    #[test]
    fn sgr_split_across_feeds() {
        let caps = xterm();
        let mut decoder = Decoder::new(MOUSE);
        decoder.feed(b"\x1b[<1;2");
        assert_eq!(decoder.next_event(&caps), None);
        decoder.feed(b";3M");
        assert_eq!(
            decoder.next_event(&caps),
            Some(mouse(MouseButton::Middle, 1, 2, Modifiers::empty()))
        );
    }

    #[test]
    fn malformed_sgr_is_dropped() {
        assert_eq!(
            decode(MOUSE, b"\x1b[<1;xq"),
            vec![key(Key::Char('q'))]
        );
    }

    #[test]
    fn mouse_reports_ignored_without_mouse_mode() {
        let events = decode(InputMode::ESC, b"\x1b[M !!");
        assert_eq!(events[0], key(Key::ESC));
        assert_eq!(events[1], key(Key::Char('[')));
    }

    #[test]
    fn alt_prefix_carries_onto_mouse() {
        assert_eq!(
            decode(InputMode::ALT | InputMode::MOUSE, b"\x1b\x1b[<0;1;1M"),
            vec![mouse(MouseButton::Left, 0, 0, Modifiers::ALT)]
        );
    }

    // ── Events ──────────────────────────────────────────────────────────

    #[test]
    fn read_errors_compare_by_kind_and_message() {
        let a = ReadError::from(io::Error::new(io::ErrorKind::BrokenPipe, "gone"));
        let b = ReadError::from(io::Error::new(io::ErrorKind::BrokenPipe, "gone"));
        let c = ReadError::from(io::Error::new(io::ErrorKind::Other, "gone"));
        assert_eq!(Event::Error(a.clone()), Event::Error(b));
        assert_ne!(a, c);
        assert_eq!(a.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn key_display() {
        assert_eq!(Key::ctrl(b'c').to_string(), "Ctrl-C");
        assert_eq!(Key::ESC.to_string(), "Esc");
        assert_eq!(Key::Char('x').to_string(), "x");
        assert_eq!(Key::Special(SpecialKey::F5).to_string(), "F5");
    }

    // ── Chunking ────────────────────────────────────────────────────────

    const STREAM: &[u8] = b"a\xc3\xa9\xe4\xb8\xad\x1bOPx\x1b[A\r\x1b[<0;4;2M\x1b[15~z";

    proptest! {
        #[test]
        fn chunking_does_not_change_events(
            cuts in proptest::collection::vec(0..STREAM.len(), 0..6),
        ) {
            let caps = xterm();
            let expected = decode(MOUSE, STREAM);

            let mut cuts = cuts;
            cuts.sort_unstable();
            let mut decoder = Decoder::new(MOUSE);
            let mut events = Vec::new();
            let mut start = 0;
            for cut in cuts.into_iter().chain([STREAM.len()]) {
                decoder.feed(&STREAM[start..cut]);
                start = cut;
                events.extend(std::iter::from_fn(|| decoder.next_event(&caps)));
            }
            prop_assert_eq!(events, expected);
            prop_assert!(!decoder.has_pending());
        }
    }
}
