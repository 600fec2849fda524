// SPDX-License-Identifier: MIT
//
// Windows console driver.
//
// Safety: console mode, input records, and WriteFile are Win32 calls with
// no std equivalent. Input record fields are unions.
#![allow(unsafe_code)]
//
// Output goes through WriteFile with virtual terminal processing enabled,
// so the same escape sequences work as on a tty. Input does not: the
// console hands out INPUT_RECORDs, which the reader thread turns into
// events directly instead of bytes. Window-buffer records become resize
// notifications.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::mpsc::SyncSender;

use tracing::{debug, warn};
use windows::Win32::Foundation::{HANDLE, WAIT_TIMEOUT};
use windows::Win32::Storage::FileSystem::WriteFile;
use windows::Win32::System::Console::{
    CONSOLE_MODE, CONSOLE_SCREEN_BUFFER_INFO, ENABLE_EXTENDED_FLAGS, ENABLE_MOUSE_INPUT,
    ENABLE_PROCESSED_OUTPUT, ENABLE_VIRTUAL_TERMINAL_PROCESSING, ENABLE_WINDOW_INPUT,
    GetConsoleMode, GetConsoleScreenBufferInfo, GetStdHandle, INPUT_RECORD, KEY_EVENT,
    KEY_EVENT_RECORD, LEFT_ALT_PRESSED, MOUSE_EVENT, MOUSE_EVENT_RECORD, MOUSE_MOVED,
    MOUSE_WHEELED, RIGHT_ALT_PRESSED, ReadConsoleInputW, SMALL_RECT, STD_INPUT_HANDLE,
    STD_OUTPUT_HANDLE, SetConsoleMode, WINDOW_BUFFER_SIZE_EVENT,
};
use windows::Win32::System::Threading::WaitForSingleObject;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    VIRTUAL_KEY, VK_DELETE, VK_DOWN, VK_END, VK_F1, VK_F2, VK_F3, VK_F4, VK_F5, VK_F6, VK_F7,
    VK_F8, VK_F9, VK_F10, VK_F11, VK_F12, VK_HOME, VK_INSERT, VK_LEFT, VK_NEXT, VK_PRIOR,
    VK_RIGHT, VK_UP,
};

use cellbox_terminfo::SpecialKey;

use super::{Driver, Size};
use crate::input::{Event, InputMode, Key, KeyEvent, Modifiers, MouseButton, MouseEvent};
use crate::reader::{self, Input, ReaderHandle};

/// How long the reader waits for console input before rechecking its stop
/// flag.
const WAIT_TIMEOUT_MS: u32 = 50;

/// Records fetched per ReadConsoleInputW call.
const RECORD_BATCH: usize = 32;

const SPECIAL_KEYS: [(VIRTUAL_KEY, SpecialKey); SpecialKey::COUNT] = [
    (VK_F1, SpecialKey::F1),
    (VK_F2, SpecialKey::F2),
    (VK_F3, SpecialKey::F3),
    (VK_F4, SpecialKey::F4),
    (VK_F5, SpecialKey::F5),
    (VK_F6, SpecialKey::F6),
    (VK_F7, SpecialKey::F7),
    (VK_F8, SpecialKey::F8),
    (VK_F9, SpecialKey::F9),
    (VK_F10, SpecialKey::F10),
    (VK_F11, SpecialKey::F11),
    (VK_F12, SpecialKey::F12),
    (VK_INSERT, SpecialKey::Insert),
    (VK_DELETE, SpecialKey::Delete),
    (VK_HOME, SpecialKey::Home),
    (VK_END, SpecialKey::End),
    (VK_PRIOR, SpecialKey::PageUp),
    (VK_NEXT, SpecialKey::PageDown),
    (VK_UP, SpecialKey::ArrowUp),
    (VK_DOWN, SpecialKey::ArrowDown),
    (VK_LEFT, SpecialKey::ArrowLeft),
    (VK_RIGHT, SpecialKey::ArrowRight),
];

/// A console handle moved into the reader thread.
struct SendHandle(HANDLE);

// SAFETY: console handles are process-wide and usable from any thread.
unsafe impl Send for SendHandle {}

/// What the reader thread needs: input records come from `input`, the
/// window origin for mouse positions from `output`.
struct Console {
    input: SendHandle,
    output: SendHandle,
}

// ─── Record translation ──────────────────────────────────────────────────────

/// Turns console records into events. Holds the first half of a UTF-16
/// surrogate pair between records.
#[derive(Debug, Default)]
struct RecordTranslator {
    high_surrogate: Option<u16>,
}

impl RecordTranslator {
    /// A key-down record. `unit` is the record's UTF-16 code unit, 0 when
    /// the key produces no character.
    fn key(&mut self, vk: u16, unit: u16, control_state: u32, mode: InputMode) -> Option<KeyEvent> {
        let modifiers = if mode.contains(InputMode::ALT)
            && control_state & (LEFT_ALT_PRESSED | RIGHT_ALT_PRESSED) != 0
        {
            Modifiers::ALT
        } else {
            Modifiers::empty()
        };

        if let Some(&(_, special)) = SPECIAL_KEYS.iter().find(|(k, _)| k.0 == vk) {
            self.high_surrogate = None;
            return Some(KeyEvent::new(Key::Special(special)).with_modifiers(modifiers));
        }

        let key = match unit {
            0 => return None,
            0xD800..=0xDBFF => {
                self.high_surrogate = Some(unit);
                return None;
            }
            0xDC00..=0xDFFF => {
                let high = self.high_surrogate.take()?;
                let ch = char::decode_utf16([high, unit]).next()?.ok()?;
                Key::Char(ch)
            }
            // Checked range: fits in u8.
            #[allow(clippy::cast_possible_truncation)]
            0..=0x20 | 0x7F => Key::Control(unit as u8),
            _ => Key::Char(char::from_u32(u32::from(unit))?),
        };
        Some(KeyEvent::new(key).with_modifiers(modifiers))
    }
}

/// A mouse record. Plain movement without a button is dropped. `origin` is
/// the window's top-left corner in buffer coordinates, so reported positions
/// come out window-relative.
fn translate_mouse(
    (x, y): (i16, i16),
    origin: (i16, i16),
    buttons: u32,
    flags: u32,
) -> Option<MouseEvent> {
    let mut modifiers = Modifiers::empty();
    let button = if flags & MOUSE_WHEELED != 0 {
        // The high word is the signed wheel delta.
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let delta = (buttons >> 16) as i16;
        if delta > 0 {
            MouseButton::WheelUp
        } else {
            MouseButton::WheelDown
        }
    } else {
        let pressed = match buttons & 0x7 {
            0 => None,
            b if b & 0x1 != 0 => Some(MouseButton::Left),
            b if b & 0x2 != 0 => Some(MouseButton::Right),
            _ => Some(MouseButton::Middle),
        };
        if flags & MOUSE_MOVED != 0 {
            modifiers |= Modifiers::MOTION;
            pressed?
        } else {
            pressed.unwrap_or(MouseButton::Release)
        }
    };
    Some(MouseEvent {
        button,
        x: u16::try_from(x.saturating_sub(origin.0)).unwrap_or(0),
        y: u16::try_from(y.saturating_sub(origin.1)).unwrap_or(0),
        modifiers,
    })
}

// ─── ConsoleDriver ───────────────────────────────────────────────────────────

/// The process console with window and mouse input enabled.
#[derive(Debug)]
pub struct ConsoleDriver {
    input: HANDLE,
    output: HANDLE,
    original_input_mode: CONSOLE_MODE,
    original_output_mode: CONSOLE_MODE,
    mode: Arc<AtomicU8>,
    reader: Option<ReaderHandle>,
    restored: bool,
}

impl ConsoleDriver {
    /// Take over the console's standard handles.
    ///
    /// # Errors
    ///
    /// Fails if the process has no console or its modes cannot be changed.
    pub fn open() -> io::Result<Self> {
        let input = unsafe { GetStdHandle(STD_INPUT_HANDLE) }?;
        let output = unsafe { GetStdHandle(STD_OUTPUT_HANDLE) }?;

        let mut original_input_mode = CONSOLE_MODE::default();
        let mut original_output_mode = CONSOLE_MODE::default();
        unsafe {
            GetConsoleMode(input, &mut original_input_mode)?;
            GetConsoleMode(output, &mut original_output_mode)?;
            SetConsoleMode(
                input,
                ENABLE_WINDOW_INPUT | ENABLE_MOUSE_INPUT | ENABLE_EXTENDED_FLAGS,
            )?;
            SetConsoleMode(
                output,
                original_output_mode | ENABLE_PROCESSED_OUTPUT | ENABLE_VIRTUAL_TERMINAL_PROCESSING,
            )?;
        }
        debug!("console in raw mode");

        Ok(Self {
            input,
            output,
            original_input_mode,
            original_output_mode,
            mode: Arc::new(AtomicU8::new(InputMode::default().bits())),
            reader: None,
            restored: false,
        })
    }
}

impl Driver for ConsoleDriver {
    fn size(&self) -> io::Result<Size> {
        let window = window_rect(self.output)?;
        let cols = u16::try_from(window.Right - window.Left + 1).unwrap_or(0);
        let rows = u16::try_from(window.Bottom - window.Top + 1).unwrap_or(0);
        Ok(Size::new(cols, rows))
    }

    fn write_all(&mut self, mut bytes: &[u8]) -> io::Result<()> {
        while !bytes.is_empty() {
            let mut written = 0u32;
            unsafe { WriteFile(self.output, Some(bytes), Some(&mut written), None) }?;
            if written == 0 {
                return Err(io::ErrorKind::WriteZero.into());
            }
            bytes = &bytes[written as usize..];
        }
        Ok(())
    }

    fn spawn_reader(&mut self, tx: SyncSender<Input>) -> io::Result<()> {
        let console = Console {
            input: SendHandle(self.input),
            output: SendHandle(self.output),
        };
        let mode = Arc::clone(&self.mode);
        self.reader = Some(reader::spawn_named("cellbox-console-reader", move |stop| {
            read_console(&console, &mode, stop, &tx);
            debug!("console reader exiting");
        })?);
        Ok(())
    }

    fn set_input_mode(&mut self, mode: InputMode) {
        self.mode.store(mode.bits(), Ordering::Relaxed);
    }

    fn restore(&mut self) -> io::Result<()> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;
        if let Some(reader) = self.reader.take() {
            reader.stop();
        }
        unsafe {
            SetConsoleMode(self.input, self.original_input_mode)?;
            SetConsoleMode(self.output, self.original_output_mode)?;
        }
        debug!("console mode restored");
        Ok(())
    }
}

impl Drop for ConsoleDriver {
    fn drop(&mut self) {
        if let Err(err) = self.restore() {
            warn!(error = %err, "failed to restore console mode");
        }
    }
}

/// The visible window within the screen buffer.
fn window_rect(output: HANDLE) -> io::Result<SMALL_RECT> {
    let mut info = CONSOLE_SCREEN_BUFFER_INFO::default();
    unsafe { GetConsoleScreenBufferInfo(output, &mut info) }?;
    Ok(info.srWindow)
}

/// Reader loop: wait for records, translate, forward. Returns when stopped,
/// when the receiver is gone, or after reporting a failure.
fn read_console(console: &Console, mode: &AtomicU8, stop: &AtomicBool, tx: &SyncSender<Input>) {
    let mut translator = RecordTranslator::default();
    let mut records = [INPUT_RECORD::default(); RECORD_BATCH];
    let input = console.input.0;

    while !stop.load(Ordering::Relaxed) {
        if unsafe { WaitForSingleObject(input, WAIT_TIMEOUT_MS) } == WAIT_TIMEOUT {
            continue;
        }
        let mut count = 0u32;
        if let Err(err) = unsafe { ReadConsoleInputW(input, &mut records, &mut count) } {
            let err = io::Error::from(err);
            warn!(error = %err, "console reader stopped");
            let _ = tx.send(Input::Failed(err));
            return;
        }

        let mode = InputMode::from_bits_truncate(mode.load(Ordering::Relaxed));
        let origin = if mode.contains(InputMode::MOUSE) {
            window_rect(console.output.0).map_or((0, 0), |w| (w.Left, w.Top))
        } else {
            (0, 0)
        };
        for record in &records[..count as usize] {
            for message in translate_record(&mut translator, record, mode, origin) {
                if tx.send(message).is_err() {
                    return;
                }
            }
        }
    }
}

fn translate_record(
    translator: &mut RecordTranslator,
    record: &INPUT_RECORD,
    mode: InputMode,
    origin: (i16, i16),
) -> Vec<Input> {
    match u32::from(record.EventType) {
        KEY_EVENT => {
            let key: KEY_EVENT_RECORD = unsafe { record.Event.KeyEvent };
            if !key.bKeyDown.as_bool() {
                return Vec::new();
            }
            let unit = unsafe { key.uChar.UnicodeChar };
            translator
                .key(key.wVirtualKeyCode, unit, key.dwControlKeyState, mode)
                .map(|event| {
                    let repeat = usize::from(key.wRepeatCount.max(1));
                    (0..repeat).map(|_| Input::Event(Event::Key(event))).collect()
                })
                .unwrap_or_default()
        }
        MOUSE_EVENT if mode.contains(InputMode::MOUSE) => {
            let mouse: MOUSE_EVENT_RECORD = unsafe { record.Event.MouseEvent };
            translate_mouse(
                (mouse.dwMousePosition.X, mouse.dwMousePosition.Y),
                origin,
                mouse.dwButtonState,
                mouse.dwEventFlags,
            )
            .map(|event| vec![Input::Event(Event::Mouse(event))])
            .unwrap_or_default()
        }
        WINDOW_BUFFER_SIZE_EVENT => vec![Input::Resize],
        _ => Vec::new(),
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn key(vk: VIRTUAL_KEY, unit: u16, state: u32, mode: InputMode) -> Option<KeyEvent> {
        RecordTranslator::default().key(vk.0, unit, state, mode)
    }

    #[test]
    fn virtual_keys_map_to_special_keys() {
        assert_eq!(
            key(VK_F5, 0, 0, InputMode::ESC),
            Some(KeyEvent::new(Key::Special(SpecialKey::F5)))
        );
        assert_eq!(
            key(VK_NEXT, 0, 0, InputMode::ESC),
            Some(KeyEvent::new(Key::Special(SpecialKey::PageDown)))
        );
    }

    #[test]
    fn characters_and_control_units() {
        let a = key(VIRTUAL_KEY(0x41), u16::from(b'a'), 0, InputMode::ESC);
        assert_eq!(a, Some(KeyEvent::new(Key::Char('a'))));
        let ctrl_c = key(VIRTUAL_KEY(0x43), 0x03, 0, InputMode::ESC);
        assert_eq!(ctrl_c, Some(KeyEvent::new(Key::ctrl(b'c'))));
        assert_eq!(key(VIRTUAL_KEY(0x10), 0, 0, InputMode::ESC), None);
    }

    #[test]
    fn alt_reported_only_in_alt_mode() {
        let x = VIRTUAL_KEY(0x58);
        let esc = key(x, u16::from(b'x'), LEFT_ALT_PRESSED, InputMode::ESC).unwrap();
        assert!(esc.modifiers.is_empty());
        let alt = key(x, u16::from(b'x'), RIGHT_ALT_PRESSED, InputMode::ALT).unwrap();
        assert_eq!(alt.modifiers, Modifiers::ALT);
    }

    #[test]
    fn surrogate_pairs_join() {
        let mut translator = RecordTranslator::default();
        assert_eq!(translator.key(0, 0xD83D, 0, InputMode::ESC), None);
        assert_eq!(
            translator.key(0, 0xDE00, 0, InputMode::ESC),
            Some(KeyEvent::new(Key::Char('😀')))
        );
        assert_eq!(translator.key(0, 0xDE00, 0, InputMode::ESC), None);
    }

    fn mouse(x: i16, y: i16, buttons: u32, flags: u32) -> Option<MouseEvent> {
        translate_mouse((x, y), (0, 0), buttons, flags)
    }

    #[test]
    fn mouse_records() {
        let press = mouse(3, 4, 0x1, 0).unwrap();
        assert_eq!((press.button, press.x, press.y), (MouseButton::Left, 3, 4));
        assert_eq!(mouse(0, 0, 0, 0).unwrap().button, MouseButton::Release);
        assert_eq!(mouse(0, 0, 0, MOUSE_MOVED), None);

        let drag = mouse(1, 1, 0x2, MOUSE_MOVED).unwrap();
        assert_eq!(drag.button, MouseButton::Right);
        assert_eq!(drag.modifiers, Modifiers::MOTION);

        assert_eq!(mouse(0, 0, 120 << 16, MOUSE_WHEELED).unwrap().button, MouseButton::WheelUp);
        assert_eq!(
            mouse(0, 0, 0xFF88_0000, MOUSE_WHEELED).unwrap().button,
            MouseButton::WheelDown
        );
    }

    #[test]
    fn mouse_positions_are_window_relative() {
        // Window scrolled to buffer row 200, column 5.
        let press = translate_mouse((12, 203), (5, 200), 0x1, 0).unwrap();
        assert_eq!((press.x, press.y), (7, 3));

        let above = translate_mouse((0, 10), (5, 200), 0x1, 0).unwrap();
        assert_eq!((above.x, above.y), (0, 0));
    }
}
