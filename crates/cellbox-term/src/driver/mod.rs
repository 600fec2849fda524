// SPDX-License-Identifier: MIT
//
// Platform drivers: raw mode, size queries, output, and background input.
//
// The rest of the crate never touches OS primitives. A session talks to
// one `Driver`; `PlatformDriver` picks the implementation for the target
// at compile time:
//
//   unix     TtyDriver      termios on /dev/tty, SIGWINCH via signal-hook
//   windows  ConsoleDriver  console modes, ReadConsoleInputW, VT output
//
// Capability-driven setup (alternate screen, keypad, cursor) is the
// session's job; drivers only switch the device mode and move bytes.

use std::io;
use std::sync::mpsc::SyncSender;

use crate::input::InputMode;
use crate::reader::Input;

#[cfg(unix)]
pub mod unix;
#[cfg(windows)]
pub mod windows;

/// The driver for the compilation target.
#[cfg(unix)]
pub type PlatformDriver = unix::TtyDriver;
/// The driver for the compilation target.
#[cfg(windows)]
pub type PlatformDriver = windows::ConsoleDriver;

// ─── Size ────────────────────────────────────────────────────────────────────

/// Terminal dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Size {
    pub cols: u16,
    pub rows: u16,
}

impl Size {
    #[inline]
    #[must_use]
    pub const fn new(cols: u16, rows: u16) -> Self {
        Self { cols, rows }
    }

    /// Total number of cells.
    #[inline]
    #[must_use]
    pub const fn area(self) -> u32 {
        self.cols as u32 * self.rows as u32
    }
}

// ─── Driver ──────────────────────────────────────────────────────────────────

/// An open terminal device in raw mode.
pub trait Driver {
    /// Current size of the terminal.
    ///
    /// # Errors
    ///
    /// Returns an error if the OS query fails.
    fn size(&self) -> io::Result<Size>;

    /// Write `bytes` in one call and flush.
    ///
    /// # Errors
    ///
    /// Returns an error if the device write fails.
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Start the background input reader and resize notifier, sending to
    /// `tx`. Called once, right after the driver is opened.
    ///
    /// # Errors
    ///
    /// Returns an error if a thread or signal handler cannot be set up.
    fn spawn_reader(&mut self, tx: SyncSender<Input>) -> io::Result<()>;

    /// The session's input mode changed. Drivers that decode input
    /// themselves use it to decide how Alt is reported.
    fn set_input_mode(&mut self, _mode: InputMode) {}

    /// Stop background work and put the device back into the mode it had
    /// when opened. Calls after the first do nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the saved mode cannot be applied.
    fn restore(&mut self) -> io::Result<()>;
}
