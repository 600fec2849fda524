// SPDX-License-Identifier: MIT
//
// POSIX driver: termios raw mode on /dev/tty.
//
// Safety: termios (tcgetattr, tcsetattr), ioctl (TIOCGWINSZ), and poll have
// no safe std equivalent. Each unsafe block is one FFI call on a descriptor
// this module owns.
#![allow(unsafe_code)]
//
// Opening saves the current termios, applies the cfmakeraw flags with
// VMIN=1 and VTIME=0, and installs a panic hook. The hook writes a fixed
// restore sequence and puts the saved termios back, so a panic in raw mode
// leaves a usable shell behind.
//
// Input runs on two threads: a reader that polls the tty with a short
// timeout (so it notices the stop flag) and a signal-hook iterator that
// turns SIGWINCH into Input::Resize.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::unix::io::{AsRawFd, RawFd};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::SyncSender;
use std::sync::{Mutex, Once};
use std::thread;

use signal_hook::consts::signal::SIGWINCH;
use signal_hook::iterator::{Handle as SignalHandle, Signals};
use tracing::{debug, warn};

use super::{Driver, Size};
use crate::ansi;
use crate::reader::{self, Input, ReadOutcome, ReaderHandle};

/// Terminal device opened for both input and output.
const TTY_PATH: &str = "/dev/tty";

/// How long the reader waits in `poll` before rechecking its stop flag.
const POLL_TIMEOUT_MS: i32 = 50;

// ─── Single instance ─────────────────────────────────────────────────────────

/// Set while a `TtyDriver` exists. Two drivers would fight over the saved
/// termios.
static OPEN: AtomicBool = AtomicBool::new(false);

/// Held by a driver; releases the process-wide slot on drop.
#[derive(Debug)]
struct InstanceGuard(());

impl InstanceGuard {
    fn claim() -> io::Result<Self> {
        if OPEN.swap(true, Ordering::AcqRel) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                "a terminal driver is already open in this process",
            ));
        }
        Ok(Self(()))
    }
}

impl Drop for InstanceGuard {
    fn drop(&mut self) {
        OPEN.store(false, Ordering::Release);
    }
}

// ─── Panic-safe restore ──────────────────────────────────────────────────────

/// Descriptor and saved termios for the panic hook, which cannot reach the
/// driver itself.
static TERMIOS_BACKUP: Mutex<Option<(RawFd, libc::termios)>> = Mutex::new(None);

static PANIC_HOOK_INSTALLED: Once = Once::new();

fn install_panic_hook() {
    PANIC_HOOK_INSTALLED.call_once(|| {
        let original = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            restore_from_backup();
            original(info);
        }));
    });
}

/// Best effort: write the restore sequence straight to the descriptor and
/// reapply the saved termios.
fn restore_from_backup() {
    let Ok(guard) = TERMIOS_BACKUP.lock() else {
        return;
    };
    if let Some((fd, ref original)) = *guard {
        unsafe {
            let _ = libc::write(
                fd,
                ansi::EMERGENCY_RESTORE.as_ptr().cast::<libc::c_void>(),
                ansi::EMERGENCY_RESTORE.len(),
            );
            let _ = libc::tcsetattr(fd, libc::TCSANOW, original);
        }
    }
}

fn set_backup(value: Option<(RawFd, libc::termios)>) {
    if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
        *guard = value;
    }
}

// ─── termios ─────────────────────────────────────────────────────────────────

fn get_termios(fd: RawFd) -> io::Result<libc::termios> {
    let mut termios: libc::termios = unsafe { std::mem::zeroed() };
    if unsafe { libc::tcgetattr(fd, &raw mut termios) } != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(termios)
}

fn set_termios(fd: RawFd, termios: &libc::termios) -> io::Result<()> {
    if unsafe { libc::tcsetattr(fd, libc::TCSAFLUSH, termios) } != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// cfmakeraw: no line discipline, no echo, no signals, 8-bit bytes.
/// Reads block until at least one byte is available.
fn make_raw(termios: &mut libc::termios) {
    termios.c_iflag &= !(libc::IGNBRK
        | libc::BRKINT
        | libc::PARMRK
        | libc::ISTRIP
        | libc::INLCR
        | libc::IGNCR
        | libc::ICRNL
        | libc::IXON);
    termios.c_oflag &= !libc::OPOST;
    termios.c_lflag &= !(libc::ECHO | libc::ECHONL | libc::ICANON | libc::ISIG | libc::IEXTEN);
    termios.c_cflag &= !(libc::CSIZE | libc::PARENB);
    termios.c_cflag |= libc::CS8;
    termios.c_cc[libc::VMIN] = 1;
    termios.c_cc[libc::VTIME] = 0;
}

fn window_size(fd: RawFd) -> io::Result<Size> {
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    if unsafe { libc::ioctl(fd, libc::TIOCGWINSZ, &raw mut ws) } != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(Size::new(ws.ws_col, ws.ws_row))
}

/// Wait up to `timeout_ms` for `fd` to become readable.
fn wait_readable(fd: RawFd, timeout_ms: i32) -> io::Result<bool> {
    let mut pfd = libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    };
    match unsafe { libc::poll(&raw mut pfd, 1, timeout_ms) } {
        n if n < 0 => Err(io::Error::last_os_error()),
        0 => Ok(false),
        _ => Ok(true),
    }
}

// ─── TtyDriver ───────────────────────────────────────────────────────────────

/// The controlling terminal in raw mode.
pub struct TtyDriver {
    tty: File,
    original: libc::termios,
    restored: bool,
    reader: Option<ReaderHandle>,
    resize: Option<SignalHandle>,
    _instance: InstanceGuard,
}

impl std::fmt::Debug for TtyDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtyDriver")
            .field("tty", &self.tty)
            .field("restored", &self.restored)
            .field("reader", &self.reader)
            .finish_non_exhaustive()
    }
}

impl TtyDriver {
    /// Open `/dev/tty` and switch it to raw mode.
    ///
    /// # Errors
    ///
    /// Fails if another driver is open in this process, if there is no
    /// controlling terminal, or if its mode cannot be read or set.
    pub fn open() -> io::Result<Self> {
        let instance = InstanceGuard::claim()?;
        let tty = OpenOptions::new().read(true).write(true).open(TTY_PATH)?;
        let fd = tty.as_raw_fd();

        let original = get_termios(fd)?;
        install_panic_hook();
        set_backup(Some((fd, original)));

        let mut raw = original;
        make_raw(&mut raw);
        if let Err(err) = set_termios(fd, &raw) {
            set_backup(None);
            return Err(err);
        }
        debug!(path = TTY_PATH, "terminal in raw mode");

        Ok(Self {
            tty,
            original,
            restored: false,
            reader: None,
            resize: None,
            _instance: instance,
        })
    }

    fn spawn_resize_notifier(tx: SyncSender<Input>) -> io::Result<SignalHandle> {
        let mut signals = Signals::new([SIGWINCH])?;
        let handle = signals.handle();
        thread::Builder::new()
            .name("cellbox-resize".to_owned())
            .spawn(move || {
                for _ in signals.forever() {
                    if tx.send(Input::Resize).is_err() {
                        break;
                    }
                }
            })?;
        Ok(handle)
    }
}

impl Driver for TtyDriver {
    fn size(&self) -> io::Result<Size> {
        window_size(self.tty.as_raw_fd())
    }

    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.tty.write_all(bytes)?;
        self.tty.flush()
    }

    fn spawn_reader(&mut self, tx: SyncSender<Input>) -> io::Result<()> {
        let mut tty = self.tty.try_clone()?;
        let fd = tty.as_raw_fd();
        self.resize = Some(Self::spawn_resize_notifier(tx.clone())?);
        self.reader = Some(reader::spawn_byte_reader("cellbox-reader", tx, move |buf| {
            if !wait_readable(fd, POLL_TIMEOUT_MS)? {
                return Ok(ReadOutcome::Idle);
            }
            tty.read(buf).map(ReadOutcome::Data)
        })?);
        Ok(())
    }

    fn restore(&mut self) -> io::Result<()> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;

        if let Some(reader) = self.reader.take() {
            reader.stop();
        }
        if let Some(resize) = self.resize.take() {
            resize.close();
        }
        set_backup(None);
        set_termios(self.tty.as_raw_fd(), &self.original)?;
        debug!("terminal mode restored");
        Ok(())
    }
}

impl Drop for TtyDriver {
    fn drop(&mut self) {
        if let Err(err) = self.restore() {
            warn!(error = %err, "failed to restore terminal mode");
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
