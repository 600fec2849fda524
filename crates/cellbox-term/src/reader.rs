// SPDX-License-Identifier: MIT
//
// Background input threads and the messages they send.
//
// Every producer (the byte reader, the resize notifier, an interrupter)
// sends `Input` messages over one `sync_channel(0)`. The channel is a
// rendezvous: a send blocks until the session's poll takes the message,
// so at most one chunk is in flight and nothing is queued behind the
// caller's back.
//
// Shutdown: the reader checks an `AtomicBool` stop flag after every read.
// A read blocked in the kernel is not cancelled; the thread exits on its
// next wake-up, either by seeing the flag or because the session dropped
// the receiving end and the send fails. Nothing joins the thread.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::SyncSender;
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};

use crate::input::Event;

/// Bytes per read. One keypress is 1-6 bytes; a burst of mouse reports or
/// a paste simply takes several reads.
pub const READ_BUF_SIZE: usize = 128;

/// A message from a background producer to the session.
#[derive(Debug)]
pub enum Input {
    /// Raw terminal bytes for the decoder.
    Bytes(Vec<u8>),
    /// An event the driver decoded itself (console input records).
    Event(Event),
    /// The terminal was resized. The session queries the new size.
    Resize,
    /// Reading failed. The producer has stopped.
    Failed(io::Error),
    /// Wake a blocked poll.
    Interrupt,
}

// ─── ReaderHandle ────────────────────────────────────────────────────────────

/// Stop flag and thread handle of a background reader.
///
/// Dropping the handle raises the stop flag but does not wait.
#[derive(Debug)]
pub struct ReaderHandle {
    stop: Arc<AtomicBool>,
    thread: JoinHandle<()>,
}

impl ReaderHandle {
    /// Ask the thread to exit at its next wake-up.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    /// Whether the thread has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }
}

impl Drop for ReaderHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// What one read produced.
#[derive(Debug, PartialEq, Eq)]
pub enum ReadOutcome {
    /// `n` bytes were placed at the front of the buffer. 0 is end of input.
    Data(usize),
    /// Nothing arrived before an internal timeout. Check the stop flag and
    /// read again.
    Idle,
}

/// Spawn a thread that calls `read` in a loop and forwards each chunk as
/// [`Input::Bytes`].
///
/// The thread exits when the stop flag is raised, when the receiver is
/// gone, or after reporting a read failure (end of input counts as one)
/// as [`Input::Failed`]. Interrupted reads are retried.
///
/// # Errors
///
/// Returns an error if the OS cannot spawn the thread.
pub fn spawn_byte_reader<F>(
    name: &str,
    tx: SyncSender<Input>,
    mut read: F,
) -> io::Result<ReaderHandle>
where
    F: FnMut(&mut [u8]) -> io::Result<ReadOutcome> + Send + 'static,
{
    spawn_named(name, move |stop| {
        let mut buf = [0u8; READ_BUF_SIZE];
        loop {
            if stop.load(Ordering::Relaxed) {
                break;
            }
            let message = match read(&mut buf) {
                Ok(ReadOutcome::Idle) => continue,
                Ok(ReadOutcome::Data(0)) => Input::Failed(io::ErrorKind::UnexpectedEof.into()),
                Ok(ReadOutcome::Data(n)) => Input::Bytes(buf[..n].to_vec()),
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => Input::Failed(err),
            };
            let failed = matches!(message, Input::Failed(_));
            if let Input::Failed(err) = &message {
                warn!(error = %err, "terminal reader stopped");
            }
            if tx.send(message).is_err() || failed {
                break;
            }
        }
        debug!("terminal reader exiting");
    })
}

/// Spawn a named thread running `body` with a fresh stop flag.
///
/// # Errors
///
/// Returns an error if the OS cannot spawn the thread.
pub fn spawn_named<F>(name: &str, body: F) -> io::Result<ReaderHandle>
where
    F: FnOnce(&AtomicBool) + Send + 'static,
{
    let stop = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&stop);
    let thread = thread::Builder::new()
        .name(name.to_owned())
        .spawn(move || body(&flag))?;
    Ok(ReaderHandle { stop, thread })
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::sync::mpsc;
    use std::time::{Duration, Instant};

    fn wait_until_finished(handle: &ReaderHandle) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if handle.is_finished() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        false
    }

    #[test]
    fn chunks_then_end_of_input() {
        let (tx, rx) = mpsc::sync_channel(0);
        let mut source = io::Cursor::new(vec![b'x'; READ_BUF_SIZE + 3]);
        let handle =
            spawn_byte_reader("test-reader", tx, move |buf| source.read(buf).map(ReadOutcome::Data))
                .unwrap();

        let Input::Bytes(first) = rx.recv().unwrap() else {
            panic!("expected bytes");
        };
        assert_eq!(first.len(), READ_BUF_SIZE);
        let Input::Bytes(second) = rx.recv().unwrap() else {
            panic!("expected bytes");
        };
        assert_eq!(second, b"xxx");
        let Input::Failed(err) = rx.recv().unwrap() else {
            panic!("expected failure");
        };
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);

        assert!(wait_until_finished(&handle));
        assert!(rx.recv().is_err());
    }

    #[test]
    fn read_error_is_reported_once() {
        let (tx, rx) = mpsc::sync_channel(0);
        let handle = spawn_byte_reader("test-reader", tx, |_| {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone"))
        })
        .unwrap();

        let Input::Failed(err) = rx.recv().unwrap() else {
            panic!("expected failure");
        };
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        assert!(wait_until_finished(&handle));
    }

    #[test]
    fn interrupted_reads_are_retried() {
        let (tx, rx) = mpsc::sync_channel(0);
        let mut calls = 0;
        let _handle = spawn_byte_reader("test-reader", tx, move |buf| {
            calls += 1;
            if calls == 1 {
                return Err(io::ErrorKind::Interrupted.into());
            }
            buf[0] = b'k';
            Ok(ReadOutcome::Data(1))
        })
        .unwrap();

        let Input::Bytes(bytes) = rx.recv().unwrap() else {
            panic!("expected bytes");
        };
        assert_eq!(bytes, b"k");
    }

    #[test]
    fn stop_flag_ends_idle_reader() {
        let (tx, _rx) = mpsc::sync_channel(0);
        let handle = spawn_byte_reader("test-reader", tx, |_| {
            thread::sleep(Duration::from_millis(1));
            Ok(ReadOutcome::Idle)
        })
        .unwrap();

        assert!(!handle.is_finished());
        handle.stop();
        assert!(wait_until_finished(&handle));
    }

    #[test]
    fn dropped_receiver_ends_reader() {
        let (tx, rx) = mpsc::sync_channel(0);
        drop(rx);
        let handle = spawn_byte_reader("test-reader", tx, |buf| {
            buf[0] = b'z';
            Ok(ReadOutcome::Data(1))
        })
        .unwrap();
        assert!(wait_until_finished(&handle));
    }
}
