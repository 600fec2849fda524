// SPDX-License-Identifier: MIT
//
// Session: one open terminal, from init to shutdown.
//
// The session owns every piece of terminal state: the driver, the
// capability table, the back buffer the caller draws into, the renderer
// with its front buffer, the input decoder, and the mode and palette
// bookkeeping. There are no globals.
//
// Lifecycle:
//
//   init      load capabilities, open the driver, start the reader,
//             enter the alternate screen and keypad mode, hide the cursor
//   draw      set_cell / put_cell / blit / clear into the back buffer
//   render    diff back against front, one write to the driver
//   poll      decode buffered bytes, else wait on the input channel
//   shutdown  undo init in reverse, restore the device mode
//
// Control sequences produced between renders (cursor visibility, mouse
// mode, palette entries from rgb()) are queued in the renderer's output and
// go out ahead of the next frame.

use std::io;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use cellbox_term::ansi;
use cellbox_term::driver::{Driver, PlatformDriver, Size};
use cellbox_term::{
    Attribute, Cell, CellBuffer, Decoder, DiffRenderer, Event, Input, InputMode, OutputMode,
    ReadError, RenderStats,
};
use cellbox_terminfo::{Capabilities, Func};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::palette::{PALETTE_SIZE, PaletteAllocator, Rgb};

// ─── Interrupter ─────────────────────────────────────────────────────────────

/// Wakes a blocked [`Session::poll_event`] from another thread.
#[derive(Debug, Clone)]
pub struct Interrupter {
    tx: SyncSender<Input>,
}

impl Interrupter {
    /// Make the session's poll return [`Event::Interrupt`].
    ///
    /// Blocks until a poll takes the interrupt, so calling this from the
    /// thread that polls deadlocks. Returns `false` if the session is gone.
    pub fn interrupt(&self) -> bool {
        self.tx.send(Input::Interrupt).is_ok()
    }
}

// ─── Session ─────────────────────────────────────────────────────────────────

/// An initialized terminal.
///
/// Dropping the session shuts it down; call [`shutdown`](Self::shutdown)
/// to see the errors.
#[derive(Debug)]
pub struct Session<D: Driver = PlatformDriver> {
    driver: D,
    caps: Capabilities,
    term: String,
    escape_timeout: Duration,

    back: CellBuffer,
    renderer: DiffRenderer,
    clear_fg: Attribute,
    clear_bg: Attribute,
    cursor: Option<(u16, u16)>,

    decoder: Decoder,
    rx: Receiver<Input>,
    tx: SyncSender<Input>,

    output_mode: OutputMode,
    palette: PaletteAllocator,
    palette_changed: bool,
    closed: bool,
}

impl Session<PlatformDriver> {
    /// Initialize the controlling terminal with settings from the
    /// environment.
    ///
    /// # Errors
    ///
    /// See [`with_config`](Self::with_config).
    pub fn init() -> Result<Self> {
        Self::with_config(Config::from_env())
    }

    /// Initialize the controlling terminal.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedTerminal`] if no capability table matches
    /// `config.term`, [`Error::Initialization`] if the device cannot be
    /// opened, and [`Error::CapabilityUnavailable`] if the configured output
    /// mode needs colors the terminal lacks. Nothing is left behind on
    /// failure.
    pub fn with_config(config: Config) -> Result<Self> {
        let caps = load_capabilities(&config)?;
        check_output_mode(&config, config.output_mode)?;
        let driver = PlatformDriver::open().map_err(Error::Initialization)?;
        Self::start(driver, caps, config)
    }
}

impl<D: Driver> Session<D> {
    /// Initialize on an already open driver.
    ///
    /// # Errors
    ///
    /// As [`Session::with_config`]. On failure the driver is dropped.
    pub fn with_driver(driver: D, config: Config) -> Result<Self> {
        let caps = load_capabilities(&config)?;
        check_output_mode(&config, config.output_mode)?;
        Self::start(driver, caps, config)
    }

    fn start(mut driver: D, caps: Capabilities, config: Config) -> Result<Self> {
        let size = driver.size().map_err(Error::Initialization)?;
        let (tx, rx) = mpsc::sync_channel(0);
        driver
            .spawn_reader(tx.clone())
            .map_err(Error::Initialization)?;

        let input_mode = config.input_mode.normalized();
        driver.set_input_mode(input_mode);

        let mut setup = Vec::new();
        for func in [Func::EnterCa, Func::EnterKeypad, Func::HideCursor, Func::ClearScreen] {
            setup.extend_from_slice(caps.func(func));
        }
        if input_mode.contains(InputMode::MOUSE) {
            setup.extend_from_slice(caps.func(Func::EnterMouse));
        }
        driver.write_all(&setup).map_err(Error::Initialization)?;

        let blank = Cell::blank(config.clear_fg, config.clear_bg);
        debug!(
            term = %config.term,
            cols = size.cols,
            rows = size.rows,
            "session started"
        );

        Ok(Self {
            driver,
            caps,
            term: config.term,
            escape_timeout: config.escape_timeout,
            back: CellBuffer::new(size.cols, size.rows, blank),
            renderer: DiffRenderer::new(size.cols, size.rows, blank),
            clear_fg: config.clear_fg,
            clear_bg: config.clear_bg,
            cursor: None,
            decoder: Decoder::new(input_mode),
            rx,
            tx,
            output_mode: config.output_mode,
            palette: PaletteAllocator::new(),
            palette_changed: false,
            closed: false,
        })
    }

    /// Undo init and restore the terminal.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the teardown sequence cannot be written or
    /// the device mode cannot be restored. Restoring is attempted either
    /// way.
    pub fn shutdown(mut self) -> Result<()> {
        self.close()
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let mut teardown = Vec::new();
        for func in [Func::ShowCursor, Func::Sgr0, Func::ClearScreen] {
            teardown.extend_from_slice(self.caps.func(func));
        }
        if self.decoder.mode().contains(InputMode::MOUSE) {
            teardown.extend_from_slice(self.caps.func(Func::ExitMouse));
        }
        if self.palette_changed {
            teardown.extend_from_slice(ansi::RESET_PALETTE);
        }
        for func in [Func::ExitKeypad, Func::ExitCa] {
            teardown.extend_from_slice(self.caps.func(func));
        }

        let written = self.driver.write_all(&teardown);
        let restored = self.driver.restore();
        debug!("session closed");
        written?;
        restored?;
        Ok(())
    }

    // ── Accessors ───────────────────────────────────────────────────────

    /// Size of the back buffer, which tracks the terminal.
    #[must_use]
    pub const fn size(&self) -> Size {
        Size::new(self.back.width(), self.back.height())
    }

    #[must_use]
    pub const fn capabilities(&self) -> &Capabilities {
        &self.caps
    }

    /// The buffer the next render will show.
    #[must_use]
    pub const fn buffer(&self) -> &CellBuffer {
        &self.back
    }

    pub const fn buffer_mut(&mut self) -> &mut CellBuffer {
        &mut self.back
    }

    #[must_use]
    pub const fn cursor(&self) -> Option<(u16, u16)> {
        self.cursor
    }

    #[must_use]
    pub const fn driver(&self) -> &D {
        &self.driver
    }

    /// A handle that can wake a blocked poll from another thread.
    #[must_use]
    pub fn interrupter(&self) -> Interrupter {
        Interrupter {
            tx: self.tx.clone(),
        }
    }

    // ── Drawing ─────────────────────────────────────────────────────────

    /// Write one cell. Out-of-bounds coordinates are ignored.
    pub fn set_cell(&mut self, x: u16, y: u16, ch: char, fg: Attribute, bg: Attribute) {
        self.back.set(x, y, Cell::styled(ch, fg, bg));
    }

    /// Write a prepared cell. Out-of-bounds coordinates are ignored.
    pub fn put_cell(&mut self, x: u16, y: u16, cell: Cell) {
        self.back.set(x, y, cell);
    }

    /// Copy a `w`-wide block of cells with its top-left corner at `(x, y)`,
    /// clipped to the screen.
    pub fn blit(&mut self, x: u16, y: u16, w: u16, cells: &[Cell]) {
        self.back.blit(x, y, w, cells);
    }

    /// Fill the back buffer with spaces in `fg`/`bg`, which also become the
    /// colors for cells a later resize exposes.
    ///
    /// Picks up a terminal size change first, even one no poll has seen.
    pub fn clear(&mut self, fg: Attribute, bg: Attribute) {
        if let Err(err) = self.sync_size() {
            debug!(error = %err, "size query failed, keeping current size");
        }
        self.clear_fg = fg;
        self.clear_bg = bg;
        self.back.clear(self.blank());
    }

    const fn blank(&self) -> Cell {
        Cell::blank(self.clear_fg, self.clear_bg)
    }

    // ── Cursor ──────────────────────────────────────────────────────────

    /// Show the cursor at `(x, y)` after each render.
    pub fn set_cursor(&mut self, x: u16, y: u16) {
        if self.cursor.is_none() {
            self.renderer.queue(self.caps.func(Func::ShowCursor));
        }
        self.cursor = Some((x, y));
    }

    pub fn hide_cursor(&mut self) {
        if self.cursor.is_some() {
            self.renderer.queue(self.caps.func(Func::HideCursor));
        }
        self.cursor = None;
    }

    // ── Rendering ───────────────────────────────────────────────────────

    /// Bring the terminal in line with the back buffer.
    ///
    /// The terminal size is queried first. If it changed, the buffers are
    /// resized and everything is redrawn, whether or not a poll has
    /// delivered the resize yet.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the size query or the write fails. After a
    /// failed write the front buffer already reflects the frame, so the
    /// next render does not resend it.
    pub fn render(&mut self) -> Result<RenderStats> {
        self.sync_size()?;
        let stats = self
            .renderer
            .render(&self.back, &self.caps, self.output_mode, self.cursor);
        let bytes = self.renderer.output_bytes();
        let written = if bytes.is_empty() {
            Ok(())
        } else {
            self.driver.write_all(bytes)
        };
        self.renderer.clear_output();
        written?;
        Ok(stats)
    }

    // ── Modes ───────────────────────────────────────────────────────────

    /// Change the input mode and return the mode now in effect. An empty
    /// mode only queries.
    ///
    /// Switching mouse reporting on or off takes effect with the next
    /// render.
    pub fn set_input_mode(&mut self, mode: InputMode) -> InputMode {
        if mode.is_empty() {
            return self.decoder.mode();
        }
        let mode = mode.normalized();
        let previous = self.decoder.mode();
        match (
            previous.contains(InputMode::MOUSE),
            mode.contains(InputMode::MOUSE),
        ) {
            (false, true) => self.renderer.queue(self.caps.func(Func::EnterMouse)),
            (true, false) => self.renderer.queue(self.caps.func(Func::ExitMouse)),
            _ => {}
        }
        self.decoder.set_mode(mode);
        self.driver.set_input_mode(mode);
        debug!(?mode, "input mode changed");
        mode
    }

    /// Change how color selectors are rendered and return the mode now in
    /// effect. [`OutputMode::Current`] only queries.
    ///
    /// # Errors
    ///
    /// [`Error::CapabilityUnavailable`] if `mode` needs 256 colors and the
    /// terminal name does not contain `256`. The mode is unchanged.
    pub fn set_output_mode(&mut self, mode: OutputMode) -> Result<OutputMode> {
        if mode == OutputMode::Current {
            return Ok(self.output_mode);
        }
        if mode.needs_256_colors() && !self.term.contains("256") {
            return Err(Error::CapabilityUnavailable {
                mode,
                term: self.term.clone(),
            });
        }
        if mode == OutputMode::Rgb {
            self.palette.reset();
        }
        self.output_mode = mode;
        self.renderer.invalidate();
        debug!(?mode, "output mode changed");
        Ok(mode)
    }

    /// The attribute selecting `color`, uploading it to a free palette slot
    /// on first use. The upload goes out with the next render.
    ///
    /// # Errors
    ///
    /// [`Error::PaletteExhausted`] if `color` is new and every slot is
    /// taken.
    pub fn rgb(&mut self, color: Rgb) -> Result<Attribute> {
        if let Some(attr) = self.palette.attribute(color) {
            return Ok(attr);
        }
        let slot = self.palette.insert(color).ok_or(Error::PaletteExhausted)?;
        let mut entry = Vec::new();
        ansi::palette_entry(&mut entry, slot, color.to_array())?;
        self.renderer.queue(&entry);
        self.palette_changed = true;
        Ok(Attribute::from_palette(slot))
    }

    /// Load `colors` into palette slots `0..colors.len()` right away. Slot
    /// assignments made by [`rgb`](Self::rgb) are forgotten.
    ///
    /// # Errors
    ///
    /// [`Error::PaletteExhausted`] for more than 256 colors, [`Error::Io`]
    /// if the write fails.
    pub fn set_color_palette(&mut self, colors: &[Rgb]) -> Result<()> {
        if colors.len() > PALETTE_SIZE {
            return Err(Error::PaletteExhausted);
        }
        let mut out = Vec::new();
        for (slot, color) in (0..=u8::MAX).zip(colors) {
            ansi::palette_entry(&mut out, slot, color.to_array())?;
        }
        self.palette.reset();
        if !out.is_empty() {
            self.palette_changed = true;
            self.driver.write_all(&out)?;
        }
        Ok(())
    }

    // ── Events ──────────────────────────────────────────────────────────

    /// Wait for the next event.
    pub fn poll_event(&mut self) -> Event {
        self.wait_event(None)
    }

    /// Wait at most `timeout` for an event. Returns [`Event::None`] when
    /// nothing arrives.
    pub fn poll_event_timeout(&mut self, timeout: Duration) -> Event {
        self.wait_event(Some(Instant::now() + timeout))
    }

    fn wait_event(&mut self, deadline: Option<Instant>) -> Event {
        loop {
            if let Some(event) = self.decoder.next_event(&self.caps) {
                return event;
            }

            let pending = self.decoder.awaits_escape_timeout();
            let remaining = deadline.map(|d| d.saturating_duration_since(Instant::now()));
            let wait = match (pending, remaining) {
                (true, Some(left)) => Some(left.min(self.escape_timeout)),
                (true, None) => Some(self.escape_timeout),
                (false, left) => left,
            };
            let received = match wait {
                Some(wait) => self.rx.recv_timeout(wait),
                None => self.rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
            };

            match received {
                Ok(input) => {
                    if let Some(event) = self.handle_input(input) {
                        return event;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    if pending {
                        if let Some(event) = self.decoder.flush(&self.caps) {
                            return event;
                        }
                    }
                    if deadline.is_some_and(|d| Instant::now() >= d) {
                        return Event::None;
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    let err = io::Error::new(io::ErrorKind::BrokenPipe, "input channel closed");
                    return Event::Error(ReadError::from(err));
                }
            }
        }
    }

    fn handle_input(&mut self, input: Input) -> Option<Event> {
        match input {
            Input::Bytes(bytes) => {
                self.decoder.feed(&bytes);
                None
            }
            Input::Event(event) => Some(event),
            Input::Resize => Some(match self.driver.size() {
                Ok(size) => {
                    self.resize(size);
                    Event::Resize(size)
                }
                Err(err) => Event::Error(ReadError::from(err)),
            }),
            Input::Failed(err) => Some(Event::Error(ReadError::from(err))),
            Input::Interrupt => Some(Event::Interrupt),
        }
    }

    /// Ask the driver for the current size and follow it if it changed.
    fn sync_size(&mut self) -> io::Result<()> {
        let size = self.driver.size()?;
        self.resize(size);
        Ok(())
    }

    /// Follow a terminal size change: keep the overlapping content, clear
    /// the screen, and redraw everything on the next render.
    fn resize(&mut self, size: Size) {
        if size == self.size() {
            return;
        }
        debug!(cols = size.cols, rows = size.rows, "terminal resized");
        let blank = self.blank();
        self.back.resize(size.cols, size.rows, blank);
        self.renderer.resize(size.cols, size.rows, blank);
        self.renderer.queue(self.caps.func(Func::Sgr0));
        self.renderer.queue(self.caps.func(Func::ClearScreen));
    }
}

impl<D: Driver> Drop for Session<D> {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            warn!(error = %err, "failed to shut down terminal session");
        }
    }
}

fn load_capabilities(config: &Config) -> Result<Capabilities> {
    Ok(cellbox_terminfo::load(
        &config.term,
        config.terminfo_root.as_deref(),
    )?)
}

fn check_output_mode(config: &Config, mode: OutputMode) -> Result<()> {
    if mode.needs_256_colors() && !config.supports_256_colors() {
        return Err(Error::CapabilityUnavailable {
            mode,
            term: config.term.clone(),
        });
    }
    Ok(())
}

// ─── Tests ───────────────────────────────────────────────────────────────────
