// SPDX-License-Identifier: MIT
//
// cellbox: a terminal as a grid of styled cells.
//
// A `Session` puts the terminal in raw mode and hands out a back buffer of
// cells. Draw into it, call `render()`, and only the cells that changed
// since the last render reach the terminal. `poll_event()` delivers key,
// mouse and resize events decoded from the raw input stream.
//
//   cellbox-terminfo   which control sequences the terminal understands
//   cellbox-term       buffers, diff renderer, input decoder, OS drivers
//   cellbox            Session, Config, Error, palette helpers
//
// Usage:
//
//   let mut session = cellbox::Session::init()?;
//   session.set_cell(0, 0, 'x', Attribute::RED, Attribute::DEFAULT);
//   session.render()?;
//   let event = session.poll_event();
//   session.shutdown()?;

pub mod config;
pub mod error;
pub mod palette;
pub mod session;

pub use config::Config;
pub use error::{Error, Result};
pub use palette::{Rgb, xterm_256};
pub use session::{Interrupter, Session};

pub use cellbox_term::driver::{Driver, PlatformDriver, Size};
pub use cellbox_term::{
    Attribute, Cell, CellBuffer, Event, Input, InputMode, Key, KeyEvent, Modifiers, MouseButton,
    MouseEvent, OutputMode, ReadError, RenderStats, Style,
};
pub use cellbox_terminfo::{Capabilities, SpecialKey, TerminfoError};
