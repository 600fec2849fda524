// SPDX-License-Identifier: MIT
//
// cellbox-term: the terminal engine under cellbox.
//
// Everything between a grid of cells and the terminal device:
//
//   attr, cell, buffer   what a screen position holds, and grids of them
//   ansi, output         escape sequence formatting and frame buffering
//   render               front-buffer diffing against a back buffer
//   input                bytes to key, mouse and resize events
//   reader, driver       raw mode, size queries and background input per OS
//
// The crate has no global state apart from the driver's restore bookkeeping.
// The session type that ties these together lives in the `cellbox` crate.

pub mod ansi;
pub mod attr;
pub mod buffer;
pub mod cell;
pub mod driver;
pub mod input;
pub mod output;
pub mod reader;
pub mod render;

pub use attr::{Attribute, OutputMode, Style};
pub use buffer::CellBuffer;
pub use cell::Cell;
pub use driver::{Driver, PlatformDriver, Size};
pub use input::{
    Decoder, Event, InputMode, Key, KeyEvent, Modifiers, MouseButton, MouseEvent, ReadError,
};
pub use reader::Input;
pub use render::{DiffRenderer, RenderStats};
