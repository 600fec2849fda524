// SPDX-License-Identifier: MIT

use std::io;

use thiserror::Error;

use cellbox_term::OutputMode;
use cellbox_terminfo::TerminfoError;

/// Everything a [`Session`](crate::Session) operation can fail with.
///
/// Input failures are not here: they arrive as
/// [`Event::Error`](cellbox_term::Event::Error) from the poll.
#[derive(Debug, Error)]
pub enum Error {
    /// The terminal device could not be opened or switched to raw mode.
    #[error("failed to initialize the terminal: {0}")]
    Initialization(#[source] io::Error),

    /// No capability table matches the terminal type.
    #[error(transparent)]
    UnsupportedTerminal(#[from] TerminfoError),

    /// The output mode needs a 256-color terminal. The previous mode is
    /// still active.
    #[error("output mode {mode:?} needs a 256-color terminal, but TERM is {term:?}")]
    CapabilityUnavailable { mode: OutputMode, term: String },

    /// Every palette slot holds a live color, or a palette longer than 256
    /// entries was given.
    #[error("all 256 palette slots are in use")]
    PaletteExhausted,

    /// Writing to the terminal failed.
    #[error("terminal write failed: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
