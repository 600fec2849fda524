// SPDX-License-Identifier: MIT

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure to resolve a capability table.
#[derive(Debug, Error)]
pub enum TerminfoError {
    /// The terminal name is empty (usually `TERM` is unset).
    #[error("terminal type is not set")]
    NotSet,

    /// No built-in entry, database file, or compatible entry matched.
    #[error("unsupported terminal: {name:?}")]
    Unsupported { name: String },

    /// A compiled terminfo file exists but could not be decoded.
    #[error("malformed terminfo data in {}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    /// Reading a terminfo file failed for a reason other than absence.
    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Why a compiled terminfo entry could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("file ends inside the {0}")]
    Truncated(&'static str),

    #[error("bad magic number {0:#o}")]
    BadMagic(i16),

    #[error("negative {what} size {value}")]
    NegativeSize { what: &'static str, value: i16 },

    #[error("string capability {index} points outside the string table")]
    OffsetOutOfRange { index: usize },

    #[error("string capability {index} is not NUL-terminated")]
    Unterminated { index: usize },
}
