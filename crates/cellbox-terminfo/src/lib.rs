// SPDX-License-Identifier: MIT
//
// cellbox-terminfo: terminal capability tables.
//
// Resolves a terminal type name to the two things the rest of cellbox
// needs from terminfo: the byte sequences the terminal sends for special
// keys, and the parameterless control sequences it understands (alternate
// screen, cursor visibility, clear, SGR markers, keypad transmit).
//
// Lookup order:
//
//   1. built-in entries keyed by exact terminal name
//   2. the compiled terminfo database (`$TERMINFO` or /usr/share/terminfo)
//   3. built-in entries keyed by substring ("xterm-kitty" → xterm)
//
// Only string capabilities are read. Booleans, numbers, parameterized
// strings and the extended capability block are skipped: cursor
// motion and colors are emitted as plain ANSI by the renderer.

pub mod builtin;
pub mod caps;
mod error;
pub mod load;
pub mod parse;

pub use caps::{Capabilities, Func, KeyMatch, Source, SpecialKey};
pub use error::{ParseError, TerminfoError};
pub use load::{load, DEFAULT_TERMINFO_ROOT};
