// SPDX-License-Identifier: MIT
//
// Capability table resolution: exact built-in → database file → substring
// built-in.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::builtin;
use crate::caps::{Capabilities, Source};
use crate::error::TerminfoError;
use crate::parse;

/// Database root used when `$TERMINFO` is not set.
pub const DEFAULT_TERMINFO_ROOT: &str = "/usr/share/terminfo";

/// Resolve the capability table for terminal `name`.
///
/// `root` is the terminfo database directory; `None` means
/// [`DEFAULT_TERMINFO_ROOT`]. A malformed or unreadable database entry is
/// logged and treated as missing.
///
/// # Errors
///
/// [`TerminfoError::NotSet`] for an empty name, otherwise
/// [`TerminfoError::Unsupported`] when no source matches.
pub fn load(name: &str, root: Option<&Path>) -> Result<Capabilities, TerminfoError> {
    if name.is_empty() {
        return Err(TerminfoError::NotSet);
    }

    if let Some(caps) = builtin::exact(name) {
        debug!(term = name, "using built-in capability entry");
        return Ok(caps);
    }

    let root = root.unwrap_or_else(|| Path::new(DEFAULT_TERMINFO_ROOT));
    match from_database(name, root) {
        Ok(Some(caps)) => {
            debug!(term = name, source = ?caps.source(), "using terminfo database entry");
            return Ok(caps);
        }
        Ok(None) => debug!(term = name, root = %root.display(), "no terminfo database entry"),
        Err(err) => debug!(term = name, error = %err, "ignoring terminfo database entry"),
    }

    if let Some(caps) = builtin::compatible(name) {
        debug!(term = name, source = ?caps.source(), "using compatible built-in entry");
        return Ok(caps);
    }

    Err(TerminfoError::Unsupported {
        name: name.to_owned(),
    })
}

/// Candidate paths for `name` under `root`: the `<letter>/<name>` layout
/// used on Linux, then the `<hex>/<name>` layout used on macOS.
fn candidates(name: &str, root: &Path) -> Vec<PathBuf> {
    let Some(first) = name.chars().next() else {
        return Vec::new();
    };
    let mut paths = vec![root.join(first.to_string()).join(name)];
    if first.is_ascii() {
        paths.push(root.join(format!("{:x}", u32::from(first))).join(name));
    }
    paths
}

/// Read and parse the database entry for `name`, if one exists.
fn from_database(name: &str, root: &Path) -> Result<Option<Capabilities>, TerminfoError> {
    for path in candidates(name, root) {
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
            Err(source) => return Err(TerminfoError::Io { path, source }),
        };
        return parse::parse(name, Source::Terminfo(path.clone()), &data)
            .map(Some)
            .map_err(|source| TerminfoError::Malformed { path, source });
    }
    Ok(None)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
