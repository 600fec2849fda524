// SPDX-License-Identifier: MIT
//
// Session configuration.
//
// Everything a session reads from the environment is read here, once.
// After `Config::from_env()` nothing consults TERM or TERMINFO again.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use cellbox_term::{Attribute, InputMode, OutputMode};

/// Terminal type assumed when `TERM` is unset. Consoles on Windows do not
/// set it.
#[cfg(windows)]
pub const FALLBACK_TERM: &str = "xterm";
#[cfg(not(windows))]
pub const FALLBACK_TERM: &str = "";

/// How long an ambiguous escape prefix may wait for more bytes.
pub const DEFAULT_ESCAPE_TIMEOUT: Duration = Duration::from_millis(10);

/// Settings for [`Session`](crate::Session).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Terminal type used for capability lookup and the 256-color check.
    pub term: String,
    /// Root of the compiled terminfo database. `None` uses
    /// `/usr/share/terminfo`.
    pub terminfo_root: Option<PathBuf>,
    pub input_mode: InputMode,
    pub output_mode: OutputMode,
    pub escape_timeout: Duration,
    /// Colors used by clears and for cells exposed by a resize.
    pub clear_fg: Attribute,
    pub clear_bg: Attribute,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            term: FALLBACK_TERM.to_owned(),
            terminfo_root: None,
            input_mode: InputMode::ESC,
            output_mode: OutputMode::Normal,
            escape_timeout: DEFAULT_ESCAPE_TIMEOUT,
            clear_fg: Attribute::DEFAULT,
            clear_bg: Attribute::DEFAULT,
        }
    }
}

impl Config {
    /// Defaults, with `TERM` and `TERMINFO` from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Defaults, with `TERM` and `TERMINFO` taken from `lookup`. Empty
    /// values count as unset.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|value| !value.is_empty());
        let mut config = Self::default();
        if let Some(term) = var("TERM") {
            config.term = term;
        }
        config.terminfo_root = var("TERMINFO").map(PathBuf::from);
        config
    }

    #[must_use]
    pub fn with_term(mut self, term: impl Into<String>) -> Self {
        self.term = term.into();
        self
    }

    #[must_use]
    pub fn with_terminfo_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.terminfo_root = Some(root.into());
        self
    }

    #[must_use]
    pub const fn with_input_mode(mut self, mode: InputMode) -> Self {
        self.input_mode = mode;
        self
    }

    #[must_use]
    pub const fn with_output_mode(mut self, mode: OutputMode) -> Self {
        self.output_mode = mode;
        self
    }

    #[must_use]
    pub const fn with_escape_timeout(mut self, timeout: Duration) -> Self {
        self.escape_timeout = timeout;
        self
    }

    #[must_use]
    pub const fn with_clear_colors(mut self, fg: Attribute, bg: Attribute) -> Self {
        self.clear_fg = fg;
        self.clear_bg = bg;
        self
    }

    /// Whether the terminal name advertises 256 colors, which every output
    /// mode other than Normal needs.
    #[must_use]
    pub fn supports_256_colors(&self) -> bool {
        self.term.contains("256")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn lookup_reads_term_and_terminfo() {
        let config = Config::from_lookup(|key| match key {
            "TERM" => Some("xterm-256color".to_owned()),
            "TERMINFO" => Some("/opt/terminfo".to_owned()),
            _ => None,
        });
        assert_eq!(config.term, "xterm-256color");
        assert_eq!(config.terminfo_root, Some(PathBuf::from("/opt/terminfo")));
        assert_eq!(config.input_mode, InputMode::ESC);
        assert_eq!(config.escape_timeout, DEFAULT_ESCAPE_TIMEOUT);
    }

    #[test]
    fn empty_variables_are_unset() {
        let config = Config::from_lookup(|_| Some(String::new()));
        assert_eq!(config.term, FALLBACK_TERM);
        assert_eq!(config.terminfo_root, None);
    }

    #[test]
    fn builders_override_defaults() {
        let config = Config::default()
            .with_term("screen-256color")
            .with_terminfo_root("/tmp/ti")
            .with_input_mode(InputMode::ALT | InputMode::MOUSE)
            .with_output_mode(OutputMode::Grayscale)
            .with_escape_timeout(Duration::from_millis(50))
            .with_clear_colors(Attribute::WHITE, Attribute::BLUE);

        assert_eq!(config.term, "screen-256color");
        assert_eq!(config.terminfo_root, Some(PathBuf::from("/tmp/ti")));
        assert_eq!(config.input_mode, InputMode::ALT | InputMode::MOUSE);
        assert_eq!(config.output_mode, OutputMode::Grayscale);
        assert_eq!(config.escape_timeout, Duration::from_millis(50));
        assert_eq!((config.clear_fg, config.clear_bg), (Attribute::WHITE, Attribute::BLUE));
    }

    #[test]
    fn color_support_follows_term_name() {
        assert!(Config::default().with_term("xterm-256color").supports_256_colors());
        assert!(!Config::default().with_term("xterm").supports_256_colors());
    }
}
