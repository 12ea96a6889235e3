//! User mode accumulator.
//!
//! Unlike `slirc_proto::mode`'s fixed `UserMode` enum, a proxied session's
//! modes are an arbitrary set of single characters handed to us verbatim by
//! the upstream server — we never interpret them, only track and replay
//! them. `ModeSet` is a small ordered set over `char`.

use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModeSet {
    modes: Vec<char>,
}

impl ModeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }

    pub fn contains(&self, c: char) -> bool {
        self.modes.contains(&c)
    }

    /// Apply a `+x`/`-x...` style mode string, e.g. `"+iw"` or `"-w"`.
    /// An unprefixed leading char, or a `+`/`-` with nothing following,
    /// simply flips the current operation for subsequent characters.
    pub fn accumulate(&mut self, change: &str) {
        let mut adding = true;
        for c in change.chars() {
            match c {
                '+' => adding = true,
                '-' => adding = false,
                _ if adding => {
                    if !self.modes.contains(&c) {
                        self.modes.push(c);
                    }
                }
                _ => {
                    self.modes.retain(|&m| m != c);
                }
            }
        }
    }

    /// Render as a `-xyz` string for the `MODE nick -xyz` drop-on-detach
    /// command. Empty set renders as `None`.
    pub fn as_drop_string(&self) -> Option<String> {
        if self.modes.is_empty() {
            None
        } else {
            Some(format!("-{}", self.modes.iter().collect::<String>()))
        }
    }
}

impl fmt::Display for ModeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modes.is_empty() {
            Ok(())
        } else {
            write!(f, "+{}", self.modes.iter().collect::<String>())
        }
    }
}
