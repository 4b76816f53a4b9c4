//! Terminal detection
//!
//! A session asks a [`TerminalProbe`] exactly once, at construction, whether
//! its output is an interactive terminal. Production code uses
//! [`StdoutProbe`]; tests and forced modes use [`FixedProbe`].

use is_terminal::IsTerminal;
use std::io::stdout;

/// Width assumed when the terminal cannot report its size
pub const DEFAULT_TERMINAL_WIDTH: u16 = 80;

/// Answers whether progress output goes to an interactive terminal
pub trait TerminalProbe: Send + Sync {
    /// Whether the output supports cursor control and in-place redraws
    fn is_interactive(&self) -> bool;

    /// Terminal width in columns, if known
    fn width(&self) -> Option<u16> {
        None
    }
}

/// Probes the process's standard output
///
/// `is-terminal` also recognises MSYS and Cygwin pseudo terminals on Windows,
/// which plain console handle checks report as pipes.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutProbe;

impl TerminalProbe for StdoutProbe {
    fn is_interactive(&self) -> bool {
        stdout().is_terminal()
    }

    fn width(&self) -> Option<u16> {
        console::Term::stdout()
            .size_checked()
            .map(|(_rows, columns)| columns)
    }
}

/// Probe with a predetermined answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedProbe {
    interactive: bool,
    width: Option<u16>,
}

impl FixedProbe {
    pub fn interactive() -> Self {
        Self {
            interactive: true,
            width: None,
        }
    }

    pub fn non_interactive() -> Self {
        Self {
            interactive: false,
            width: None,
        }
    }

    /// Report a fixed terminal width
    pub fn with_width(mut self, width: u16) -> Self {
        self.width = Some(width);
        self
    }
}

impl TerminalProbe for FixedProbe {
    fn is_interactive(&self) -> bool {
        self.interactive
    }

    fn width(&self) -> Option<u16> {
        self.width
    }
}
