//! keyscan core library
//!
//! Progress reporting for long-running scans: a [`ProgressSession`] renders a
//! live bar when attached to a terminal and periodic plain lines when its
//! output is redirected, behind the small [`ProgressWriter`] contract.

pub mod error;
pub mod options;
pub mod progress;
pub mod render;
pub mod session;
pub mod terminal;

// Re-export main types
pub use error::{Error, Result};
pub use options::{DEFAULT_MESSAGE, ProgressMode, ProgressOptions};
pub use progress::{NullProgress, ProgressWriter};
pub use render::{RenderMode, RenderSettings, Snapshot};
pub use session::{ProgressHandle, ProgressSession, SessionState};
pub use terminal::{FixedProbe, StdoutProbe, TerminalProbe};
