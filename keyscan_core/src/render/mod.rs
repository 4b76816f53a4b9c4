//! Progress rendering
//!
//! A session picks its [`RenderSettings`] once, at construction, and hands
//! its sink to one [`Renderer`] when it starts. Renderers never report
//! errors to the caller; a failing sink is logged once and then ignored.

pub mod bar;
pub mod format;
pub mod json;
pub mod log_line;

use crate::options::{ProgressMode, ProgressOptions};
use crate::terminal::{DEFAULT_TERMINAL_WIDTH, TerminalProbe};
use log::{debug, warn};
use std::fmt;
use std::io::Write;
use std::time::Duration;

pub use bar::BarRenderer;
pub use json::JsonRenderer;
pub use log_line::LogLineRenderer;

/// How rendered output reaches the sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Single line redrawn in place with cursor control
    Interactive,
    /// One appended plain-text line per refresh
    LogFriendly,
    /// One appended JSON object per refresh
    JsonLines,
}

/// Rendering configuration fixed for the lifetime of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderSettings {
    pub mode: RenderMode,
    pub refresh_interval: Duration,
    pub color: bool,
    /// Columns available to the interactive bar
    pub width: u16,
}

impl RenderSettings {
    /// Choose the rendering configuration for a session
    ///
    /// With [`ProgressMode::Auto`] the probe decides between a fast, coloured
    /// redraw-in-place bar and slow, colourless appended lines.
    pub fn select(options: &ProgressOptions, probe: &dyn TerminalProbe) -> Self {
        let settings = match options.mode {
            ProgressMode::Auto if probe.is_interactive() => Self::interactive(options, probe),
            ProgressMode::Auto | ProgressMode::Log => Self::appending(RenderMode::LogFriendly, options),
            ProgressMode::Bar => Self::interactive(options, probe),
            ProgressMode::Json => Self::appending(RenderMode::JsonLines, options),
        };
        debug!(
            "Selected {:?} progress rendering (refresh every {:?})",
            settings.mode, settings.refresh_interval
        );
        settings
    }

    fn interactive(options: &ProgressOptions, probe: &dyn TerminalProbe) -> Self {
        Self {
            mode: RenderMode::Interactive,
            refresh_interval: options.interactive_refresh(),
            color: true,
            width: probe.width().unwrap_or(DEFAULT_TERMINAL_WIDTH),
        }
    }

    fn appending(mode: RenderMode, options: &ProgressOptions) -> Self {
        Self {
            mode,
            refresh_interval: options.log_refresh(),
            color: false,
            width: DEFAULT_TERMINAL_WIDTH,
        }
    }

    /// Whether output overwrites the current line instead of appending
    pub fn redraws_in_place(&self) -> bool {
        self.mode == RenderMode::Interactive
    }
}

/// Point-in-time view of a tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub completed: u64,
    /// `None` when the total is unknown
    pub total: Option<u64>,
    pub elapsed: Duration,
}

impl Snapshot {
    /// Completed share of the total, unclamped
    pub fn fraction(&self) -> Option<f64> {
        self.total
            .filter(|total| *total > 0)
            .map(|total| self.completed as f64 / total as f64)
    }

    /// Estimated time remaining, extrapolated from the average rate so far
    ///
    /// `None` when no estimate is possible or it does not fit a [`Duration`].
    pub fn eta(&self) -> Option<Duration> {
        let total = self.total?;
        if self.completed == 0 || self.completed >= total || self.elapsed.is_zero() {
            return None;
        }
        let per_unit = self.elapsed.as_secs_f64() / self.completed as f64;
        Duration::try_from_secs_f64(per_unit * (total - self.completed) as f64).ok()
    }
}

/// Draws snapshots of one tracker to a sink
pub trait Renderer: Send {
    /// Periodic redraw
    fn render(&mut self, snapshot: &Snapshot);

    /// Final redraw marking the tracker finished
    fn finish(&mut self, snapshot: &Snapshot);
}

/// Build the renderer for the selected mode
pub fn build_renderer(
    settings: &RenderSettings,
    options: &ProgressOptions,
    sink: Box<dyn Write + Send>,
    total: Option<u64>,
) -> Box<dyn Renderer> {
    let sink = Sink::new(sink);
    match settings.mode {
        RenderMode::Interactive => Box::new(BarRenderer::new(sink, settings, options, total)),
        RenderMode::LogFriendly => Box::new(LogLineRenderer::new(sink, options)),
        RenderMode::JsonLines => Box::new(JsonRenderer::new(sink, options)),
    }
}

/// Output stream owned by a renderer
///
/// The first write failure (e.g. a closed pipe) is logged and every later
/// write is dropped.
pub struct Sink {
    inner: Box<dyn Write + Send>,
    failed: bool,
}

impl Sink {
    pub fn new(inner: Box<dyn Write + Send>) -> Self {
        Self {
            inner,
            failed: false,
        }
    }

    pub fn write_str(&mut self, s: &str) {
        if self.failed {
            return;
        }
        let result = self
            .inner
            .write_all(s.as_bytes())
            .and_then(|()| self.inner.flush());
        if let Err(e) = result {
            warn!("Progress output failed, suppressing further updates: {e}");
            self.failed = true;
        }
    }

    pub fn write_line(&mut self, line: &str) {
        let mut buf = String::with_capacity(line.len() + 1);
        buf.push_str(line);
        buf.push('\n');
        self.write_str(&buf);
    }

    pub fn has_failed(&self) -> bool {
        self.failed
    }
}

impl fmt::Debug for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sink").field("failed", &self.failed).finish()
    }
}
