//! Progress session
//!
//! A [`ProgressSession`] owns one tracker bound to an output sink. The caller
//! drives it with `start`, one `increment` per unit of work and a final
//! `stop`; a background tokio task redraws the tracker on a timer from a
//! shared atomic counter. Whether the tracker is drawn as an interactive bar
//! or as appended log lines is decided once, when the session is created.

use crate::options::ProgressOptions;
use crate::progress::ProgressWriter;
use crate::render::{self, RenderSettings, Renderer, Snapshot};
use crate::terminal::{StdoutProbe, TerminalProbe};
use async_trait::async_trait;
use log::{debug, trace, warn};
use std::fmt;
use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Lifecycle of a progress session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SessionState {
    Created = 0,
    Running = 1,
    Stopped = 2,
}

impl SessionState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Created,
            1 => Self::Running,
            _ => Self::Stopped,
        }
    }
}

/// Counter and lifecycle shared between the caller and the render task
#[derive(Debug)]
struct Shared {
    completed: AtomicU64,
    state: AtomicU8,
}

impl Shared {
    fn new() -> Self {
        Self {
            completed: AtomicU64::new(0),
            state: AtomicU8::new(SessionState::Created as u8),
        }
    }

    fn state(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: SessionState) {
        self.state.store(state as u8, Ordering::Release);
    }

    fn completed(&self) -> u64 {
        self.completed.load(Ordering::Acquire)
    }

    fn increment(&self) {
        match self.state() {
            SessionState::Running => {
                self.completed.fetch_add(1, Ordering::AcqRel);
            }
            state => trace!("Ignoring progress increment while {state:?}"),
        }
    }
}

/// Cloneable handle for incrementing a session from other threads or tasks
#[derive(Debug, Clone)]
pub struct ProgressHandle {
    shared: Arc<Shared>,
}

impl ProgressHandle {
    /// Record one completed unit of work; ignored unless the session is running
    pub fn increment(&self) {
        self.shared.increment();
    }

    pub fn completed(&self) -> u64 {
        self.shared.completed()
    }
}

/// Periodic redraw driven by the session's render task
struct RenderLoop {
    renderer: Box<dyn Renderer>,
    shared: Arc<Shared>,
    total: Option<u64>,
    started: Instant,
}

impl RenderLoop {
    fn snapshot(&self) -> Snapshot {
        Snapshot {
            completed: self.shared.completed(),
            total: self.total,
            elapsed: self.started.elapsed(),
        }
    }

    async fn run(mut self, mut stop: oneshot::Receiver<()>, period: Duration) {
        let mut ticker = time::interval_at(self.started + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                // A dropped sender means the session was dropped without stop
                _ = &mut stop => break,
                _ = ticker.tick() => {
                    let snapshot = self.snapshot();
                    self.renderer.render(&snapshot);
                }
            }
        }

        self.finish();
    }

    fn finish(mut self) {
        let snapshot = self.snapshot();
        debug!(
            "Progress finished: {} of {:?} after {:?}",
            snapshot.completed, snapshot.total, snapshot.elapsed
        );
        self.renderer.finish(&snapshot);
    }
}

enum Worker {
    Background {
        stop: oneshot::Sender<()>,
        task: JoinHandle<()>,
    },
    /// No runtime was available at start; only the final render happens
    Inline(RenderLoop),
}

/// One progress tracker bound to an output sink
pub struct ProgressSession {
    options: ProgressOptions,
    settings: RenderSettings,
    shared: Arc<Shared>,
    sink: Option<Box<dyn Write + Send>>,
    total: Option<u64>,
    worker: Option<Worker>,
}

impl ProgressSession {
    /// Create a session writing to `sink`, probing standard output for a terminal
    pub fn new(sink: impl Write + Send + 'static) -> Self {
        Self::with_probe(sink, ProgressOptions::default(), &StdoutProbe)
    }

    /// Create a session with explicit options and terminal probe
    ///
    /// The probe is consulted here and never again.
    pub fn with_probe(
        sink: impl Write + Send + 'static,
        options: ProgressOptions,
        probe: &dyn TerminalProbe,
    ) -> Self {
        let settings = RenderSettings::select(&options, probe);
        Self {
            options,
            settings,
            shared: Arc::new(Shared::new()),
            sink: Some(Box::new(sink)),
            total: None,
            worker: None,
        }
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    pub fn options(&self) -> &ProgressOptions {
        &self.options
    }

    pub fn state(&self) -> SessionState {
        self.shared.state()
    }

    /// Units completed so far
    pub fn completed(&self) -> u64 {
        self.shared.completed()
    }

    /// Declared total, `None` when unknown or not yet started
    pub fn total(&self) -> Option<u64> {
        self.total
    }

    /// Handle for incrementing from other threads or tasks
    pub fn handle(&self) -> ProgressHandle {
        ProgressHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Begin tracking and start the background renderer
    ///
    /// A `total` of zero means unknown. Returns without waiting for any
    /// output; a second call is ignored.
    pub fn start(&mut self, total: u64) {
        if self.state() != SessionState::Created {
            warn!("Progress session already started, ignoring start({total})");
            return;
        }
        let Some(sink) = self.sink.take() else {
            return;
        };

        self.total = (total > 0).then_some(total);
        let renderer = render::build_renderer(&self.settings, &self.options, sink, self.total);
        let render_loop = RenderLoop {
            renderer,
            shared: Arc::clone(&self.shared),
            total: self.total,
            started: Instant::now(),
        };
        self.shared.set_state(SessionState::Running);

        let worker = match Handle::try_current() {
            Ok(runtime) => {
                let (stop, stop_rx) = oneshot::channel();
                let task = runtime.spawn(render_loop.run(stop_rx, self.settings.refresh_interval));
                Worker::Background { stop, task }
            }
            Err(_) => {
                debug!("No async runtime available, progress will render once at stop");
                Worker::Inline(render_loop)
            }
        };
        self.worker = Some(worker);
        debug!("Started progress '{}' with total {:?}", self.options.message, self.total);
    }

    /// Record one completed unit of work
    pub fn increment(&self) {
        self.shared.increment();
    }

    /// Render the finished tracker and stop the background renderer
    ///
    /// Returns once the final render has been written; nothing reaches the
    /// sink afterwards. Calling it again is a no-op.
    pub async fn stop(&mut self) {
        match self.state() {
            SessionState::Stopped => {
                trace!("Progress session already stopped");
                return;
            }
            SessionState::Created => {
                debug!("Progress session stopped before it was started");
                self.shared.set_state(SessionState::Stopped);
                self.sink = None;
                return;
            }
            SessionState::Running => {}
        }

        self.shared.set_state(SessionState::Stopped);
        match self.worker.take() {
            Some(Worker::Background { stop, task }) => {
                // The task may already be gone if it panicked
                let _ = stop.send(());
                if let Err(e) = task.await {
                    warn!("Progress renderer task failed: {e}");
                }
            }
            Some(Worker::Inline(render_loop)) => render_loop.finish(),
            None => {}
        }
    }
}

impl Drop for ProgressSession {
    fn drop(&mut self) {
        // Background workers finish on their own once the stop sender is dropped
        if let Some(Worker::Inline(render_loop)) = self.worker.take() {
            self.shared.set_state(SessionState::Stopped);
            render_loop.finish();
        }
    }
}

impl fmt::Debug for ProgressSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressSession")
            .field("settings", &self.settings)
            .field("state", &self.state())
            .field("completed", &self.completed())
            .field("total", &self.total)
            .finish()
    }
}

#[async_trait]
impl ProgressWriter for ProgressSession {
    fn start(&mut self, total: u64) {
        ProgressSession::start(self, total);
    }

    fn increment(&self) {
        ProgressSession::increment(self);
    }

    async fn stop(&mut self) {
        ProgressSession::stop(self).await;
    }
}
