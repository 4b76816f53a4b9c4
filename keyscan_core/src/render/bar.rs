//! Interactive progress bar
//!
//! Draws an indicatif bar into the session's sink through a [`TermLike`]
//! adapter, so the bar can target any writer rather than only the process's
//! own terminal. Draws happen only when the render loop pushes a new
//! snapshot; indicatif's own steady tick is never enabled.

use super::{RenderSettings, Renderer, Sink, Snapshot};
use crate::options::ProgressOptions;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressState, ProgressStyle, TermLike};
use log::warn;
use std::fmt::{self, Write as _};
use std::io;
use std::sync::Mutex;

/// Redraws a single bar in place
pub struct BarRenderer {
    bar: ProgressBar,
}

impl BarRenderer {
    pub fn new(
        sink: Sink,
        settings: &RenderSettings,
        options: &ProgressOptions,
        total: Option<u64>,
    ) -> Self {
        let millis = settings.refresh_interval.as_millis().max(1);
        let hz = (1000 / millis).clamp(1, u128::from(u8::MAX)) as u8;
        let term = SinkTerm::new(sink, settings.width);
        let target = ProgressDrawTarget::term_like_with_hz(Box::new(term), hz);

        let bar = ProgressBar::with_draw_target(total, target);
        bar.set_style(bar_style(options, total.is_some(), settings.color));
        bar.set_message(options.message.clone());
        Self { bar }
    }
}

impl Renderer for BarRenderer {
    fn render(&mut self, snapshot: &Snapshot) {
        self.bar.set_position(snapshot.completed);
        if snapshot.total.is_none() {
            self.bar.tick();
        }
    }

    fn finish(&mut self, snapshot: &Snapshot) {
        // `finish` would jump to the declared length; keep the real count
        self.bar.set_position(snapshot.completed);
        self.bar.abandon();
    }
}

/// Build the bar style; unknown totals get a spinner with a plain count
fn bar_style(options: &ProgressOptions, known_total: bool, color: bool) -> ProgressStyle {
    let msg_width = options.message_width;
    let bar_width = options.bar_width;
    let template = match (known_total, color) {
        (true, true) => format!(
            "{{msg:<{msg_width}}} [{{bar:{bar_width}.cyan/blue}}] {{percent1}} {{pos}}/{{len}} [{{elapsed_precise}}] ETA {{eta}}"
        ),
        (true, false) => format!(
            "{{msg:<{msg_width}}} [{{bar:{bar_width}}}] {{percent1}} {{pos}}/{{len}} [{{elapsed_precise}}] ETA {{eta}}"
        ),
        (false, true) => format!("{{msg:<{msg_width}}} {{spinner:.green}} {{pos}} [{{elapsed_precise}}]"),
        (false, false) => format!("{{msg:<{msg_width}}} {{spinner}} {{pos}} [{{elapsed_precise}}]"),
    };

    match ProgressStyle::with_template(&template) {
        Ok(style) => style
            .with_key("percent1", |state: &ProgressState, w: &mut dyn fmt::Write| {
                // Unlike `ProgressState::fraction`, not capped at 100%
                let percent = match state.len() {
                    Some(len) if len > 0 => state.pos() as f64 / len as f64 * 100.0,
                    _ => 0.0,
                };
                let _ = write!(w, "{percent:4.1}%");
            })
            .progress_chars("#>-"),
        Err(e) => {
            warn!("Invalid progress template, using the default bar: {e}");
            ProgressStyle::default_bar()
        }
    }
}

/// [`TermLike`] adapter emitting ANSI cursor control into a [`Sink`]
struct SinkTerm {
    sink: Mutex<Sink>,
    width: u16,
}

impl SinkTerm {
    fn new(sink: Sink, width: u16) -> Self {
        Self {
            sink: Mutex::new(sink),
            width,
        }
    }

    fn write(&self, s: &str) -> io::Result<()> {
        // A poisoned lock only means another draw panicked midway
        let mut sink = self.sink.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        sink.write_str(s);
        Ok(())
    }

    fn move_cursor(&self, n: usize, code: char) -> io::Result<()> {
        if n == 0 {
            return Ok(());
        }
        self.write(&format!("\x1b[{n}{code}"))
    }
}

impl fmt::Debug for SinkTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkTerm").field("width", &self.width).finish()
    }
}

impl TermLike for SinkTerm {
    fn width(&self) -> u16 {
        self.width
    }

    fn height(&self) -> u16 {
        20
    }

    fn move_cursor_up(&self, n: usize) -> io::Result<()> {
        self.move_cursor(n, 'A')
    }

    fn move_cursor_down(&self, n: usize) -> io::Result<()> {
        self.move_cursor(n, 'B')
    }

    fn move_cursor_right(&self, n: usize) -> io::Result<()> {
        self.move_cursor(n, 'C')
    }

    fn move_cursor_left(&self, n: usize) -> io::Result<()> {
        self.move_cursor(n, 'D')
    }

    fn write_line(&self, s: &str) -> io::Result<()> {
        self.write(&format!("{s}\n"))
    }

    fn write_str(&self, s: &str) -> io::Result<()> {
        self.write(s)
    }

    fn clear_line(&self) -> io::Result<()> {
        self.write("\r\x1b[2K")
    }

    fn flush(&self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RenderMode;
    use keyscan_test_utils::SharedBuffer;
    use std::time::Duration;

    fn settings() -> RenderSettings {
        RenderSettings {
            mode: RenderMode::Interactive,
            refresh_interval: Duration::from_millis(100),
            color: false,
            width: 200,
        }
    }

    #[test]
    fn test_finished_bar_shows_totals() {
        let buffer = SharedBuffer::new();
        let sink = Sink::new(Box::new(buffer.clone()));
        let mut renderer = BarRenderer::new(sink, &settings(), &ProgressOptions::default(), Some(100));

        let snapshot = Snapshot {
            completed: 100,
            total: Some(100),
            elapsed: Duration::from_secs(1),
        };
        renderer.render(&snapshot);
        renderer.finish(&snapshot);

        let output = buffer.contents();
        assert!(output.contains("Scanning keys"));
        assert!(output.contains("100/100"));
        assert!(output.contains("100.0%"));
    }

    #[test]
    fn test_overshoot_keeps_real_count_and_percent() {
        let buffer = SharedBuffer::new();
        let sink = Sink::new(Box::new(buffer.clone()));
        let mut renderer = BarRenderer::new(sink, &settings(), &ProgressOptions::default(), Some(100));

        renderer.finish(&Snapshot {
            completed: 150,
            total: Some(100),
            elapsed: Duration::from_secs(1),
        });

        let output = buffer.contents();
        assert!(output.contains("150/100"));
        assert!(output.contains("150.0%"));
    }

    #[test]
    fn test_unfinished_total_is_not_filled_on_finish() {
        let buffer = SharedBuffer::new();
        let sink = Sink::new(Box::new(buffer.clone()));
        let mut renderer = BarRenderer::new(sink, &settings(), &ProgressOptions::default(), Some(8));

        renderer.finish(&Snapshot {
            completed: 2,
            total: Some(8),
            elapsed: Duration::from_secs(1),
        });

        let output = buffer.contents();
        assert!(output.contains("2/8"));
        assert!(output.contains("25.0%"));
        assert!(!output.contains("8/8"));
    }

    #[test]
    fn test_unknown_total_uses_spinner_count() {
        let buffer = SharedBuffer::new();
        let sink = Sink::new(Box::new(buffer.clone()));
        let mut renderer = BarRenderer::new(sink, &settings(), &ProgressOptions::default(), None);

        renderer.finish(&Snapshot {
            completed: 42,
            total: None,
            elapsed: Duration::from_secs(1),
        });

        let output = buffer.contents();
        assert!(output.contains("42"));
        assert!(!output.contains('%'));
    }

    #[test]
    fn test_sink_term_cursor_sequences() {
        let buffer = SharedBuffer::new();
        let term = SinkTerm::new(Sink::new(Box::new(buffer.clone())), 80);
        term.move_cursor_up(2).unwrap();
        term.move_cursor_up(0).unwrap();
        term.clear_line().unwrap();
        term.write_line("bar").unwrap();
        assert_eq!(buffer.contents(), "\x1b[2A\r\x1b[2Kbar\n");
    }
}
