//! Log-friendly rendering
//!
//! Appends one plain line per refresh and never moves the cursor, so output
//! redirected to a file stays a readable append-only log.

use super::format::status_line;
use super::{Renderer, Sink, Snapshot};
use crate::options::ProgressOptions;

#[derive(Debug)]
pub struct LogLineRenderer {
    sink: Sink,
    options: ProgressOptions,
}

impl LogLineRenderer {
    pub fn new(sink: Sink, options: &ProgressOptions) -> Self {
        Self {
            sink,
            options: options.clone(),
        }
    }
}

impl Renderer for LogLineRenderer {
    fn render(&mut self, snapshot: &Snapshot) {
        let line = status_line(snapshot, &self.options, false);
        self.sink.write_line(&line);
    }

    fn finish(&mut self, snapshot: &Snapshot) {
        let line = status_line(snapshot, &self.options, true);
        self.sink.write_line(&line);
    }
}
