//! JSON-lines rendering for machine consumers

use super::{Renderer, Sink, Snapshot};
use crate::options::ProgressOptions;
use log::warn;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
enum EventKind {
    Progress,
    Done,
}

#[derive(Debug, Serialize)]
struct ProgressEvent<'a> {
    event: EventKind,
    message: &'a str,
    completed: u64,
    total: Option<u64>,
    elapsed_ms: u64,
}

/// Appends one JSON object per refresh
#[derive(Debug)]
pub struct JsonRenderer {
    sink: Sink,
    message: String,
}

impl JsonRenderer {
    pub fn new(sink: Sink, options: &ProgressOptions) -> Self {
        Self {
            sink,
            message: options.message.clone(),
        }
    }

    fn emit(&mut self, event: EventKind, snapshot: &Snapshot) {
        let event = ProgressEvent {
            event,
            message: &self.message,
            completed: snapshot.completed,
            total: snapshot.total,
            elapsed_ms: u64::try_from(snapshot.elapsed.as_millis()).unwrap_or(u64::MAX),
        };
        match serde_json::to_string(&event) {
            Ok(line) => self.sink.write_line(&line),
            Err(e) => warn!("Failed to encode progress event: {e}"),
        }
    }
}

impl Renderer for JsonRenderer {
    fn render(&mut self, snapshot: &Snapshot) {
        self.emit(EventKind::Progress, snapshot);
    }

    fn finish(&mut self, snapshot: &Snapshot) {
        self.emit(EventKind::Done, snapshot);
    }
}
