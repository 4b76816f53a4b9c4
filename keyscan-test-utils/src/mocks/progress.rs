//! Mock progress writer that records every call

use async_trait::async_trait;
use keyscan_core::ProgressWriter;
use std::sync::{Arc, Mutex};

/// A call received by [`RecordingProgress`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressCall {
    Start(u64),
    Increment,
    Stop,
}

/// Progress writer that records calls instead of rendering
///
/// Clones share the same call log, so a test can keep one clone and hand
/// another to the code under test.
#[derive(Debug, Clone, Default)]
pub struct RecordingProgress {
    calls: Arc<Mutex<Vec<ProgressCall>>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// All calls in the order received
    pub fn calls(&self) -> Vec<ProgressCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Total passed to the first `start`, if any
    pub fn started_with(&self) -> Option<u64> {
        self.calls().into_iter().find_map(|call| match call {
            ProgressCall::Start(total) => Some(total),
            _ => None,
        })
    }

    pub fn increments(&self) -> usize {
        self.count(ProgressCall::Increment)
    }

    pub fn stops(&self) -> usize {
        self.count(ProgressCall::Stop)
    }

    fn count(&self, wanted: ProgressCall) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| **call == wanted)
            .count()
    }

    fn record(&self, call: ProgressCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ProgressWriter for RecordingProgress {
    fn start(&mut self, total: u64) {
        self.record(ProgressCall::Start(total));
    }

    fn increment(&self) {
        self.record(ProgressCall::Increment);
    }

    async fn stop(&mut self) {
        self.record(ProgressCall::Stop);
    }
}
