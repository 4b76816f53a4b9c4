//! Mock implementations for testing

pub mod progress;

pub use progress::{ProgressCall, RecordingProgress};
