//! Test utilities for keyscan
//!
//! This crate provides a capturing output sink and mock progress writers
//! for testing code that reports progress.

pub mod mocks;
pub mod sink;

// Re-export commonly used types
pub use mocks::{ProgressCall, RecordingProgress};
pub use sink::SharedBuffer;
