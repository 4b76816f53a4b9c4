//! Progress reporting abstractions
//!
//! This module provides a small trait for reporting progress of a
//! long-running operation, so callers can switch between a rendered
//! [`ProgressSession`](crate::session::ProgressSession), a silent
//! [`NullProgress`] or a test double without changing the work loop.

use async_trait::async_trait;

/// Core trait for progress reporting
///
/// Callers start once, increment once per unit of work and stop exactly once
/// afterwards, whether the work succeeded or not.
#[async_trait]
pub trait ProgressWriter: Send {
    /// Begin tracking; a `total` of zero means the total is unknown
    fn start(&mut self, total: u64);

    /// Record one completed unit of work
    fn increment(&self);

    /// Mark the tracker finished and release any rendering resources
    async fn stop(&mut self);
}

/// Null implementation for when no progress is needed
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProgress;

#[async_trait]
impl ProgressWriter for NullProgress {
    fn start(&mut self, _total: u64) {
        // No-op
    }

    fn increment(&self) {
        // No-op
    }

    async fn stop(&mut self) {
        // No-op
    }
}
