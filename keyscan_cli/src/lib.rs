//! keyscan CLI library
//!
//! Exposes the configuration layer and the scan driver so integration tests
//! can exercise them without spawning the binary.

pub mod config;
pub mod scan;
