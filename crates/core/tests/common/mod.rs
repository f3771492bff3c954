//! Common test utilities for the process-level integration tests.
//!
//! This module provides shared functionality including:
//! - Step and supervisor fixtures driven by `sh -c` scripts
//! - Assertions over statuses, events and log lines
//! - Polling helpers for background runs

pub mod assertions;
pub mod fixtures;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;
