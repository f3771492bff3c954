//! Run state and its coordination.
//!
//! This module provides:
//! - Run state transitions emitting lifecycle events
//! - StateManager, the context object shared by request handlers

pub mod manager;
pub mod run;
