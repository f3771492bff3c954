//! # rp-protocol
//!
//! Shared data models for reel-panel.
//!
//! This crate defines the structures exchanged between the pipeline core and
//! the HTTP server, and served as JSON to the browser control panel:
//! - Step definitions and statuses
//! - Captured log lines and lifecycle events
//! - API request/response bodies
//!
//! ## Modules
//!
//! - [`step_models`]: Steps and their status
//! - [`event_models`]: Log lines and lifecycle events
//! - [`api_models`]: HTTP API bodies
//!
//! ## Design Principles
//!
//! - Minimal dependencies: serde, ts-rs, uuid
//! - TypeScript generation: all types derive `TS` for the browser client
//! - Independent compilation: no dependencies on other reel-panel crates

pub mod api_models;
pub mod event_models;
pub mod step_models;

// Re-export all public types for convenience
pub use api_models::*;
pub use event_models::*;
pub use step_models::*;
