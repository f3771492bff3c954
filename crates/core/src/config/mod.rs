//! Configuration loading and management.
//!
//! Settings are resolved in layers: built-in defaults, then an optional
//! `reel-panel.toml` in the project root, then `REEL_*` environment
//! variables. The binary applies its command-line flags last.

pub mod error;
pub mod loader;
pub mod models;
