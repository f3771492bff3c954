//! # rp-core
//!
//! Pipeline runner and process supervision for reel-panel.
//!
//! This crate provides:
//! - Fixed-capacity log and event stores with timestamp cursors
//! - A process supervisor with signal-based pause, resume and abort
//! - The pipeline engine running the four video-generation steps in order
//! - Configuration loading, the credential file store and output listings
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading and management
//! - [`credentials`]: Allow-listed credential variables
//! - [`engine`]: Pipeline execution engine
//! - [`media`]: Output listings and media path resolution
//! - [`state`]: Run state and the shared StateManager
//! - [`store`]: Log and event ring buffers
//! - [`supervisor`]: Child process supervision

pub mod config;
pub mod credentials;
pub mod engine;
pub mod media;
pub mod state;
pub mod store;
pub mod supervisor;
