//! Error types for run requests.

use thiserror::Error;

/// Reasons a pipeline or single-step run request is rejected.
///
/// A rejected request never mutates run state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// A pipeline or single-step run is already in progress.
    #[error("A run is already in progress")]
    Conflict,

    /// No step has this identifier.
    #[error("Unknown step {0}")]
    UnknownStep(usize),

    /// The step is running or already succeeded.
    #[error("Step {id} cannot be run while {status}")]
    StepNotRunnable { id: usize, status: &'static str },
}

/// Type alias for Result with EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
