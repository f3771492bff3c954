//! Error types for process supervision.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that end a supervised step run.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// The step program could not be started.
    #[error("Failed to spawn '{program}': {source}")]
    Spawn {
        program: PathBuf,
        source: std::io::Error,
    },

    /// Another child process is already active.
    #[error("A step process is already running (pid {0})")]
    Busy(u32),

    /// Waiting for the child failed.
    #[error("I/O error while supervising child: {0}")]
    Io(#[from] std::io::Error),

    /// The child exited with a non-zero status or was killed by a signal.
    #[error("{}", describe_exit(*.code, *.signal))]
    ProcessExit {
        code: Option<i32>,
        signal: Option<i32>,
    },
}

fn describe_exit(code: Option<i32>, signal: Option<i32>) -> String {
    match (code, signal) {
        (Some(code), _) => format!("Process exited with code {code}"),
        (None, Some(signal)) => format!("Process terminated by signal {signal}"),
        (None, None) => "Process exited abnormally".to_string(),
    }
}

/// Errors from pause/resume/abort requests.
///
/// An invalid state (no child, already paused, ...) is not an error; those
/// calls return `Ok(false)` instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ControlError {
    /// The host platform cannot deliver the requested process-state signal.
    #[error("{0} is not supported on this platform")]
    Unsupported(&'static str),

    /// The target process group no longer exists.
    #[error("Process group {0} has already exited")]
    ProcessGone(u32),

    /// The OS rejected the signal.
    #[error("Failed to deliver {signal} to pid {pid}: {reason}")]
    Signal {
        signal: &'static str,
        pid: u32,
        reason: String,
    },
}

/// Type alias for Result with SupervisorError.
pub type SupervisorResult<T> = Result<T, SupervisorError>;
