//! Pipeline step models.
//!
//! This module defines the structures describing the fixed, ordered list of
//! steps the control panel drives and their per-run status.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Lifecycle status of a single pipeline step.
///
/// During a run a step moves through:
/// Idle -> Running -> Success | Error
///
/// A terminal status is never revisited within the same run. Every step is
/// reset to Idle when a new pipeline run starts.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, TS)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    /// Step has not been attempted in the current run.
    #[default]
    Idle,

    /// The step's external program is currently executing.
    Running,

    /// The step's program exited with status code 0.
    Success,

    /// The step's program exited non-zero, could not be spawned, or was aborted.
    Error,
}

impl StepStatus {
    /// Whether this status ends the step's lifecycle for the current run.
    pub fn is_terminal(self) -> bool {
        matches!(self, StepStatus::Success | StepStatus::Error)
    }
}

/// Represents one stage of the pipeline as seen by clients.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct Step {
    /// Stable, zero-based identifier. Steps run in ascending id order.
    pub id: usize,

    /// Human-readable name shown in the UI and in event texts.
    pub name: String,

    /// Current status.
    pub status: StepStatus,
}

impl Step {
    /// Create an idle step.
    pub fn new(id: usize, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            status: StepStatus::Idle,
        }
    }
}
