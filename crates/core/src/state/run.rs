//! Run state machine implementation.
//!
//! This module provides functions for moving a [`RunState`] through a
//! pipeline or single-step run, emitting a lifecycle event for every
//! transition.

use crate::engine::error::{EngineError, EngineResult};
use crate::store::EventStore;
use rp_protocol::{EventKind, Step, StepStatus};
use std::time::Duration;
use uuid::Uuid;

/// Mutable state of the current (or last) run.
///
/// Invariant: at most one step is `Running`, and only while `running` is true.
#[derive(Debug, Clone)]
pub struct RunState {
    /// Whether a run is in progress.
    pub running: bool,

    /// Identifier of the current or most recent run.
    pub run_id: Option<Uuid>,

    /// All steps, ordered by id.
    pub steps: Vec<Step>,
}

impl RunState {
    /// Create an idle state for the given steps.
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            running: false,
            run_id: None,
            steps,
        }
    }

    /// Status of step `id`, if it exists.
    pub fn status(&self, id: usize) -> Option<StepStatus> {
        self.steps.iter().find(|s| s.id == id).map(|s| s.status)
    }

    fn step_mut(&mut self, id: usize) -> Option<&mut Step> {
        self.steps.iter_mut().find(|s| s.id == id)
    }

    fn step_name(&self, id: usize) -> String {
        self.steps
            .iter()
            .find(|s| s.id == id)
            .map_or_else(|| format!("#{id}"), |s| s.name.clone())
    }
}

/// Begin a full pipeline run and emit the `start` event.
///
/// Every step is reset to `Idle`.
///
/// # Errors
///
/// `EngineError::Conflict` if a run is already in progress; the state is
/// left untouched.
pub async fn begin_pipeline(state: &mut RunState, events: &EventStore) -> EngineResult<Uuid> {
    if state.running {
        return Err(EngineError::Conflict);
    }
    let run_id = Uuid::new_v4();
    state.running = true;
    state.run_id = Some(run_id);
    for step in &mut state.steps {
        step.status = StepStatus::Idle;
    }
    events.push(EventKind::Start, "Pipeline started", None).await;
    Ok(run_id)
}

/// Begin a run of step `id` alone.
///
/// Only that step's status will change; its neighbours keep theirs.
///
/// # Errors
///
/// - `EngineError::Conflict` if a run is already in progress
/// - `EngineError::UnknownStep` if no step has this id
/// - `EngineError::StepNotRunnable` if the step is running or succeeded
pub fn begin_single_step(state: &mut RunState, id: usize) -> EngineResult<Uuid> {
    if state.running {
        return Err(EngineError::Conflict);
    }
    match state.status(id) {
        None => return Err(EngineError::UnknownStep(id)),
        Some(StepStatus::Running) => {
            return Err(EngineError::StepNotRunnable {
                id,
                status: "running",
            })
        }
        Some(StepStatus::Success) => {
            return Err(EngineError::StepNotRunnable {
                id,
                status: "success",
            })
        }
        Some(StepStatus::Idle | StepStatus::Error) => {}
    }
    let run_id = Uuid::new_v4();
    state.running = true;
    state.run_id = Some(run_id);
    Ok(run_id)
}

/// Mark step `id` as running and emit a `step` event.
pub async fn start_step(state: &mut RunState, events: &EventStore, id: usize) {
    if let Some(step) = state.step_mut(id) {
        step.status = StepStatus::Running;
    }
    let text = format!("{} started", state.step_name(id));
    events.push(EventKind::Step, text, Some(id)).await;
}

/// Mark step `id` as succeeded and emit a `success` event with its duration.
pub async fn complete_step(state: &mut RunState, events: &EventStore, id: usize, elapsed: Duration) {
    if let Some(step) = state.step_mut(id) {
        step.status = StepStatus::Success;
    }
    let secs = elapsed.as_secs_f64().round() as u64;
    let text = format!("{} finished ({secs}s)", state.step_name(id));
    events.push(EventKind::Success, text, Some(id)).await;
}

/// Mark step `id` as failed and emit an `error` event naming it.
pub async fn fail_step(state: &mut RunState, events: &EventStore, id: usize) {
    if let Some(step) = state.step_mut(id) {
        step.status = StepStatus::Error;
    }
    let text = format!("Failed at step \"{}\"", state.step_name(id));
    events.push(EventKind::Error, text, Some(id)).await;
}

/// End the run and emit the `done` event.
pub async fn finish_run(state: &mut RunState, events: &EventStore, text: &str) {
    state.running = false;
    events.push(EventKind::Done, text, None).await;
}
