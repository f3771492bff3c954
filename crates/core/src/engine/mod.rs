//! Pipeline execution engine.
//!
//! The PipelineEngine runs the fixed step list strictly in ascending id
//! order, one child process at a time, and converts each step's outcome into
//! run state and lifecycle events. The first failure stops the run; later
//! steps are never attempted.

pub mod error;
pub mod launcher;
pub mod steps;

use crate::state::run::{
    begin_pipeline, begin_single_step, complete_step, fail_step, finish_run, start_step, RunState,
};
use crate::store::EventStore;
use error::EngineResult;
use launcher::StepLauncher;
use rp_protocol::Step;
use std::sync::Arc;
use std::time::Instant;
use steps::StepDefinition;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every attempted step succeeded.
    Succeeded,
    /// The given step failed (non-zero exit, spawn failure or abort).
    Failed { step_id: usize },
}

/// The pipeline execution engine.
///
/// Runs are split in two phases so a caller can reject a conflicting request
/// synchronously and execute the run in the background:
/// 1. `begin_*` validates and records the start of a run
/// 2. `execute_*` drives the step processes and always finalizes the run
pub struct PipelineEngine {
    definitions: Vec<StepDefinition>,
    launcher: Arc<dyn StepLauncher>,
    state: Mutex<RunState>,
    events: Arc<EventStore>,
}

impl PipelineEngine {
    /// Create a new PipelineEngine.
    ///
    /// # Arguments
    ///
    /// * `definitions` - Steps in execution order; ids must equal positions
    /// * `launcher` - Executes a single step (the process supervisor in production)
    /// * `events` - Store receiving lifecycle events
    pub fn new(
        definitions: Vec<StepDefinition>,
        launcher: Arc<dyn StepLauncher>,
        events: Arc<EventStore>,
    ) -> Self {
        let steps = definitions.iter().map(StepDefinition::to_step).collect();
        Self {
            definitions,
            launcher,
            state: Mutex::new(RunState::new(steps)),
            events,
        }
    }

    /// Validate and record the start of a full pipeline run.
    ///
    /// # Errors
    ///
    /// `EngineError::Conflict` if a run is in progress.
    pub async fn begin_pipeline(&self) -> EngineResult<Uuid> {
        let mut state = self.state.lock().await;
        let run_id = begin_pipeline(&mut state, &self.events).await?;
        info!(%run_id, "pipeline run started");
        Ok(run_id)
    }

    /// Execute every step in order, stopping at the first failure.
    ///
    /// Must follow a successful [`begin_pipeline`](Self::begin_pipeline).
    /// The run is finalized (`running` cleared, `done` emitted) on every path.
    pub async fn execute_pipeline(&self) -> RunOutcome {
        let mut outcome = RunOutcome::Succeeded;
        for definition in &self.definitions {
            if !self.execute_step_inner(definition).await {
                outcome = RunOutcome::Failed {
                    step_id: definition.id,
                };
                break;
            }
        }

        let mut state = self.state.lock().await;
        finish_run(&mut state, &self.events, "Pipeline finished").await;
        info!(run_id = ?state.run_id, ?outcome, "pipeline run finished");
        outcome
    }

    /// Begin and execute a full pipeline run.
    pub async fn run(&self) -> EngineResult<RunOutcome> {
        self.begin_pipeline().await?;
        Ok(self.execute_pipeline().await)
    }

    /// Validate and record the start of a single-step run.
    ///
    /// # Errors
    ///
    /// See [`begin_single_step`].
    pub async fn begin_step(&self, id: usize) -> EngineResult<Uuid> {
        let mut state = self.state.lock().await;
        let run_id = begin_single_step(&mut state, id)?;
        info!(%run_id, step = id, "single step run started");
        Ok(run_id)
    }

    /// Execute step `id` alone; only its status changes.
    ///
    /// Must follow a successful [`begin_step`](Self::begin_step).
    pub async fn execute_step(&self, id: usize) -> RunOutcome {
        let succeeded = match self.definitions.iter().find(|d| d.id == id) {
            Some(definition) => self.execute_step_inner(definition).await,
            None => false,
        };
        let outcome = if succeeded {
            RunOutcome::Succeeded
        } else {
            RunOutcome::Failed { step_id: id }
        };

        let mut state = self.state.lock().await;
        finish_run(&mut state, &self.events, "Step finished").await;
        outcome
    }

    /// Begin and execute a single-step run.
    pub async fn run_step(&self, id: usize) -> EngineResult<RunOutcome> {
        self.begin_step(id).await?;
        Ok(self.execute_step(id).await)
    }

    /// Run one step through the launcher, recording the transition.
    ///
    /// Returns whether the step succeeded.
    async fn execute_step_inner(&self, definition: &StepDefinition) -> bool {
        start_step(&mut *self.state.lock().await, &self.events, definition.id).await;
        info!(step = definition.id, name = %definition.name, "step started");

        let started = Instant::now();
        let result = self.launcher.launch(definition).await;

        let mut state = self.state.lock().await;
        match result {
            Ok(()) => {
                complete_step(&mut state, &self.events, definition.id, started.elapsed()).await;
                info!(step = definition.id, elapsed = ?started.elapsed(), "step succeeded");
                true
            }
            Err(e) => {
                fail_step(&mut state, &self.events, definition.id).await;
                warn!(step = definition.id, "step failed: {e}");
                false
            }
        }
    }

    /// Current steps and their statuses.
    pub async fn steps(&self) -> Vec<Step> {
        self.state.lock().await.steps.clone()
    }

    /// Whether a run is in progress.
    pub async fn is_running(&self) -> bool {
        self.state.lock().await.running
    }

    /// Identifier of the current or most recent run.
    pub async fn run_id(&self) -> Option<Uuid> {
        self.state.lock().await.run_id
    }

    /// The configured step definitions.
    pub fn definitions(&self) -> &[StepDefinition] {
        &self.definitions
    }
}
