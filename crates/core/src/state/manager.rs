//! State manager tying the engine, supervisor and stores together.
//!
//! The StateManager is the context object shared by every request handler.
//! It owns one pipeline engine, the process supervisor that runs its steps,
//! the log and event stores, and the credential store whose values are
//! injected into spawned steps.

use async_trait::async_trait;
use crate::config::models::AppConfig;
use crate::credentials::CredentialStore;
use crate::engine::error::EngineResult;
use crate::engine::launcher::StepLauncher;
use crate::engine::steps::{default_steps, StepDefinition};
use crate::engine::{PipelineEngine, RunOutcome};
use crate::media::list_outputs;
use crate::store::{EventStore, LogStore};
use crate::supervisor::{ControlError, ProcessSupervisor, SupervisorError};
use rp_protocol::{Event, EventKind, LogLine, StatePush, StateSnapshot, Step, StepStatus};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

/// A run executing in the background.
#[derive(Debug)]
pub struct RunHandle {
    pub run_id: Uuid,
    pub task: JoinHandle<RunOutcome>,
}

/// Launches steps through the supervisor, reporting each outcome only once
/// any in-flight control request has recorded its event.
struct GatedLauncher {
    supervisor: Arc<ProcessSupervisor>,
    control: Arc<Mutex<()>>,
}

#[async_trait]
impl StepLauncher for GatedLauncher {
    async fn launch(&self, step: &StepDefinition) -> Result<(), SupervisorError> {
        let result = self.supervisor.launch(step).await;
        drop(self.control.lock().await);
        result
    }
}

/// Shared control-panel state.
pub struct StateManager {
    /// Runs the step list; owns step statuses and the `running` flag.
    engine: Arc<PipelineEngine>,

    /// Owns the active child and its `paused` flag.
    supervisor: Arc<ProcessSupervisor>,

    logs: Arc<LogStore>,
    events: Arc<EventStore>,
    credentials: Arc<CredentialStore>,

    /// Held by pause/resume/abort while they signal and record their event.
    control: Arc<Mutex<()>>,

    /// Directory holding the generated `audio/` and `video/` files.
    output_dir: PathBuf,
}

impl StateManager {
    /// Create a StateManager running the given step definitions.
    ///
    /// # Arguments
    ///
    /// * `config` - Resolved application configuration
    /// * `definitions` - Steps in execution order
    pub fn new(config: &AppConfig, definitions: Vec<StepDefinition>) -> Self {
        let logs = Arc::new(LogStore::new(config.log_capacity));
        let events = Arc::new(EventStore::new(config.event_capacity));
        let credentials = Arc::new(CredentialStore::new(
            &config.env_file,
            config.credential_keys.clone(),
        ));

        let supervisor = Arc::new(
            ProcessSupervisor::new(Arc::clone(&logs))
                .with_mirror_output(config.mirror_output)
                .with_env_overrides(credentials.overrides()),
        );
        let control = Arc::new(Mutex::new(()));
        let launcher: Arc<dyn StepLauncher> = Arc::new(GatedLauncher {
            supervisor: Arc::clone(&supervisor),
            control: Arc::clone(&control),
        });
        let engine = Arc::new(PipelineEngine::new(definitions, launcher, Arc::clone(&events)));

        Self {
            engine,
            supervisor,
            logs,
            events,
            credentials,
            control,
            output_dir: config.output_dir.clone(),
        }
    }

    /// Create a StateManager running the four video-generation scripts.
    pub fn from_config(config: &AppConfig) -> Self {
        let python = config.resolve_python();
        info!(python = %python.display(), scripts = %config.scripts_dir.display(), "resolved step interpreter");
        Self::new(config, default_steps(&python, &config.scripts_dir))
    }

    /// Start a full pipeline run in the background.
    ///
    /// The run is validated before this returns, so a conflicting request
    /// is rejected without touching any state.
    ///
    /// # Errors
    ///
    /// `EngineError::Conflict` if a run is in progress.
    pub async fn start_pipeline(&self) -> EngineResult<RunHandle> {
        let run_id = self.engine.begin_pipeline().await?;
        let engine = Arc::clone(&self.engine);
        let task = tokio::spawn(async move { engine.execute_pipeline().await });
        Ok(RunHandle { run_id, task })
    }

    /// Start a single-step run in the background.
    ///
    /// # Errors
    ///
    /// - `EngineError::Conflict` if a run is in progress
    /// - `EngineError::UnknownStep` if no step has this id
    /// - `EngineError::StepNotRunnable` if the step is running or succeeded
    pub async fn start_step(&self, id: usize) -> EngineResult<RunHandle> {
        let run_id = self.engine.begin_step(id).await?;
        let engine = Arc::clone(&self.engine);
        let task = tokio::spawn(async move { engine.execute_step(id).await });
        Ok(RunHandle { run_id, task })
    }

    /// Suspend the active step.
    ///
    /// # Returns
    ///
    /// `Ok(false)` if no step is active or it is already paused.
    pub async fn pause(&self) -> Result<bool, ControlError> {
        let _control = self.control.lock().await;
        let paused = self.supervisor.suspend().await?;
        if paused {
            let step_id = self.current_step().await;
            self.events.push(EventKind::Pause, "Pipeline paused", step_id).await;
        }
        Ok(paused)
    }

    /// Continue the paused step.
    ///
    /// # Returns
    ///
    /// `Ok(false)` if no step is active or it is not paused.
    pub async fn resume(&self) -> Result<bool, ControlError> {
        let _control = self.control.lock().await;
        let resumed = self.supervisor.resume().await?;
        if resumed {
            let step_id = self.current_step().await;
            self.events.push(EventKind::Resume, "Pipeline resumed", step_id).await;
        }
        Ok(resumed)
    }

    /// Ask the active step to terminate; the run then fails at that step.
    ///
    /// # Returns
    ///
    /// `Ok(false)` if no step is active.
    pub async fn abort(&self) -> Result<bool, ControlError> {
        let _control = self.control.lock().await;
        let aborted = self.supervisor.terminate().await?;
        if aborted {
            let step_id = self.current_step().await;
            self.events.push(EventKind::Abort, "Pipeline aborted", step_id).await;
        }
        Ok(aborted)
    }

    /// Terminate the active step, if any, before the server exits.
    pub async fn shutdown(&self) {
        match self.supervisor.terminate().await {
            Ok(true) => info!("terminated active step on shutdown"),
            Ok(false) => {}
            Err(e) => warn!("failed to terminate active step on shutdown: {e}"),
        }
    }

    /// Full state snapshot, including the output listings.
    pub async fn snapshot(&self) -> StateSnapshot {
        let output_dir = self.output_dir.clone();
        let outputs = tokio::task::spawn_blocking(move || list_outputs(&output_dir))
            .await
            .unwrap_or_default();

        StateSnapshot {
            running: self.engine.is_running().await,
            paused: self.supervisor.is_paused().await,
            steps: self.engine.steps().await,
            outputs,
            run_id: self.engine.run_id().await,
        }
    }

    /// The reduced state sent on the push channel.
    pub async fn state_push(&self) -> StatePush {
        StatePush {
            steps: self.engine.steps().await,
            running: self.engine.is_running().await,
        }
    }

    /// Log lines newer than `since`, plus the next cursor.
    pub async fn logs_since(&self, since: i64) -> (Vec<LogLine>, i64) {
        self.logs.query(since).await
    }

    /// Events newer than `since`, plus the next cursor.
    pub async fn events_since(&self, since: i64) -> (Vec<Event>, i64) {
        self.events.query(since).await
    }

    pub async fn steps(&self) -> Vec<Step> {
        self.engine.steps().await
    }

    pub async fn is_running(&self) -> bool {
        self.engine.is_running().await
    }

    pub async fn is_paused(&self) -> bool {
        self.supervisor.is_paused().await
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn definitions(&self) -> &[StepDefinition] {
        self.engine.definitions()
    }

    async fn current_step(&self) -> Option<usize> {
        self.engine
            .steps()
            .await
            .iter()
            .find(|s| s.status == StepStatus::Running)
            .map(|s| s.id)
    }
}
