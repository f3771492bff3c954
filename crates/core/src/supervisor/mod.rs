//! Child process supervision.
//!
//! The ProcessSupervisor spawns one step program at a time, captures its
//! stdout and stderr into the log store, and delivers pause/resume/abort
//! requests to it through a [`ProcessSignals`] capability.

pub mod error;
pub mod output;
pub mod signal;

pub use error::{ControlError, SupervisorError, SupervisorResult};
pub use signal::{platform_signals, ProcessSignals, UnsupportedSignals};

use crate::store::LogStore;
use output::SegmentReader;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncRead;
use tokio::process::Command;
use tokio::select;
use tokio::sync::{Mutex, Notify, RwLock};
use tracing::{debug, error, info, warn};

/// How long output pipes are still read after the child has exited.
///
/// Grandchildren may inherit the pipes and keep them open indefinitely.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

/// A fully resolved command line for one step program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepCommand {
    /// Program to execute (interpreter or binary).
    pub program: PathBuf,

    /// Arguments passed to the program.
    pub args: Vec<String>,

    /// Working directory of the child.
    pub working_dir: PathBuf,

    /// Extra environment variables for the child.
    pub env: Vec<(String, String)>,
}

impl StepCommand {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args,
            working_dir: working_dir.into(),
            env: Vec::new(),
        }
    }

    /// Add an environment variable.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Render the command line for display.
    pub fn display(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

/// Handle on the single active child process.
#[derive(Debug)]
struct ActiveChild {
    pid: u32,
    paused: bool,
    /// Forced-kill fallback when terminate signals are unavailable.
    kill: Arc<Notify>,
}

/// Shared environment overrides injected into every spawned child.
pub type EnvOverrides = Arc<RwLock<Vec<(String, String)>>>;

/// Supervises one child process at a time.
pub struct ProcessSupervisor {
    /// Destination of captured output lines.
    logs: Arc<LogStore>,

    /// Platform capability for process-state signals.
    signals: Arc<dyn ProcessSignals>,

    /// The active child, if any.
    active: Mutex<Option<ActiveChild>>,

    /// Also copy child output to this process's stdout/stderr.
    mirror_output: bool,

    /// Environment variables set on every child, after the step's own.
    env_overrides: EnvOverrides,
}

impl ProcessSupervisor {
    /// Create a supervisor using the host platform's signals.
    ///
    /// # Arguments
    ///
    /// * `logs` - Store receiving every captured output line
    pub fn new(logs: Arc<LogStore>) -> Self {
        Self::with_signals(logs, platform_signals())
    }

    /// Create a supervisor with an explicit signal capability.
    pub fn with_signals(logs: Arc<LogStore>, signals: Arc<dyn ProcessSignals>) -> Self {
        Self {
            logs,
            signals,
            active: Mutex::new(None),
            mirror_output: false,
            env_overrides: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Mirror child output to the server's own stdout/stderr.
    pub fn with_mirror_output(mut self, mirror: bool) -> Self {
        self.mirror_output = mirror;
        self
    }

    /// Share an environment override list with another component.
    pub fn with_env_overrides(mut self, overrides: EnvOverrides) -> Self {
        self.env_overrides = overrides;
        self
    }

    /// Run `command` to completion.
    ///
    /// Every stdout/stderr segment (ended by `\n` or `\r`) is sanitized and
    /// appended to the log store while the child runs.
    ///
    /// # Errors
    ///
    /// - `SupervisorError::Busy` if another child is active
    /// - `SupervisorError::Spawn` if the program cannot be started
    /// - `SupervisorError::ProcessExit` if the child exits non-zero or is
    ///   killed by a signal (including an abort)
    pub async fn run(&self, command: &StepCommand) -> SupervisorResult<()> {
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .current_dir(&command.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd.envs(command.env.iter().map(|(k, v)| (k, v)));
        cmd.envs(self.env_overrides.read().await.iter().map(|(k, v)| (k, v)));

        // Own process group, so signals reach the whole tree of the step.
        #[cfg(unix)]
        cmd.process_group(0);

        let kill = Arc::new(Notify::new());
        let (mut child, pid) = {
            let mut active = self.active.lock().await;
            if let Some(current) = active.as_ref() {
                return Err(SupervisorError::Busy(current.pid));
            }
            let child = match cmd.spawn() {
                Ok(child) => child,
                Err(source) => {
                    let err = SupervisorError::Spawn {
                        program: command.program.clone(),
                        source,
                    };
                    error!("{err}");
                    self.logs.append(&err.to_string()).await;
                    return Err(err);
                }
            };
            // Only `None` once the child has been reaped, which cannot have happened yet.
            let pid = child.id().ok_or_else(|| {
                SupervisorError::Io(std::io::Error::other("child exited before its pid was read"))
            })?;
            *active = Some(ActiveChild {
                pid,
                paused: false,
                kill: Arc::clone(&kill),
            });
            (child, pid)
        };
        info!(pid, command = %command.display(), "child process started");

        let status = self.capture(&mut child, pid, &kill).await?;
        if status.success() {
            debug!(pid, "child process exited successfully");
            Ok(())
        } else {
            #[cfg(unix)]
            let signal = std::os::unix::process::ExitStatusExt::signal(&status);
            #[cfg(not(unix))]
            let signal = None;
            warn!(pid, code = ?status.code(), signal = ?signal, "child process failed");
            Err(SupervisorError::ProcessExit {
                code: status.code(),
                signal,
            })
        }
    }

    /// Pump both output streams while the child runs, then reap it.
    ///
    /// The active slot is cleared as soon as the child is reaped, before any
    /// remaining output is drained.
    async fn capture(
        &self,
        child: &mut tokio::process::Child,
        pid: u32,
        kill: &Notify,
    ) -> SupervisorResult<std::process::ExitStatus> {
        let mut stdout = child.stdout.take().map(SegmentReader::new);
        let mut stderr = child.stderr.take().map(SegmentReader::new);
        let mut stdout_finished = stdout.is_none();
        let mut stderr_finished = stderr.is_none();
        let mut kill_requested = false;

        let status = loop {
            if kill_requested {
                kill_requested = false;
                if let Err(e) = child.start_kill() {
                    error!(pid, "failed to kill child process: {e}");
                }
            }

            select! {
                batch = next_batch(&mut stdout), if !stdout_finished => {
                    stdout_finished = self.record_batch(batch, pid, false).await;
                }
                batch = next_batch(&mut stderr), if !stderr_finished => {
                    stderr_finished = self.record_batch(batch, pid, true).await;
                }
                _ = kill.notified() => kill_requested = true,
                status = child.wait() => break status,
            }
        };
        self.active.lock().await.take();
        let status = status?;

        let drain = async {
            while !(stdout_finished && stderr_finished) {
                select! {
                    batch = next_batch(&mut stdout), if !stdout_finished => {
                        stdout_finished = self.record_batch(batch, pid, false).await;
                    }
                    batch = next_batch(&mut stderr), if !stderr_finished => {
                        stderr_finished = self.record_batch(batch, pid, true).await;
                    }
                }
            }
        };
        if tokio::time::timeout(DRAIN_GRACE, drain).await.is_err() {
            debug!(pid, "output pipes still open after exit, detaching");
        }
        Ok(status)
    }

    /// Record one read result; returns whether the stream is finished.
    async fn record_batch(
        &self,
        batch: std::io::Result<Option<Vec<Vec<u8>>>>,
        pid: u32,
        is_stderr: bool,
    ) -> bool {
        match batch {
            Ok(Some(segments)) => {
                for segment in &segments {
                    self.record(segment, is_stderr).await;
                }
                false
            }
            Ok(None) => true,
            Err(e) => {
                let stream = if is_stderr { "stderr" } else { "stdout" };
                error!(pid, "child {stream} encountered I/O error: {e}");
                true
            }
        }
    }

    async fn record(&self, bytes: &[u8], is_stderr: bool) {
        let text = String::from_utf8_lossy(bytes);
        if self.mirror_output {
            if is_stderr {
                eprintln!("{text}");
            } else {
                println!("{text}");
            }
        }
        self.logs.append(&text).await;
    }

    /// Suspend the active child.
    ///
    /// # Returns
    ///
    /// `Ok(false)` when there is no active child or it is already paused.
    pub async fn suspend(&self) -> Result<bool, ControlError> {
        let mut active = self.active.lock().await;
        let Some(child) = active.as_mut().filter(|c| !c.paused) else {
            return Ok(false);
        };
        if !delivered(self.signals.suspend(child.pid))? {
            return Ok(false);
        }
        child.paused = true;
        info!(pid = child.pid, "child process suspended");
        Ok(true)
    }

    /// Continue the active, suspended child.
    ///
    /// # Returns
    ///
    /// `Ok(false)` when there is no active child or it is not paused.
    pub async fn resume(&self) -> Result<bool, ControlError> {
        let mut active = self.active.lock().await;
        let Some(child) = active.as_mut().filter(|c| c.paused) else {
            return Ok(false);
        };
        if !delivered(self.signals.resume(child.pid))? {
            return Ok(false);
        }
        child.paused = false;
        info!(pid = child.pid, "child process resumed");
        Ok(true)
    }

    /// Ask the active child to terminate.
    ///
    /// The child's exit then surfaces from [`run`](Self::run) as a
    /// `ProcessExit` error. A suspended child is continued after the
    /// terminate signal so that it can act on it.
    ///
    /// # Returns
    ///
    /// `Ok(false)` when there is no active child.
    pub async fn terminate(&self) -> Result<bool, ControlError> {
        let mut active = self.active.lock().await;
        let Some(child) = active.as_mut() else {
            return Ok(false);
        };
        match self.signals.terminate(child.pid) {
            Ok(()) => {}
            Err(ControlError::Unsupported(_)) => child.kill.notify_one(),
            Err(ControlError::ProcessGone(_)) => return Ok(false),
            Err(e) => return Err(e),
        }
        if child.paused {
            if let Err(e) = self.signals.resume(child.pid) {
                warn!(pid = child.pid, "failed to continue terminated child: {e}");
            }
            child.paused = false;
        }
        info!(pid = child.pid, "child process termination requested");
        Ok(true)
    }

    /// Whether a child is currently running.
    pub async fn is_active(&self) -> bool {
        self.active.lock().await.is_some()
    }

    /// Whether the active child is suspended.
    pub async fn is_paused(&self) -> bool {
        self.active.lock().await.as_ref().is_some_and(|c| c.paused)
    }

    /// Process id of the active child.
    pub async fn active_pid(&self) -> Option<u32> {
        self.active.lock().await.as_ref().map(|c| c.pid)
    }
}

/// A group that vanished between reap and bookkeeping counts as "no child".
fn delivered(result: Result<(), ControlError>) -> Result<bool, ControlError> {
    match result {
        Ok(()) => Ok(true),
        Err(ControlError::ProcessGone(pid)) => {
            debug!(pid, "signal target already exited");
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

async fn next_batch<R>(reader: &mut Option<SegmentReader<R>>) -> std::io::Result<Option<Vec<Vec<u8>>>>
where
    R: AsyncRead + Unpin,
{
    match reader {
        Some(reader) => reader.next_batch().await,
        None => Ok(None),
    }
}
