//! Process supervisor tests against real child processes.
//!
//! These tests spawn `sh -c` scripts and exercise output capture, exit
//! status reporting and the signal-based pause, resume and abort controls.

#![cfg(unix)]

mod common;

use common::*;
use rp_core::store::LogStore;
use rp_core::supervisor::{
    ControlError, ProcessSignals, ProcessSupervisor, StepCommand, SupervisorError, UnsupportedSignals,
};
use std::sync::Arc;

const SIGTERM: i32 = 15;
const SIGKILL: i32 = 9;

/// Signals whose target group has always just exited.
struct VanishedGroup;

impl ProcessSignals for VanishedGroup {
    fn suspend(&self, pid: u32) -> Result<(), ControlError> {
        Err(ControlError::ProcessGone(pid))
    }

    fn resume(&self, pid: u32) -> Result<(), ControlError> {
        Err(ControlError::ProcessGone(pid))
    }

    fn terminate(&self, pid: u32) -> Result<(), ControlError> {
        Err(ControlError::ProcessGone(pid))
    }
}

fn supervisor_with(signals: Arc<dyn ProcessSignals>) -> (Arc<ProcessSupervisor>, Arc<LogStore>) {
    let logs = Arc::new(LogStore::new(100));
    let supervisor = Arc::new(ProcessSupervisor::with_signals(Arc::clone(&logs), signals));
    (supervisor, logs)
}

#[tokio::test]
async fn test_captures_stdout_and_stderr_lines() {
    let temp_dir = tempfile::tempdir().unwrap();
    let (supervisor, logs) = create_test_supervisor();

    supervisor
        .run(&shell_command("echo out; echo err 1>&2; printf 'no newline'", temp_dir.path()))
        .await
        .unwrap();

    let (lines, now) = logs.query(0).await;
    let mut texts = log_texts(&lines);
    texts.sort();
    assert_eq!(texts, vec!["err", "no newline", "out"]);
    assert_non_decreasing(lines.iter().map(|l| l.ts));
    assert!(now >= lines.last().unwrap().ts);
    assert!(!supervisor.is_active().await);
}

#[tokio::test]
async fn test_strips_ansi_sequences() {
    let temp_dir = tempfile::tempdir().unwrap();
    let (supervisor, logs) = create_test_supervisor();

    supervisor
        .run(&shell_command(r"printf '\033[1;31mred\033[0m text\r\n'", temp_dir.path()))
        .await
        .unwrap();

    let (lines, _) = logs.query(0).await;
    assert_eq!(log_texts(&lines), vec!["red text"]);
}

#[tokio::test]
async fn test_non_zero_exit_is_an_error() {
    let temp_dir = tempfile::tempdir().unwrap();
    let (supervisor, _logs) = create_test_supervisor();

    let result = supervisor.run(&shell_command("exit 3", temp_dir.path())).await;

    match result {
        Err(SupervisorError::ProcessExit { code, signal }) => {
            assert_eq!(code, Some(3));
            assert_eq!(signal, None);
        }
        other => panic!("expected ProcessExit, got {other:?}"),
    }
}

#[tokio::test]
async fn test_spawn_failure_is_logged() {
    let temp_dir = tempfile::tempdir().unwrap();
    let (supervisor, logs) = create_test_supervisor();
    let command = StepCommand::new("/nonexistent/interpreter", vec![], temp_dir.path());

    let result = supervisor.run(&command).await;

    assert!(matches!(result, Err(SupervisorError::Spawn { .. })));
    let (lines, _) = logs.query(0).await;
    assert_eq!(lines.len(), 1);
    assert!(lines[0].line.contains("/nonexistent/interpreter"));
    assert!(!supervisor.is_active().await);
}

#[tokio::test]
async fn test_step_env_reaches_child() {
    let temp_dir = tempfile::tempdir().unwrap();
    let (supervisor, logs) = create_test_supervisor();
    let command = shell_command("echo \"$RP_STEP_VAR\"", temp_dir.path()).with_env("RP_STEP_VAR", "hello");

    supervisor.run(&command).await.unwrap();

    let (lines, _) = logs.query(0).await;
    assert_eq!(log_texts(&lines), vec!["hello"]);
}

#[tokio::test]
async fn test_controls_without_active_child() {
    let (supervisor, _logs) = create_test_supervisor();

    assert_eq!(supervisor.suspend().await, Ok(false));
    assert_eq!(supervisor.resume().await, Ok(false));
    assert_eq!(supervisor.terminate().await, Ok(false));
    assert!(!supervisor.is_paused().await);
}

#[tokio::test]
async fn test_pause_resume_and_abort() {
    let temp_dir = tempfile::tempdir().unwrap();
    let (supervisor, _logs) = create_test_supervisor();
    let command = shell_command("sleep 30", temp_dir.path());

    let runner = Arc::clone(&supervisor);
    let task = tokio::spawn(async move { runner.run(&command).await });
    assert!(wait_until(|| supervisor.is_active()).await);

    // Pause is only valid once
    assert_eq!(supervisor.suspend().await, Ok(true));
    assert!(supervisor.is_paused().await);
    assert_eq!(supervisor.suspend().await, Ok(false));

    // Resume is only valid while paused
    assert_eq!(supervisor.resume().await, Ok(true));
    assert!(!supervisor.is_paused().await);
    assert_eq!(supervisor.resume().await, Ok(false));

    assert_eq!(supervisor.terminate().await, Ok(true));
    let result = tokio::time::timeout(TEST_TIMEOUT, task).await.unwrap().unwrap();
    match result {
        Err(SupervisorError::ProcessExit { code, signal }) => {
            assert_eq!(code, None);
            assert_eq!(signal, Some(SIGTERM));
        }
        other => panic!("expected ProcessExit, got {other:?}"),
    }
    assert!(!supervisor.is_active().await);
}

#[tokio::test]
async fn test_abort_while_paused() {
    let temp_dir = tempfile::tempdir().unwrap();
    let (supervisor, _logs) = create_test_supervisor();
    let command = shell_command("sleep 30", temp_dir.path());

    let runner = Arc::clone(&supervisor);
    let task = tokio::spawn(async move { runner.run(&command).await });
    assert!(wait_until(|| supervisor.is_active()).await);

    assert_eq!(supervisor.suspend().await, Ok(true));
    assert_eq!(supervisor.terminate().await, Ok(true));
    assert!(!supervisor.is_paused().await);

    let result = tokio::time::timeout(TEST_TIMEOUT, task).await.unwrap().unwrap();
    assert!(matches!(result, Err(SupervisorError::ProcessExit { .. })));
}

#[tokio::test]
async fn test_second_child_is_rejected() {
    let temp_dir = tempfile::tempdir().unwrap();
    let (supervisor, _logs) = create_test_supervisor();
    let command = shell_command("sleep 30", temp_dir.path());

    let runner = Arc::clone(&supervisor);
    let long = command.clone();
    let task = tokio::spawn(async move { runner.run(&long).await });
    assert!(wait_until(|| supervisor.is_active()).await);

    let pid = supervisor.active_pid().await.unwrap();
    let result = supervisor.run(&command).await;
    assert!(matches!(result, Err(SupervisorError::Busy(busy)) if busy == pid));

    supervisor.terminate().await.unwrap();
    tokio::time::timeout(TEST_TIMEOUT, task).await.unwrap().unwrap().unwrap_err();
}

#[tokio::test]
async fn test_carriage_return_progress_is_visible_while_running() {
    let temp_dir = tempfile::tempdir().unwrap();
    let (supervisor, logs) = create_test_supervisor();
    let command = shell_command(
        r"printf 'progress 10%%\r' 1>&2; printf 'progress 50%%\r' 1>&2; sleep 30",
        temp_dir.path(),
    );

    let runner = Arc::clone(&supervisor);
    let task = tokio::spawn(async move { runner.run(&command).await });

    let store = &logs;
    assert!(wait_until(|| async move { store.query(0).await.0.len() == 2 }).await);
    assert!(supervisor.is_active().await);
    let (lines, _) = logs.query(0).await;
    assert_eq!(log_texts(&lines), vec!["progress 10%", "progress 50%"]);

    supervisor.terminate().await.unwrap();
    tokio::time::timeout(TEST_TIMEOUT, task).await.unwrap().unwrap().unwrap_err();
}

#[tokio::test]
async fn test_background_grandchild_does_not_block_exit() {
    let temp_dir = tempfile::tempdir().unwrap();
    let (supervisor, logs) = create_test_supervisor();
    let command = shell_command("sleep 30 & echo started", temp_dir.path());

    tokio::time::timeout(TEST_TIMEOUT, supervisor.run(&command))
        .await
        .unwrap()
        .unwrap();

    let (lines, _) = logs.query(0).await;
    assert_eq!(log_texts(&lines), vec!["started"]);
    assert!(!supervisor.is_active().await);
}

#[tokio::test]
async fn test_kill_fallback_without_signal_support() {
    let temp_dir = tempfile::tempdir().unwrap();
    let (supervisor, _logs) = supervisor_with(Arc::new(UnsupportedSignals));
    // The shell forks `sleep`, which inherits the output pipes.
    let command = shell_command("sleep 30; echo done", temp_dir.path());

    let runner = Arc::clone(&supervisor);
    let task = tokio::spawn(async move { runner.run(&command).await });
    assert!(wait_until(|| supervisor.is_active()).await);

    assert_eq!(supervisor.suspend().await, Err(ControlError::Unsupported("suspend")));
    assert!(!supervisor.is_paused().await);
    assert_eq!(supervisor.terminate().await, Ok(true));

    let result = tokio::time::timeout(TEST_TIMEOUT, task).await.unwrap().unwrap();
    match result {
        Err(SupervisorError::ProcessExit { code, signal }) => {
            assert_eq!(code, None);
            assert_eq!(signal, Some(SIGKILL));
        }
        other => panic!("expected ProcessExit, got {other:?}"),
    }
    assert!(!supervisor.is_active().await);
}

#[tokio::test]
async fn test_controls_on_exited_group_are_not_errors() {
    let temp_dir = tempfile::tempdir().unwrap();
    let (supervisor, _logs) = supervisor_with(Arc::new(VanishedGroup));
    let command = shell_command("sleep 30", temp_dir.path());

    let runner = Arc::clone(&supervisor);
    let task = tokio::spawn(async move { runner.run(&command).await });
    assert!(wait_until(|| supervisor.is_active()).await);

    assert_eq!(supervisor.suspend().await, Ok(false));
    assert!(!supervisor.is_paused().await);
    assert_eq!(supervisor.resume().await, Ok(false));
    assert_eq!(supervisor.terminate().await, Ok(false));

    // Dropping the run kills the child.
    task.abort();
    assert!(task.await.unwrap_err().is_cancelled());
}
