//! Fixtures for building steps, supervisors and managers.

use rp_core::config::models::AppConfig;
use rp_core::engine::steps::StepDefinition;
use rp_core::state::manager::StateManager;
use rp_core::store::LogStore;
use rp_core::supervisor::{ProcessSupervisor, StepCommand};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Upper bound for any wait in these tests.
#[allow(dead_code)]
pub const TEST_TIMEOUT: Duration = Duration::from_secs(10);

/// A `sh -c <script>` command run in `working_dir`.
#[allow(dead_code)]
pub fn shell_command(script: &str, working_dir: &Path) -> StepCommand {
    StepCommand::new("sh", vec!["-c".to_string(), script.to_string()], working_dir)
}

/// One step per script, named "Step <id>".
#[allow(dead_code)]
pub fn shell_steps(scripts: &[&str], working_dir: &Path) -> Vec<StepDefinition> {
    scripts
        .iter()
        .enumerate()
        .map(|(id, script)| StepDefinition::new(id, format!("Step {id}"), shell_command(script, working_dir)))
        .collect()
}

/// A supervisor that does not mirror output, with its log store.
#[allow(dead_code)]
pub fn create_test_supervisor() -> (Arc<ProcessSupervisor>, Arc<LogStore>) {
    let logs = Arc::new(LogStore::new(100));
    let supervisor = Arc::new(ProcessSupervisor::new(Arc::clone(&logs)));
    (supervisor, logs)
}

/// A manager rooted at `root` running the given scripts.
#[allow(dead_code)]
pub fn create_test_manager(root: &Path, scripts: &[&str]) -> StateManager {
    let mut config = AppConfig::for_root(root);
    config.mirror_output = false;
    StateManager::new(&config, shell_steps(scripts, root))
}

/// Poll `check` every 20ms until it yields `true` or the timeout elapses.
#[allow(dead_code)]
pub async fn wait_until<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + TEST_TIMEOUT;
    while tokio::time::Instant::now() < deadline {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}
