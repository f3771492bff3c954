//! Seam between the orchestrator and whatever executes a step.

use super::steps::StepDefinition;
use crate::supervisor::{ProcessSupervisor, SupervisorError};
use async_trait::async_trait;

/// Runs one step to completion.
///
/// `Ok(())` means the step succeeded; any error fails the step.
#[async_trait]
pub trait StepLauncher: Send + Sync {
    async fn launch(&self, step: &StepDefinition) -> Result<(), SupervisorError>;
}

#[async_trait]
impl StepLauncher for ProcessSupervisor {
    async fn launch(&self, step: &StepDefinition) -> Result<(), SupervisorError> {
        self.run(&step.command).await
    }
}
