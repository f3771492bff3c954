//! The fixed, ordered list of pipeline steps.

use crate::supervisor::StepCommand;
use rp_protocol::Step;
use std::path::Path;

/// Name and script of each stage, in execution order.
///
/// Each script reads the files written by the previous one, so the order is
/// part of the contract.
pub const PIPELINE_STEPS: [(&str, &str); 4] = [
    ("Story generation", "generate_story.py"),
    ("Speech synthesis", "texttospeech.py"),
    ("Video assembly", "montage.py"),
    ("Captions", "add_caption.py"),
];

/// A step together with the command that carries it out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepDefinition {
    /// Zero-based identifier, equal to the step's position.
    pub id: usize,
    pub name: String,
    pub command: StepCommand,
}

impl StepDefinition {
    pub fn new(id: usize, name: impl Into<String>, command: StepCommand) -> Self {
        Self {
            id,
            name: name.into(),
            command,
        }
    }

    /// Client-facing view of this step, in the idle state.
    pub fn to_step(&self) -> Step {
        Step::new(self.id, self.name.clone())
    }
}

/// Build the four video-generation steps.
///
/// # Arguments
///
/// * `python` - Interpreter used to run every script
/// * `scripts_dir` - Directory holding the scripts; also the working directory
pub fn default_steps(python: &Path, scripts_dir: &Path) -> Vec<StepDefinition> {
    PIPELINE_STEPS
        .iter()
        .enumerate()
        .map(|(id, (name, script))| {
            let command = StepCommand::new(python, vec![(*script).to_string()], scripts_dir)
                // Python block-buffers piped output; keep the log view live.
                .with_env("PYTHONUNBUFFERED", "1");
            StepDefinition::new(id, *name, command)
        })
        .collect()
}
