//! Configuration models.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::store::{DEFAULT_EVENT_CAPACITY, DEFAULT_LOG_CAPACITY};

/// Name of the optional configuration file in the project root.
pub const CONFIG_FILE_NAME: &str = "reel-panel.toml";

/// Credential variables editable through the API by default.
pub const DEFAULT_CREDENTIAL_KEYS: [&str; 3] = ["GOOGLE_API_KEY", "GEMINI_API_KEY", "OPENAI_API_KEY"];

/// Fully resolved application configuration.
///
/// # Example
///
/// ```toml
/// # reel-panel.toml
/// port = 8080
/// venv_dir = ".venv"
/// mirror_output = false
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Address the HTTP server binds to.
    pub host: String,

    /// First port tried by the HTTP server.
    pub port: u16,

    /// How many following ports to try when the port is taken.
    pub port_retries: u16,

    /// Root of the video project.
    pub project_root: PathBuf,

    /// Directory holding the step scripts; the steps' working directory.
    pub scripts_dir: PathBuf,

    /// Directory the pipeline writes into (`audio/`, `video/`). Served under `/media`.
    pub output_dir: PathBuf,

    /// Key=value file holding credentials.
    pub env_file: PathBuf,

    /// Interpreter running the step scripts. Resolved at startup if unset.
    pub python: Option<PathBuf>,

    /// Project-local virtualenv directory, relative to the project root.
    pub venv_dir: String,

    /// Number of output lines retained.
    pub log_capacity: usize,

    /// Number of lifecycle events retained.
    pub event_capacity: usize,

    /// Seconds between keep-alive messages on the push channel.
    pub heartbeat_secs: u64,

    /// Copy child output to the server's own stdout/stderr.
    pub mirror_output: bool,

    /// Credential variables readable and writable through the API.
    pub credential_keys: Vec<String>,
}

impl AppConfig {
    /// Default configuration for a project rooted at `root`.
    pub fn for_root(root: &Path) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5050,
            port_retries: 10,
            project_root: root.to_path_buf(),
            scripts_dir: root.join("backend").join("scripts"),
            output_dir: root.join("output"),
            env_file: root.join(".env"),
            python: None,
            venv_dir: "IWNAenv".to_string(),
            log_capacity: DEFAULT_LOG_CAPACITY,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            heartbeat_secs: 15,
            mirror_output: true,
            credential_keys: DEFAULT_CREDENTIAL_KEYS.iter().map(|k| (*k).to_string()).collect(),
        }
    }

    /// Interval between push-channel keep-alives.
    pub fn heartbeat(&self) -> Duration {
        Duration::from_secs(self.heartbeat_secs.max(1))
    }

    /// Interpreter for the step scripts.
    ///
    /// Resolution order: configured `python`, the project virtualenv's
    /// `bin/python`, then `python3` or `python` found on `PATH`. Falls back to
    /// the bare name `python` so the spawn error names what was attempted.
    pub fn resolve_python(&self) -> PathBuf {
        if let Some(python) = &self.python {
            return python.clone();
        }
        let venv_python = self.project_root.join(&self.venv_dir).join("bin").join("python");
        if venv_python.exists() {
            return venv_python;
        }
        which::which("python3")
            .or_else(|_| which::which("python"))
            .unwrap_or_else(|_| PathBuf::from("python"))
    }
}

/// Partial configuration, as found in the TOML file or the environment.
///
/// Relative paths are resolved against the project root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub port_retries: Option<u16>,
    pub scripts_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
    pub python: Option<PathBuf>,
    pub venv_dir: Option<String>,
    pub log_capacity: Option<usize>,
    pub event_capacity: Option<usize>,
    pub heartbeat_secs: Option<u64>,
    pub mirror_output: Option<bool>,
    pub credential_keys: Option<Vec<String>>,
}

impl ConfigOverrides {
    /// Apply every set field onto `config`.
    pub fn apply(self, config: &mut AppConfig) {
        let root = config.project_root.clone();
        let rooted = |path: PathBuf| if path.is_absolute() { path } else { root.join(path) };

        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(retries) = self.port_retries {
            config.port_retries = retries;
        }
        if let Some(dir) = self.scripts_dir {
            config.scripts_dir = rooted(dir);
        }
        if let Some(dir) = self.output_dir {
            config.output_dir = rooted(dir);
        }
        if let Some(file) = self.env_file {
            config.env_file = rooted(file);
        }
        if let Some(python) = self.python {
            config.python = Some(python);
        }
        if let Some(venv) = self.venv_dir {
            config.venv_dir = venv;
        }
        if let Some(capacity) = self.log_capacity {
            config.log_capacity = capacity;
        }
        if let Some(capacity) = self.event_capacity {
            config.event_capacity = capacity;
        }
        if let Some(secs) = self.heartbeat_secs {
            config.heartbeat_secs = secs;
        }
        if let Some(mirror) = self.mirror_output {
            config.mirror_output = mirror;
        }
        if let Some(keys) = self.credential_keys {
            config.credential_keys = keys;
        }
    }
}
