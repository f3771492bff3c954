//! Configuration loader.
//!
//! This module builds an [`AppConfig`] from:
//! - Built-in defaults for the project root
//! - `reel-panel.toml` in the project root (or an explicit file)
//! - `REEL_*` environment variables, plus the legacy `FRONTEND_PORT` and
//!   `PYTHON` variables

use crate::config::error::{ConfigError, ConfigResult};
use crate::config::models::{AppConfig, ConfigOverrides, CONFIG_FILE_NAME};
use std::path::Path;

/// Prefix of environment variables overriding configuration fields.
pub const ENV_PREFIX: &str = "REEL_";

/// Loads the configuration for the project rooted at `root`.
///
/// # Arguments
///
/// * `root` - Project root directory
/// * `config_file` - Explicit configuration file; must exist if given. When
///   `None`, `<root>/reel-panel.toml` is read if present.
///
/// # Errors
///
/// Returns `ConfigError` if:
/// - The configuration file exists but cannot be read or parsed
/// - An environment override has a value of the wrong type
///
/// # Example
///
/// ```rust,no_run
/// use rp_core::config::loader::load_config;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("."), None).await?;
/// println!("Serving on port {}", config.port);
/// # Ok(())
/// # }
/// ```
pub async fn load_config(root: &Path, config_file: Option<&Path>) -> ConfigResult<AppConfig> {
    load_config_from(root, config_file, std::env::vars())
}

/// Same as [`load_config`], reading overrides from `vars` instead of the
/// process environment.
pub fn load_config_from<I>(root: &Path, config_file: Option<&Path>, vars: I) -> ConfigResult<AppConfig>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut config = AppConfig::for_root(root);

    if let Some(overrides) = load_file_overrides(root, config_file)? {
        overrides.apply(&mut config);
    }

    env_overrides(vars)?.apply(&mut config);

    validate(&config)?;
    Ok(config)
}

/// Reads the TOML configuration file, if any.
fn load_file_overrides(root: &Path, config_file: Option<&Path>) -> ConfigResult<Option<ConfigOverrides>> {
    let path = match config_file {
        Some(path) => path.to_path_buf(),
        None => {
            let default_path = root.join(CONFIG_FILE_NAME);
            // A missing default file just means defaults
            if !default_path.exists() {
                return Ok(None);
            }
            default_path
        }
    };

    let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::FileRead {
        path: path.clone(),
        source,
    })?;

    let overrides = toml::from_str(&content).map_err(|source| ConfigError::TomlParse { path, source })?;
    Ok(Some(overrides))
}

/// Parses `REEL_*` variables, falling back to `FRONTEND_PORT` and `PYTHON`.
pub fn env_overrides<I>(vars: I) -> ConfigResult<ConfigOverrides>
where
    I: IntoIterator<Item = (String, String)>,
{
    let vars: Vec<(String, String)> = vars.into_iter().collect();
    let mut overrides: ConfigOverrides = envy::prefixed(ENV_PREFIX).from_iter(vars.iter().cloned())?;

    let legacy = |name: &str| {
        vars.iter()
            .find(|(key, value)| key == name && !value.is_empty())
            .map(|(_, value)| value.clone())
    };

    if overrides.port.is_none() {
        if let Some(port) = legacy("FRONTEND_PORT") {
            let port = port
                .parse()
                .map_err(|_| ConfigError::InvalidConfig(format!("FRONTEND_PORT is not a port: {port}")))?;
            overrides.port = Some(port);
        }
    }
    if overrides.python.is_none() {
        overrides.python = legacy("PYTHON").map(Into::into);
    }

    Ok(overrides)
}

fn validate(config: &AppConfig) -> ConfigResult<()> {
    if config.port.checked_add(config.port_retries).is_none() {
        return Err(ConfigError::InvalidConfig(format!(
            "port {} with {} retries exceeds the port range",
            config.port, config.port_retries
        )));
    }
    if config.credential_keys.iter().any(|k| !is_env_key(k)) {
        return Err(ConfigError::InvalidConfig(
            "credential keys must be non-empty and contain only A-Z, a-z, 0-9 and _".to_string(),
        ));
    }
    Ok(())
}

/// Whether `key` is a valid key=value file key.
pub fn is_env_key(key: &str) -> bool {
    !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_without_file_or_env() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = load_config_from(temp_dir.path(), None, vec![]).unwrap();
        assert_eq!(config, AppConfig::for_root(temp_dir.path()));
    }

    #[test]
    fn test_file_then_env_layering() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::write(
            temp_dir.path().join(CONFIG_FILE_NAME),
            r#"
port = 6000
venv_dir = ".venv"
output_dir = "renders"
mirror_output = false
"#,
        )
        .unwrap();

        let config = load_config_from(
            temp_dir.path(),
            None,
            vars(&[("REEL_PORT", "7000"), ("REEL_LOG_CAPACITY", "50"), ("UNRELATED", "x")]),
        )
        .unwrap();

        assert_eq!(config.port, 7000);
        assert_eq!(config.log_capacity, 50);
        assert_eq!(config.venv_dir, ".venv");
        assert_eq!(config.output_dir, temp_dir.path().join("renders"));
        assert!(!config.mirror_output);
    }

    #[test]
    fn test_legacy_variables() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = load_config_from(
            temp_dir.path(),
            None,
            vars(&[("FRONTEND_PORT", "5173"), ("PYTHON", "/usr/local/bin/python3.11")]),
        )
        .unwrap();

        assert_eq!(config.port, 5173);
        assert_eq!(config.python, Some(PathBuf::from("/usr/local/bin/python3.11")));

        // Prefixed variables win over legacy ones
        let config = load_config_from(
            temp_dir.path(),
            None,
            vars(&[("FRONTEND_PORT", "5173"), ("REEL_PORT", "9000")]),
        )
        .unwrap();
        assert_eq!(config.port, 9000);
    }

    #[test]
    fn test_credential_keys_from_env_list() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = load_config_from(
            temp_dir.path(),
            None,
            vars(&[("REEL_CREDENTIAL_KEYS", "OPENAI_API_KEY,ELEVENLABS_API_KEY")]),
        )
        .unwrap();
        assert_eq!(config.credential_keys, vec!["OPENAI_API_KEY", "ELEVENLABS_API_KEY"]);
    }

    #[test]
    fn test_invalid_values_are_errors() {
        let temp_dir = tempfile::tempdir().unwrap();

        let result = load_config_from(temp_dir.path(), None, vars(&[("REEL_PORT", "not-a-port")]));
        assert!(matches!(result, Err(ConfigError::Env(_))));

        let result = load_config_from(temp_dir.path(), None, vars(&[("FRONTEND_PORT", "abc")]));
        assert!(matches!(result, Err(ConfigError::InvalidConfig(_))));

        let result = load_config_from(
            temp_dir.path(),
            None,
            vars(&[("REEL_PORT", "65530"), ("REEL_PORT_RETRIES", "10")]),
        );
        assert!(matches!(result, Err(ConfigError::InvalidConfig(_))));
    }

    #[test]
    fn test_explicit_file_must_exist() {
        let temp_dir = tempfile::tempdir().unwrap();
        let missing = temp_dir.path().join("missing.toml");
        let result = load_config_from(temp_dir.path(), Some(&missing), vec![]);
        assert!(matches!(result, Err(ConfigError::FileRead { .. })));
    }

    #[test]
    fn test_malformed_toml() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::write(temp_dir.path().join(CONFIG_FILE_NAME), "port = [").unwrap();
        let result = load_config_from(temp_dir.path(), None, vec![]);
        assert!(matches!(result, Err(ConfigError::TomlParse { .. })));
    }

    #[test]
    fn test_is_env_key() {
        assert!(is_env_key("OPENAI_API_KEY"));
        assert!(!is_env_key(""));
        assert!(!is_env_key("BAD-KEY"));
        assert!(!is_env_key("A=B"));
    }
}
