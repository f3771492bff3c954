//! Credential variables kept in a key=value file.
//!
//! Only allow-listed keys can be read (masked) or written. Values written
//! through [`CredentialStore::update`] are persisted to the file and also
//! kept in memory; they are injected into the environment of every step
//! spawned afterwards. The server's own environment is never modified.

use crate::config::loader::is_env_key;
use crate::supervisor::EnvOverrides;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Errors from credential updates.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// The request contained no allow-listed key with a string value.
    #[error("Nothing to update")]
    NothingToUpdate,

    /// The file could not be written.
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Reads and writes allow-listed credential variables.
pub struct CredentialStore {
    path: PathBuf,
    keys: Vec<String>,
    overrides: EnvOverrides,
}

impl CredentialStore {
    /// Create a store backed by the key=value file at `path`.
    pub fn new(path: impl Into<PathBuf>, keys: Vec<String>) -> Self {
        Self {
            path: path.into(),
            keys,
            overrides: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// The override list to hand to the process supervisor.
    pub fn overrides(&self) -> EnvOverrides {
        Arc::clone(&self.overrides)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every allow-listed key mapped to its masked value (empty if unset).
    ///
    /// Lookup order: values written through this store, the server's
    /// environment, then the file. An unreadable file counts as empty.
    pub async fn masked(&self) -> BTreeMap<String, String> {
        let file = tokio::fs::read_to_string(&self.path).await.unwrap_or_default();
        let overrides = self.overrides.read().await;

        self.keys
            .iter()
            .map(|key| {
                let value = overrides
                    .iter()
                    .find(|(k, _)| k == key)
                    .map(|(_, v)| v.clone())
                    .or_else(|| std::env::var(key).ok().filter(|v| !v.is_empty()))
                    .or_else(|| read_env_value(&file, key))
                    .unwrap_or_default();
                (key.clone(), mask(&value))
            })
            .collect()
    }

    /// Persist the allow-listed string entries of `body`.
    ///
    /// # Returns
    ///
    /// The keys that were updated.
    ///
    /// # Errors
    ///
    /// - `CredentialError::NothingToUpdate` if no entry qualifies
    /// - `CredentialError::Write` if the file cannot be written
    pub async fn update(&self, body: &Map<String, Value>) -> Result<Vec<String>, CredentialError> {
        let updates: Vec<(String, String)> = body
            .iter()
            .filter(|(key, _)| self.keys.contains(key) && is_env_key(key))
            .filter_map(|(key, value)| value.as_str().map(|v| (key.clone(), v.to_string())))
            .collect();
        if updates.is_empty() {
            return Err(CredentialError::NothingToUpdate);
        }

        // Missing file starts empty; other read errors too, rather than failing the request.
        let base = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %self.path.display(), "failed to read credential file: {e}");
                }
                String::new()
            }
        };

        let merged = merge_env_file(&base, &updates);
        tokio::fs::write(&self.path, merged)
            .await
            .map_err(|source| CredentialError::Write {
                path: self.path.clone(),
                source,
            })?;

        let mut overrides = self.overrides.write().await;
        for (key, value) in &updates {
            match overrides.iter_mut().find(|(k, _)| k == key) {
                Some(entry) => entry.1 = value.clone(),
                None => overrides.push((key.clone(), value.clone())),
            }
        }

        let keys: Vec<String> = updates.into_iter().map(|(k, _)| k).collect();
        info!(?keys, "credentials updated");
        Ok(keys)
    }
}

/// Mask a secret for display.
///
/// Up to 6 characters are fully hidden; longer values keep their first and
/// last 3 characters.
pub fn mask(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    let len = chars.len();
    if len <= 6 {
        return "*".repeat(len);
    }
    let head: String = chars[..3].iter().collect();
    let tail: String = chars[len - 3..].iter().collect();
    format!("{head}{}{tail}", "*".repeat((len - 6).max(1)))
}

/// Value of `key` in key=value text, trimmed.
pub fn read_env_value(text: &str, key: &str) -> Option<String> {
    text.lines()
        .filter_map(parse_line)
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v.trim().to_string())
}

/// Apply `updates` to key=value text.
///
/// Existing `KEY=` lines are replaced in place (first occurrence), every
/// other line is preserved, and missing keys are appended in order.
pub fn merge_env_file(base: &str, updates: &[(String, String)]) -> String {
    let mut pending: Vec<&(String, String)> = updates.iter().collect();

    let mut out: Vec<String> = if base.is_empty() {
        Vec::new()
    } else {
        base.split('\n')
            .map(|raw| {
                let line = raw.strip_suffix('\r').unwrap_or(raw);
                let Some((key, _)) = parse_line(line) else {
                    return line.to_string();
                };
                match pending.iter().position(|(k, _)| k == key) {
                    Some(index) => {
                        let (k, v) = pending.remove(index);
                        format!("{k}={v}")
                    }
                    None => line.to_string(),
                }
            })
            .collect()
    };

    // Keep a trailing newline after appended keys
    let trailing = out.last().is_some_and(String::is_empty) && !pending.is_empty();
    if trailing {
        out.pop();
    }
    out.extend(pending.into_iter().map(|(k, v)| format!("{k}={v}")));
    if trailing {
        out.push(String::new());
    }
    out.join("\n")
}

fn parse_line(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once('=')?;
    is_env_key(key).then_some((key, value))
}
