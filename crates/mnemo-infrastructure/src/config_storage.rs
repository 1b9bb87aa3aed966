//! Config file storage.
//!
//! Loads `config.toml` into [`AppConfig`], overlays environment variables,
//! and validates that every value needed to run is present.

use crate::paths::MnemoPaths;
use mnemo_core::config::{AppConfig, PendingInputPolicy};
use mnemo_core::{MnemoError, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_TELEGRAM_TOKEN: &str = "TELEGRAM_TOKEN";
pub const ENV_OPENROUTER_API_KEY: &str = "OPENROUTER_API_KEY";
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_ALLOWED_USER_ID: &str = "ALLOWED_USER_ID";
pub const ENV_REPO_PATH: &str = "REPO_PATH";
pub const ENV_INSIGHT_TOKEN: &str = "INSIGHT_TOKEN";
pub const ENV_INSIGHT_LISTEN: &str = "INSIGHT_LISTEN";
pub const ENV_PENDING_INPUT: &str = "MNEMO_PENDING_INPUT";

/// Storage for the application configuration file.
///
/// Responsibilities:
/// - Read and parse `config.toml` (a missing file means "all defaults")
/// - Overlay environment variables, which win over the file
/// - Report every missing required value at once
///
/// Does NOT:
/// - Write or modify the config file (read-only)
pub struct ConfigStorage {
    path: PathBuf,
}

impl ConfigStorage {
    /// Creates a storage for the default path (`MNEMO_CONFIG` or
    /// `~/.config/mnemo/config.toml`).
    pub fn new() -> Result<Self> {
        let path = MnemoPaths::config_file().map_err(|e| MnemoError::config(e.to_string()))?;
        Ok(Self { path })
    }

    /// Creates a storage with a custom path.
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parses the config file without environment overrides or validation.
    pub fn load_file(&self) -> Result<AppConfig> {
        if !self.path.exists() {
            tracing::debug!(
                "[Config] No config file at {}, using defaults",
                self.path.display()
            );
            return Ok(AppConfig::default());
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(AppConfig::default());
        }

        toml::from_str(&content).map_err(|e| {
            MnemoError::config(format!(
                "Failed to parse configuration file at {}: {}",
                self.path.display(),
                e
            ))
        })
    }

    /// Loads file + process environment and validates the result.
    pub fn load(&self) -> Result<AppConfig> {
        let mut config = self.load_file()?;
        apply_env(&mut config, |key| std::env::var(key).ok())?;
        validate(&config)?;
        Ok(config)
    }
}

/// Overlays environment values onto `config`.
///
/// `lookup` abstracts the environment so callers (and tests) can supply
/// their own source. Empty values are ignored.
pub fn apply_env<F>(config: &mut AppConfig, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(token) = get(ENV_TELEGRAM_TOKEN) {
        config.telegram.token = Some(token);
    }
    if let Some(key) = get(ENV_OPENROUTER_API_KEY) {
        config.analysis.api_key = Some(key);
    }
    if let Some(key) = get(ENV_OPENAI_API_KEY) {
        config.speech.api_key = Some(key);
    }
    if let Some(raw) = get(ENV_ALLOWED_USER_ID) {
        let id = raw.trim().parse::<i64>().map_err(|_| {
            MnemoError::config(format!("{ENV_ALLOWED_USER_ID} must be an integer, got '{raw}'"))
        })?;
        config.telegram.allowed_user_id = Some(id);
    }
    if let Some(path) = get(ENV_REPO_PATH) {
        config.repository.path = PathBuf::from(path);
    }
    if let Some(token) = get(ENV_INSIGHT_TOKEN) {
        config.insight.token = Some(token);
    }
    if let Some(listen) = get(ENV_INSIGHT_LISTEN) {
        config.insight.listen = listen;
    }
    if let Some(policy) = get(ENV_PENDING_INPUT) {
        config.workflow.pending_input = match policy.trim().to_ascii_lowercase().as_str() {
            "replace" => PendingInputPolicy::Replace,
            "reject" => PendingInputPolicy::Reject,
            other => {
                return Err(MnemoError::config(format!(
                    "{ENV_PENDING_INPUT} must be 'replace' or 'reject', got '{other}'"
                )));
            }
        };
    }

    Ok(())
}

/// Checks that everything required to run is present.
pub fn validate(config: &AppConfig) -> Result<()> {
    let mut missing = Vec::new();

    if config.telegram.token.as_deref().is_none_or(str::is_empty) {
        missing.push(ENV_TELEGRAM_TOKEN);
    }
    if config.analysis.api_key.as_deref().is_none_or(str::is_empty) {
        missing.push(ENV_OPENROUTER_API_KEY);
    }
    if config.speech.api_key.as_deref().is_none_or(str::is_empty) {
        missing.push(ENV_OPENAI_API_KEY);
    }
    if config.telegram.allowed_user_id.is_none_or(|id| id == 0) {
        missing.push(ENV_ALLOWED_USER_ID);
    }

    if !missing.is_empty() {
        return Err(MnemoError::config(format!(
            "Missing required settings. Required: {}",
            missing.join(", ")
        )));
    }

    if config.insight.enabled && config.insight.token.as_deref().is_none_or(str::is_empty) {
        tracing::warn!("[Config] Insight endpoint enabled without a token; every event will be rejected");
    }

    Ok(())
}
