//! Configuration model.
//!
//! Deserialized from `config.toml` and then overlaid with environment
//! variables by the infrastructure layer.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_REPO_PATH: &str = "/root/memoryBase";
pub const DEFAULT_ANALYSIS_MODEL: &str = "anthropic/claude-sonnet-4";
pub const DEFAULT_ANALYSIS_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_SPEECH_MODEL: &str = "whisper-1";
pub const DEFAULT_SPEECH_URL: &str = "https://api.openai.com/v1/audio/transcriptions";
pub const DEFAULT_INSIGHT_LISTEN: &str = "127.0.0.1:8787";

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub repository: RepositoryConfig,
    #[serde(default)]
    pub insight: InsightConfig,
    #[serde(default)]
    pub workflow: WorkflowConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct TelegramConfig {
    #[serde(default)]
    pub token: Option<String>,
    /// The single chat identity allowed to use the bot.
    #[serde(default)]
    pub allowed_user_id: Option<i64>,
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: None,
            allowed_user_id: None,
            poll_timeout_secs: default_poll_timeout_secs(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_analysis_model")]
    pub model: String,
    #[serde(default = "default_analysis_url")]
    pub base_url: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Upper bound for one analysis call.
    #[serde(default = "default_analysis_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_analysis_model(),
            base_url: default_analysis_url(),
            temperature: default_temperature(),
            timeout_secs: default_analysis_timeout_secs(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct SpeechConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_speech_model")]
    pub model: String,
    #[serde(default = "default_speech_url")]
    pub base_url: String,
    /// ISO-639-1 hint; `None` lets the service auto-detect.
    #[serde(default = "default_speech_language")]
    pub language: Option<String>,
    #[serde(default = "default_speech_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_speech_model(),
            base_url: default_speech_url(),
            language: default_speech_language(),
            timeout_secs: default_speech_timeout_secs(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct RepositoryConfig {
    #[serde(default = "default_repo_path")]
    pub path: PathBuf,
    /// When false, pull/commit/push are skipped entirely.
    #[serde(default = "default_true")]
    pub sync: bool,
    #[serde(default = "default_git_timeout_secs")]
    pub git_timeout_secs: u64,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            path: default_repo_path(),
            sync: true,
            git_timeout_secs: default_git_timeout_secs(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct InsightConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_insight_listen")]
    pub listen: String,
    /// Bearer token required on inbound events. Unset rejects every event.
    #[serde(default)]
    pub token: Option<String>,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            listen: default_insight_listen(),
            token: None,
        }
    }
}

/// What happens when new input arrives while a proposal is still unconfirmed.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PendingInputPolicy {
    /// Replace the pending proposal and tell the user it was replaced.
    #[default]
    Replace,
    /// Refuse the new input until the pending proposal is resolved.
    Reject,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct WorkflowConfig {
    #[serde(default)]
    pub pending_input: PendingInputPolicy,
}

fn default_poll_timeout_secs() -> u64 {
    30
}

fn default_analysis_model() -> String {
    DEFAULT_ANALYSIS_MODEL.to_string()
}

fn default_analysis_url() -> String {
    DEFAULT_ANALYSIS_URL.to_string()
}

fn default_temperature() -> f32 {
    0.3
}

fn default_analysis_timeout_secs() -> u64 {
    60
}

fn default_speech_model() -> String {
    DEFAULT_SPEECH_MODEL.to_string()
}

fn default_speech_url() -> String {
    DEFAULT_SPEECH_URL.to_string()
}

fn default_speech_language() -> Option<String> {
    Some("ru".to_string())
}

fn default_speech_timeout_secs() -> u64 {
    120
}

fn default_repo_path() -> PathBuf {
    PathBuf::from(DEFAULT_REPO_PATH)
}

fn default_git_timeout_secs() -> u64 {
    120
}

fn default_insight_listen() -> String {
    DEFAULT_INSIGHT_LISTEN.to_string()
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.repository.path, PathBuf::from(DEFAULT_REPO_PATH));
        assert_eq!(config.analysis.timeout_secs, 60);
        assert_eq!(config.speech.language.as_deref(), Some("ru"));
        assert_eq!(config.workflow.pending_input, PendingInputPolicy::Replace);
    }

    #[test]
    fn test_partial_sections() {
        let config: AppConfig = toml::from_str(
            r#"
            [telegram]
            allowed_user_id = 1234

            [workflow]
            pending_input = "reject"

            [repository]
            path = "/srv/kb"
            sync = false
            "#,
        )
        .unwrap();

        assert_eq!(config.telegram.allowed_user_id, Some(1234));
        assert_eq!(config.telegram.poll_timeout_secs, 30);
        assert_eq!(config.workflow.pending_input, PendingInputPolicy::Reject);
        assert_eq!(config.repository.path, PathBuf::from("/srv/kb"));
        assert!(!config.repository.sync);
        assert_eq!(config.repository.git_timeout_secs, 120);
    }
}
