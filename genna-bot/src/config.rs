//! Bot configuration.
//!
//! JSON file at `~/.genna-bot/config.json` by default. Everything has a
//! default so a fresh install can run against a local backend with the
//! in-memory state store.

use crate::error::{ConfigError, ConfigResult};
use genna::state::UserRole;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level bot configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Claims backend settings.
    pub backend: BackendConfig,
    /// Knowledge base settings.
    pub qna: QnaConfig,
    /// Intent recognizer settings.
    pub recognizer: RecognizerConfig,
    /// Transcript auditing settings.
    pub audit: AuditConfig,
    /// Dialog engine settings.
    pub dialog: DialogConfig,
    /// State persistence settings.
    pub state: StateConfig,
}

/// Claims backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the claims REST service.
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Retry budget for transport failures.
    pub max_retries: u32,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            timeout_secs: 10,
            max_retries: 2,
        }
    }
}

/// Knowledge base settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QnaConfig {
    /// Whether "Ask Genna" is available.
    pub enabled: bool,
    /// Full URL of the answer endpoint.
    pub endpoint: String,
    /// Endpoint key sent in the Authorization header.
    pub endpoint_key: String,
    /// Minimum score an answer must reach.
    pub score_threshold: f64,
    /// How many answers to request.
    pub top: u32,
}

impl Default for QnaConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: String::new(),
            endpoint_key: String::new(),
            score_threshold: 50.0,
            top: 1,
        }
    }
}

/// Intent recognizer settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognizerConfig {
    /// Whether the free-text intent router is available.
    pub enabled: bool,
    /// Full URL of the recognition endpoint.
    pub endpoint: String,
    /// Subscription key sent as a query parameter.
    pub subscription_key: String,
}

/// Transcript auditing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Whether transcript events are recorded at all.
    pub enabled: bool,
    /// Record usernames with audited events.
    pub log_user_name: bool,
    /// Record original message text with audited events.
    pub log_original_message: bool,
}

/// Dialog engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogConfig {
    /// Dialog started for a fresh conversation.
    pub root_dialog: String,
    /// Deadline for one turn, in seconds.
    pub turn_timeout_secs: u64,
    /// Role assigned to users seen for the first time.
    pub default_role: UserRole,
    /// Default locale for new profiles.
    pub locale: String,
}

impl Default for DialogConfig {
    fn default() -> Self {
        Self {
            root_dialog: crate::dialogs::TOP_MENU.to_string(),
            turn_timeout_secs: 30,
            default_role: UserRole::Claimant,
            locale: "en".to_string(),
        }
    }
}

/// Which state store backs conversations and profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateBackend {
    /// In-memory, lost on restart.
    #[default]
    Memory,
    /// JSON files under the state directory.
    File,
}

/// State persistence settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StateConfig {
    /// Store implementation to use.
    pub backend: StateBackend,
    /// Override for the state directory (defaults to `~/.genna-bot/state`).
    pub path: Option<PathBuf>,
}

/// Severity of a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueLevel {
    /// The configuration cannot be used as-is.
    Error,
    /// Suspicious but usable.
    Warning,
}

/// One problem found while validating a configuration.
#[derive(Debug, Clone)]
pub struct ConfigIssue {
    /// Severity.
    pub level: IssueLevel,
    /// Dotted path of the offending field.
    pub field: String,
    /// Human-readable description.
    pub message: String,
}

impl BotConfig {
    /// Validate the configuration, returning every issue found.
    #[must_use]
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if self.backend.base_url.is_empty() {
            issues.push(ConfigIssue {
                level: IssueLevel::Error,
                field: "backend.base_url".to_string(),
                message: "backend base URL is required".to_string(),
            });
        }
        if self.qna.enabled && self.qna.endpoint.is_empty() {
            issues.push(ConfigIssue {
                level: IssueLevel::Warning,
                field: "qna.endpoint".to_string(),
                message: "qna enabled but no endpoint configured; questions will fail".to_string(),
            });
        }
        if self.recognizer.enabled && self.recognizer.endpoint.is_empty() {
            issues.push(ConfigIssue {
                level: IssueLevel::Warning,
                field: "recognizer.endpoint".to_string(),
                message: "recognizer enabled but no endpoint configured".to_string(),
            });
        }
        if self.dialog.turn_timeout_secs == 0 {
            issues.push(ConfigIssue {
                level: IssueLevel::Error,
                field: "dialog.turn_timeout_secs".to_string(),
                message: "turn timeout must be at least 1 second".to_string(),
            });
        }
        if self.dialog.root_dialog.is_empty() {
            issues.push(ConfigIssue {
                level: IssueLevel::Error,
                field: "dialog.root_dialog".to_string(),
                message: "root dialog id is required".to_string(),
            });
        }

        issues
    }

    /// Whether any issue is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.validate()
            .iter()
            .any(|issue| issue.level == IssueLevel::Error)
    }
}

/// Directory holding the config file and default state.
#[must_use]
pub fn config_dir() -> PathBuf {
    dirs_next::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".genna-bot")
}

/// Default path of the configuration file.
#[must_use]
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

/// Default directory for the file state store.
#[must_use]
pub fn state_dir() -> PathBuf {
    config_dir().join("state")
}

/// Write a default configuration file.
///
/// # Errors
///
/// Returns an error when the directory or file cannot be written.
pub async fn init_config() -> ConfigResult<()> {
    save_config(&BotConfig::default()).await
}

/// Load the configuration from the default path.
///
/// # Errors
///
/// Returns an error when the file is missing or does not parse.
pub async fn load_config() -> ConfigResult<BotConfig> {
    load_config_from(&config_path()).await
}

/// Load the configuration from an explicit path.
///
/// # Errors
///
/// Returns an error when the file is missing or does not parse.
pub async fn load_config_from(path: &std::path::Path) -> ConfigResult<BotConfig> {
    let content = tokio::fs::read_to_string(path).await?;
    let config: BotConfig = serde_json::from_str(&content)?;
    Ok(config)
}

/// Save the configuration to the default path.
///
/// # Errors
///
/// Returns an error when the directory or file cannot be written.
pub async fn save_config(config: &BotConfig) -> ConfigResult<()> {
    let dir = config_dir();
    tokio::fs::create_dir_all(&dir).await?;
    let content = serde_json::to_string_pretty(config)?;
    tokio::fs::write(config_path(), content).await?;
    Ok(())
}

/// Require a valid configuration or report the first error.
///
/// # Errors
///
/// Returns the first validation error as a [`ConfigError`].
pub fn require_valid(config: &BotConfig) -> ConfigResult<()> {
    if let Some(issue) = config
        .validate()
        .into_iter()
        .find(|issue| issue.level == IssueLevel::Error)
    {
        return Err(ConfigError::invalid(format!(
            "{}: {}",
            issue.field, issue.message
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_usable() {
        let config = BotConfig::default();
        assert!(!config.has_errors());
        assert_eq!(config.dialog.root_dialog, "top_menu");
        assert_eq!(config.dialog.turn_timeout_secs, 30);
    }

    #[test]
    fn test_validation_catches_errors() {
        let mut config = BotConfig::default();
        config.backend.base_url.clear();
        config.dialog.turn_timeout_secs = 0;

        let issues = config.validate();
        assert!(config.has_errors());
        assert!(issues.iter().any(|i| i.field == "backend.base_url"));
        assert!(issues.iter().any(|i| i.field == "dialog.turn_timeout_secs"));
    }

    #[test]
    fn test_roundtrip() {
        let config = BotConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: BotConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.backend.base_url, config.backend.base_url);
        assert_eq!(parsed.state.backend, StateBackend::Memory);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let parsed: BotConfig =
            serde_json::from_str(r#"{"backend": {"base_url": "http://claims.internal"}}"#).unwrap();
        assert_eq!(parsed.backend.base_url, "http://claims.internal");
        assert_eq!(parsed.backend.max_retries, 2);
        assert_eq!(parsed.dialog.root_dialog, "top_menu");
    }
}
