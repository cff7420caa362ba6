//! Configuration types and structures.
//!
//! This module contains all the configuration types used throughout the application.

use crate::error::SyncError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default Discord REST API root.
pub const DEFAULT_DISCORD_API_BASE_URL: &str = "https://discord.com/api/v10";

/// Default Google Sheets API root.
pub const DEFAULT_SHEETS_API_BASE_URL: &str = "https://sheets.googleapis.com";

/// Default port for the sync trigger endpoint.
pub const DEFAULT_SERVER_PORT: u16 = 3000;

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub discord: DiscordConfig,

    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub format: FormatConfig,

    #[serde(default)]
    pub markers: MarkersConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

/// Chat platform configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordConfig {
    /// Bot token used for `Authorization: Bot <token>`.
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Forum channel that owns one thread per project.
    #[serde(default)]
    pub forum_channel_id: Option<String>,

    #[serde(default = "default_discord_api_base_url")]
    pub api_base_url: String,

    /// Delays between retries of a rate-limited call, in milliseconds.
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: Vec<u64>,

    /// Minutes of inactivity before Discord archives a thread (default: 10080 = 7 days).
    #[serde(default = "default_auto_archive_minutes")]
    pub auto_archive_minutes: u32,

    /// User id mentioned in status updates when a project is delayed.
    #[serde(default)]
    pub delay_mention: Option<String>,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            forum_channel_id: None,
            api_base_url: default_discord_api_base_url(),
            backoff_ms: default_backoff_ms(),
            auto_archive_minutes: default_auto_archive_minutes(),
            delay_mention: None,
            user_agent: default_user_agent(),
        }
    }
}

fn default_discord_api_base_url() -> String {
    DEFAULT_DISCORD_API_BASE_URL.to_string()
}

fn default_backoff_ms() -> Vec<u64> {
    vec![1000, 2000, 4000]
}

fn default_auto_archive_minutes() -> u32 {
    10_080
}

fn default_user_agent() -> String {
    format!(
        "DiscordBot (https://github.com/task-thread-sync, {})",
        env!("CARGO_PKG_VERSION")
    )
}

/// Which grid backend holds the project sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceBackend {
    /// Google Sheets values API (default)
    #[default]
    Sheets,
    /// Local SQLite mirror of the sheet
    Local,
}

/// Tabular data source configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub backend: SourceBackend,

    #[serde(default)]
    pub spreadsheet_id: Option<String>,

    /// Tab holding both project and task rows.
    #[serde(default = "default_sheet_name")]
    pub sheet_name: String,

    /// OAuth access token for the Sheets API, obtained externally.
    #[serde(default)]
    pub access_token: Option<String>,

    #[serde(default = "default_sheets_api_base_url")]
    pub sheets_api_base_url: String,

    /// Path to the local SQLite sheet mirror.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    #[serde(default)]
    pub columns: ColumnLayout,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            backend: SourceBackend::default(),
            spreadsheet_id: None,
            sheet_name: default_sheet_name(),
            access_token: None,
            sheets_api_base_url: default_sheets_api_base_url(),
            db_path: default_db_path(),
            columns: ColumnLayout::default(),
        }
    }
}

fn default_sheet_name() -> String {
    "シート1".to_string()
}

fn default_sheets_api_base_url() -> String {
    DEFAULT_SHEETS_API_BASE_URL.to_string()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("task-thread-sync/sheet.db")
}

/// 0-based column indices of the project sheet (A = 0).
///
/// Project rows and task rows share one tab: every task row repeats its
/// project id in the project id column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnLayout {
    pub project_id: usize,
    pub project_title: usize,
    pub owner: usize,
    pub thread_id: usize,
    pub task_id: usize,
    pub task_title: usize,
    /// Not part of the default sheet layout.
    pub assignee: Option<usize>,
    pub due_date: usize,
    pub status: usize,
    pub completed_at: usize,
    pub notes: usize,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            project_id: 1,     // B
            project_title: 2,  // C
            owner: 3,          // D
            thread_id: 9,      // J
            task_id: 10,       // K
            task_title: 11,    // L
            assignee: None,
            due_date: 14,      // O
            status: 15,        // P
            completed_at: 16,  // Q
            notes: 17,         // R
        }
    }
}

impl ColumnLayout {
    /// Named columns in layout order, keyed the way header labels are reported.
    pub fn named_columns(&self) -> Vec<(&'static str, usize)> {
        let mut columns = vec![
            ("PROJECT_ID", self.project_id),
            ("PROJECT_TITLE", self.project_title),
            ("OWNER", self.owner),
            ("THREAD_ID", self.thread_id),
            ("TASK_ID", self.task_id),
            ("TASK_TITLE", self.task_title),
        ];
        if let Some(assignee) = self.assignee {
            columns.push(("ASSIGNEE", assignee));
        }
        columns.extend([
            ("DUE_DATE", self.due_date),
            ("STATUS", self.status),
            ("COMPLETED_AT", self.completed_at),
            ("NOTES", self.notes),
        ]);
        columns
    }
}

/// Message rendering configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatConfig {
    /// Per-field character ceiling for headers and block text.
    #[serde(default = "default_max_content_length")]
    pub max_content_length: usize,

    /// Fixed offset used for "today" and rendered timestamps (default: +09:00).
    #[serde(default = "default_utc_offset_minutes")]
    pub utc_offset_minutes: i32,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            max_content_length: default_max_content_length(),
            utc_offset_minutes: default_utc_offset_minutes(),
        }
    }
}

fn default_max_content_length() -> usize {
    1800
}

fn default_utc_offset_minutes() -> i32 {
    540
}

/// Change marker configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MarkersConfig {
    /// Mark incomplete tasks due within this many days (0 disables).
    #[serde(default)]
    pub deadline_window_days: u32,
}

/// Sync trigger server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_port")]
    pub port: u16,

    /// Value required in the `x-api-key` header.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Hide error details from trigger responses.
    #[serde(default)]
    pub production: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_server_port(),
            api_key: None,
            production: false,
        }
    }
}

fn default_server_port() -> u16 {
    DEFAULT_SERVER_PORT
}

impl Config {
    /// Load configuration from file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Check every credential a sync cycle needs, naming the first one missing.
    pub fn validate_for_sync(&self) -> std::result::Result<(), SyncError> {
        require(&self.discord.bot_token, "DISCORD_BOT_TOKEN")?;
        require(&self.discord.forum_channel_id, "DISCORD_FORUM_CHANNEL_ID")?;
        if self.discord.backoff_ms.is_empty() {
            tracing::warn!("discord.backoff_ms is empty; rate-limited calls will not be retried");
        }
        if self.source.backend == SourceBackend::Sheets {
            require(&self.source.spreadsheet_id, "SPREADSHEET_ID")?;
            require(&self.source.access_token, "GOOGLE_ACCESS_TOKEN")?;
        }
        Ok(())
    }

    /// Check everything `validate_for_sync` does plus the trigger API key.
    pub fn validate_for_server(&self) -> std::result::Result<(), SyncError> {
        self.validate_for_sync()?;
        require(&self.server.api_key, "API_KEY")
    }

    /// Ensure the local sheet database directory exists.
    pub fn ensure_db_dir(&self) -> Result<()> {
        if let Some(parent) = self.source.db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

fn require(value: &Option<String>, key: &str) -> std::result::Result<(), SyncError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(()),
        _ => Err(SyncError::config(key)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_config() -> Config {
        let mut config = Config::default();
        config.discord.bot_token = Some("token".into());
        config.discord.forum_channel_id = Some("123".into());
        config.source.spreadsheet_id = Some("sheet".into());
        config.source.access_token = Some("ya29.token".into());
        config
    }

    #[test]
    fn test_defaults_match_sheet_deployment() {
        let config = Config::default();
        assert_eq!(config.discord.backoff_ms, vec![1000, 2000, 4000]);
        assert_eq!(config.discord.auto_archive_minutes, 10_080);
        assert_eq!(config.format.max_content_length, 1800);
        assert_eq!(config.format.utc_offset_minutes, 540);
        assert_eq!(config.source.columns.thread_id, 9);
        assert_eq!(config.source.columns.status, 15);
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_validate_for_sync_names_missing_key() {
        let mut config = complete_config();
        assert!(config.validate_for_sync().is_ok());

        config.discord.bot_token = Some("   ".into());
        let err = config.validate_for_sync().unwrap_err();
        assert!(matches!(err, SyncError::Config(ref k) if k == "DISCORD_BOT_TOKEN"));
    }

    #[test]
    fn test_local_backend_does_not_need_sheet_credentials() {
        let mut config = complete_config();
        config.source.backend = SourceBackend::Local;
        config.source.spreadsheet_id = None;
        config.source.access_token = None;
        assert!(config.validate_for_sync().is_ok());
    }

    #[test]
    fn test_validate_for_server_requires_api_key() {
        let mut config = complete_config();
        let err = config.validate_for_server().unwrap_err();
        assert!(matches!(err, SyncError::Config(ref k) if k == "API_KEY"));

        config.server.api_key = Some("secret".into());
        assert!(config.validate_for_server().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
discord:
  forum_channel_id: "42"
source:
  backend: local
  columns:
    assignee: 12
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.discord.forum_channel_id.as_deref(), Some("42"));
        assert_eq!(config.discord.backoff_ms, vec![1000, 2000, 4000]);
        assert_eq!(config.source.backend, SourceBackend::Local);
        assert_eq!(config.source.columns.assignee, Some(12));
        assert_eq!(config.source.columns.task_id, 10);
    }

    #[test]
    fn test_named_columns_include_assignee_only_when_set() {
        let mut layout = ColumnLayout::default();
        assert!(!layout.named_columns().iter().any(|(k, _)| *k == "ASSIGNEE"));
        layout.assignee = Some(12);
        assert!(layout.named_columns().contains(&("ASSIGNEE", 12)));
    }
}
