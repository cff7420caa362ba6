//! Configuration loader with tier-based merging.
//!
//! Loads configuration from multiple tiers and merges them field-by-field.

use super::merge::deep_merge_all;
use super::types::{Config, SourceBackend};
use anyhow::Result;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "TASK_THREAD_SYNC_CONFIG_PATH";

/// Configuration tier priority (lowest to highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigTier {
    /// Embedded defaults (lowest priority)
    Defaults = 0,
    /// Project-level config ($CWD/task-thread-sync/)
    Project = 1,
    /// User-level config (~/.task-thread-sync/)
    User = 2,
    /// Environment variables (highest priority)
    Environment = 3,
}

impl std::fmt::Display for ConfigTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigTier::Defaults => write!(f, "defaults"),
            ConfigTier::Project => write!(f, "project"),
            ConfigTier::User => write!(f, "user"),
            ConfigTier::Environment => write!(f, "environment"),
        }
    }
}

/// Directories searched for `config.yaml`.
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub project_dir: Option<PathBuf>,
    pub user_dir: Option<PathBuf>,
}

impl Default for ConfigPaths {
    fn default() -> Self {
        Self::discover()
    }
}

impl ConfigPaths {
    /// Discover configuration paths from environment and defaults.
    pub fn discover() -> Self {
        let user_dir = std::env::var("TASK_THREAD_SYNC_USER_DIR")
            .ok()
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|h| h.join(".task-thread-sync")));

        let project_dir = std::env::var("TASK_THREAD_SYNC_PROJECT_DIR")
            .ok()
            .map(PathBuf::from)
            .or_else(|| Some(PathBuf::from("task-thread-sync")));

        Self {
            project_dir,
            user_dir,
        }
    }

    /// Create paths with explicit directories.
    pub fn with_dirs(project_dir: Option<PathBuf>, user_dir: Option<PathBuf>) -> Self {
        Self {
            project_dir,
            user_dir,
        }
    }

    fn config_file(dir: Option<&Path>) -> Option<PathBuf> {
        let file = dir?.join("config.yaml");
        file.exists().then_some(file)
    }
}

/// Configuration loader that handles tier-based merging.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    pub paths: ConfigPaths,
    config: Config,
    /// Path to the highest-priority config file that was read (if any)
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Load configuration from all tiers, overriding with process environment.
    pub fn load() -> Result<Self> {
        Self::load_with(ConfigPaths::discover(), |key| std::env::var(key).ok())
    }

    /// Load configuration with explicit paths and an environment lookup.
    pub fn load_with<F>(paths: ConfigPaths, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(explicit_path) = env(CONFIG_PATH_ENV) {
            let path = PathBuf::from(&explicit_path);
            let mut config = Config::load(&path)?;
            apply_env_overrides(&mut config, &env);
            return Ok(Self {
                paths,
                config,
                config_path: Some(path),
            });
        }

        let mut tiers: Vec<Value> = vec![serde_json::to_value(Config::default())?];
        let mut config_path = None;

        for (tier, dir) in [
            (ConfigTier::Project, paths.project_dir.as_deref()),
            (ConfigTier::User, paths.user_dir.as_deref()),
        ] {
            let Some(file) = ConfigPaths::config_file(dir) else {
                continue;
            };
            match read_yaml(&file) {
                Ok(value) => {
                    debug!(tier = %tier, path = %file.display(), "Loaded config tier");
                    tiers.push(value);
                    config_path = Some(file);
                }
                Err(e) => {
                    warn!(tier = %tier, path = %file.display(), error = %e, "Skipping unreadable config file");
                }
            }
        }

        let mut config: Config = serde_json::from_value(deep_merge_all(tiers))?;
        apply_env_overrides(&mut config, &env);

        Ok(Self {
            paths,
            config,
            config_path,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Consume the loader and return the configuration.
    pub fn into_config(self) -> Config {
        self.config
    }

    /// Get the config file path that was used.
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }
}

fn read_yaml(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_yaml::from_str::<Value>(&content)?)
}

/// Apply environment variable overrides (the deployment's variable names).
fn apply_env_overrides<F>(config: &mut Config, env: &F)
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| env(key).filter(|v| !v.trim().is_empty());

    if let Some(token) = non_empty("DISCORD_BOT_TOKEN") {
        config.discord.bot_token = Some(token);
    }
    if let Some(channel) = non_empty("DISCORD_FORUM_CHANNEL_ID") {
        config.discord.forum_channel_id = Some(channel);
    }
    if let Some(mention) = non_empty("DISCORD_DELAY_MENTION") {
        config.discord.delay_mention = Some(mention);
    }
    if let Some(id) = non_empty("SPREADSHEET_ID") {
        config.source.spreadsheet_id = Some(id);
    }
    if let Some(token) = non_empty("GOOGLE_ACCESS_TOKEN") {
        config.source.access_token = Some(token);
    }
    if let Some(path) = non_empty("TASK_THREAD_SYNC_DB_PATH") {
        config.source.db_path = PathBuf::from(path);
        config.source.backend = SourceBackend::Local;
    }
    if let Some(key) = non_empty("API_KEY") {
        config.server.api_key = Some(key);
    }
    if let Some(port) = non_empty("PORT") {
        match port.parse() {
            Ok(port) => config.server.port = port,
            Err(_) => warn!(value = %port, "Ignoring invalid PORT"),
        }
    }
    if let Some(flag) = non_empty("TASK_THREAD_SYNC_PRODUCTION") {
        config.server.production = matches!(flag.as_str(), "1" | "true" | "yes");
    }
}
