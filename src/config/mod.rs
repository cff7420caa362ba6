//! Unified configuration system.
//!
//! Consolidates configuration from tiers with field-by-field YAML merging:
//! 1. **Defaults** - compiled in
//! 2. **Project** - `$CWD/task-thread-sync/config.yaml`
//! 3. **User** - `~/.task-thread-sync/config.yaml`
//! 4. **Environment** - deployment variables
//!
//! ## Environment Variables
//! - `TASK_THREAD_SYNC_CONFIG_PATH` - Explicit config file (skips tier merging)
//! - `TASK_THREAD_SYNC_PROJECT_DIR` / `TASK_THREAD_SYNC_USER_DIR` - Tier directories
//! - `DISCORD_BOT_TOKEN`, `DISCORD_FORUM_CHANNEL_ID`, `DISCORD_DELAY_MENTION`
//! - `SPREADSHEET_ID`, `GOOGLE_ACCESS_TOKEN`
//! - `TASK_THREAD_SYNC_DB_PATH` - Local sheet mirror (selects the local backend)
//! - `API_KEY`, `PORT`, `TASK_THREAD_SYNC_PRODUCTION`

mod loader;
mod merge;
mod types;

pub use loader::{CONFIG_PATH_ENV, ConfigLoader, ConfigPaths, ConfigTier};
pub use merge::{deep_merge, deep_merge_all};
pub use types::*;
