//! Structured error types for the sync pipeline.

use serde::Serialize;

/// Failure categories for programmatic handling of per-project results.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureKind {
    // Fatal at startup
    Configuration,

    // Data source errors
    Source,

    // Chat platform errors
    Upstream,
    RateLimited,

    // Thread exists remotely but its id was not recorded
    WriteBack,

    Internal,
}

/// Errors raised while building snapshots or synchronizing threads.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// A required credential or identifier is missing.
    #[error("configuration error: {0} is not set")]
    Config(String),

    /// The tabular data source could not be read.
    #[error("data source error: {0}")]
    Source(String),

    /// Arguments to a thread id write-back were rejected before any write.
    #[error("invalid write-back: {0}")]
    InvalidWriteBack(String),

    /// The remote API answered with a non-2xx status other than 429.
    #[error("upstream API error: {status} {body}")]
    Upstream { status: u16, body: String },

    /// Every attempt in the backoff schedule was answered with 429.
    #[error("rate limited: gave up after {attempts} attempts")]
    RateLimited { attempts: usize },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Thread creation succeeded but the response carried no thread id.
    #[error("thread create response did not include a thread id")]
    MissingThreadId,

    /// The thread was created remotely but its id could not be written back.
    /// Needs manual reconciliation, not a retried create.
    #[error("thread {thread_id} was created but writing its id back failed: {message}")]
    WriteBack { thread_id: String, message: String },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl SyncError {
    pub fn data_source(message: impl Into<String>) -> Self {
        Self::Source(message.into())
    }

    pub fn config(key: impl Into<String>) -> Self {
        Self::Config(key.into())
    }

    /// Category of this error for results and HTTP responses.
    pub fn kind(&self) -> FailureKind {
        match self {
            SyncError::Config(_) => FailureKind::Configuration,
            SyncError::Source(_) | SyncError::InvalidWriteBack(_) | SyncError::Database(_) => {
                FailureKind::Source
            }
            SyncError::Upstream { .. } | SyncError::MissingThreadId => FailureKind::Upstream,
            SyncError::RateLimited { .. } => FailureKind::RateLimited,
            SyncError::WriteBack { .. } => FailureKind::WriteBack,
            SyncError::Transport(_) | SyncError::Decode(_) => FailureKind::Internal,
        }
    }

    /// Thread id that exists remotely without being recorded, if any.
    pub fn orphaned_thread_id(&self) -> Option<&str> {
        match self {
            SyncError::WriteBack { thread_id, .. } => Some(thread_id),
            _ => None,
        }
    }
}

/// Result type for pipeline operations.
pub type SyncResultOf<T> = std::result::Result<T, SyncError>;
