//! Shared fixtures for integration tests: sheet rows in the default column
//! layout and a forum client that records every call.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use task_thread_sync::chat::{ForumClient, MessagePayload, PostTarget, Sleeper, ThreadPost};
use task_thread_sync::db::Database;
use task_thread_sync::error::{SyncError, SyncResultOf};
use task_thread_sync::source::Grid;
use task_thread_sync::types::ThreadIdentity;

/// 2025-06-15 12:00 in UTC+9.
pub fn cycle_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 15, 3, 0, 0).unwrap()
}

fn cells(entries: &[(usize, &str)]) -> Vec<String> {
    let mut cells = vec![String::new(); 18];
    for (column, value) in entries {
        cells[*column] = value.to_string();
    }
    cells
}

/// Header row; labels only for the columns named in `labels`.
pub fn header(labels: &[(usize, &str)]) -> Vec<String> {
    cells(labels)
}

/// One task row in the default layout (B, C, D, J, K, L, O, P).
pub fn task_row(
    project: &str,
    title: &str,
    thread: &str,
    task: &str,
    task_title: &str,
    due: &str,
    status: &str,
) -> Vec<String> {
    cells(&[
        (1, project),
        (2, title),
        (3, "owner"),
        (9, thread),
        (10, task),
        (11, task_title),
        (14, due),
        (15, status),
    ])
}

/// In-memory database loaded with `rows` under `header`.
pub fn setup_db(header: Vec<String>, rows: Vec<Vec<String>>) -> Database {
    let db = Database::open_in_memory().expect("Failed to create in-memory database");
    db.replace_grid(&Grid { header, rows })
        .expect("Failed to load grid");
    db
}

/// Sleeper that records requested delays and returns immediately.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }

    pub fn total(&self) -> Duration {
        self.delays().iter().sum()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, delay: Duration) {
        self.delays.lock().unwrap().push(delay);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ForumCall {
    Create { name: String, payload: MessagePayload },
    Post { thread_id: String, payload: MessagePayload },
    UpdateMetadata { thread_id: String, name: String, starter: Option<MessagePayload> },
    Edit { channel_id: String, message_id: String },
}

/// Forum client fake. Created threads get ids `thread-1`, `thread-2`, ...
#[derive(Default)]
pub struct RecordingForum {
    calls: Mutex<Vec<ForumCall>>,
    next_id: AtomicUsize,
    /// Thread names (for creates) or thread ids that answer with a 500.
    failing: HashSet<String>,
}

impl RecordingForum {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for(targets: &[&str]) -> Self {
        Self {
            failing: targets.iter().map(|t| t.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<ForumCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn creates(&self) -> Vec<ForumCall> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, ForumCall::Create { .. }))
            .collect()
    }

    fn record(&self, call: ForumCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn check(&self, target: &str) -> SyncResultOf<()> {
        if self.failing.contains(target) {
            return Err(SyncError::Upstream {
                status: 500,
                body: "internal error".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ForumClient for RecordingForum {
    async fn create_or_post(
        &self,
        target: PostTarget<'_>,
        payload: &MessagePayload,
    ) -> SyncResultOf<ThreadPost> {
        match target {
            PostTarget::NewThread { name } => {
                self.record(ForumCall::Create {
                    name: name.to_string(),
                    payload: payload.clone(),
                });
                self.check(name)?;
                let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
                Ok(ThreadPost {
                    thread_id: format!("thread-{}", n),
                    message_id: Some(format!("message-{}", n)),
                })
            }
            PostTarget::Thread(thread_id) => {
                self.record(ForumCall::Post {
                    thread_id: thread_id.to_string(),
                    payload: payload.clone(),
                });
                self.check(thread_id)?;
                Ok(ThreadPost {
                    thread_id: thread_id.to_string(),
                    message_id: None,
                })
            }
        }
    }

    async fn update_thread_metadata(
        &self,
        thread_id: &str,
        name: &str,
        payload: Option<&MessagePayload>,
    ) -> SyncResultOf<ThreadIdentity> {
        self.record(ForumCall::UpdateMetadata {
            thread_id: thread_id.to_string(),
            name: name.to_string(),
            starter: payload.cloned(),
        });
        self.check(thread_id)?;
        Ok(ThreadIdentity {
            thread_id: thread_id.to_string(),
            name: name.to_string(),
        })
    }

    async fn edit_message(
        &self,
        channel_id: &str,
        message_id: &str,
        _payload: &MessagePayload,
    ) -> SyncResultOf<serde_json::Value> {
        self.record(ForumCall::Edit {
            channel_id: channel_id.to_string(),
            message_id: message_id.to_string(),
        });
        Ok(serde_json::json!({"id": message_id}))
    }
}
