//! Chat forum collaborator: message payloads and the thread API.

pub mod discord;
pub mod retry;

pub use discord::DiscordForumClient;
pub use retry::{Attempt, RetryPolicy, Sleeper, TokioSleeper};

use crate::error::SyncResultOf;
use crate::types::ThreadIdentity;
use async_trait::async_trait;
use serde::Serialize;

/// Message body: header text plus structured summary blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MessagePayload {
    pub content: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
}

/// One structured block of a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Embed {
    pub title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl EmbedField {
    pub fn inline(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            inline: true,
        }
    }
}

/// Where a message goes: a new thread with this name, or an existing thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostTarget<'a> {
    NewThread { name: &'a str },
    Thread(&'a str),
}

/// Outcome of a create or post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadPost {
    pub thread_id: String,
    pub message_id: Option<String>,
}

/// Remote forum API consumed by the thread synchronizer.
///
/// Create is not idempotent: two creates make two threads.
#[async_trait]
pub trait ForumClient: Send + Sync {
    /// Create a thread whose starter message is `payload`, or post `payload`
    /// into an existing thread.
    async fn create_or_post(
        &self,
        target: PostTarget<'_>,
        payload: &MessagePayload,
    ) -> SyncResultOf<ThreadPost>;

    /// Rename a thread and optionally rewrite its starter message.
    ///
    /// A failed starter rewrite is logged and does not fail the rename.
    async fn update_thread_metadata(
        &self,
        thread_id: &str,
        name: &str,
        payload: Option<&MessagePayload>,
    ) -> SyncResultOf<ThreadIdentity>;

    async fn edit_message(
        &self,
        channel_id: &str,
        message_id: &str,
        payload: &MessagePayload,
    ) -> SyncResultOf<serde_json::Value>;
}
