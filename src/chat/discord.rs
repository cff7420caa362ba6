//! Discord forum channel client (REST v10).

use super::retry::{Attempt, RetryPolicy, Sleeper, TokioSleeper};
use super::{ForumClient, MessagePayload, PostTarget, ThreadPost};
use crate::config::DiscordConfig;
use crate::error::{SyncError, SyncResultOf};
use crate::format::truncate_chars;
use crate::types::ThreadIdentity;
use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Discord's ceiling for channel and thread names.
pub const MAX_THREAD_NAME_CHARS: usize = 100;

pub struct DiscordForumClient {
    client: Client,
    base_url: String,
    bot_token: String,
    forum_channel_id: String,
    auto_archive_minutes: u32,
    user_agent: String,
    retry: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl DiscordForumClient {
    pub fn new(
        base_url: impl Into<String>,
        bot_token: impl Into<String>,
        forum_channel_id: impl Into<String>,
    ) -> Self {
        let defaults = DiscordConfig::default();
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bot_token: bot_token.into(),
            forum_channel_id: forum_channel_id.into(),
            auto_archive_minutes: defaults.auto_archive_minutes,
            user_agent: defaults.user_agent,
            retry: RetryPolicy::default(),
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Build from config; fails when the token or forum channel is missing.
    pub fn from_config(config: &DiscordConfig) -> SyncResultOf<Self> {
        let bot_token = config
            .bot_token
            .clone()
            .ok_or_else(|| SyncError::config("DISCORD_BOT_TOKEN"))?;
        let forum_channel_id = config
            .forum_channel_id
            .clone()
            .ok_or_else(|| SyncError::config("DISCORD_FORUM_CHANNEL_ID"))?;

        let mut client = Self::new(config.api_base_url.clone(), bot_token, forum_channel_id)
            .with_retry(RetryPolicy::from_millis(&config.backoff_ms));
        client.auto_archive_minutes = config.auto_archive_minutes;
        client.user_agent = config.user_agent.clone();
        Ok(client)
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Replace the wait between retries (tests record instead of sleeping).
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Send one call with rate-limit retries. `None` is an empty (204) body.
    async fn request(&self, method: Method, path: &str, body: &Value) -> SyncResultOf<Option<Value>> {
        let url = format!("{}{}", self.base_url, path);
        let label = format!("{} {}", method, path);
        self.retry
            .run(self.sleeper.as_ref(), &label, || {
                self.send_once(method.clone(), &url, body)
            })
            .await
    }

    async fn send_once(&self, method: Method, url: &str, body: &Value) -> Attempt<Option<Value>> {
        let response = match self
            .client
            .request(method, url)
            .header("Authorization", format!("Bot {}", self.bot_token))
            .header("User-Agent", &self.user_agent)
            .json(body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return Attempt::Fatal(e.into()),
        };

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Attempt::Retryable;
        }
        if status == StatusCode::NO_CONTENT {
            return Attempt::Success(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Attempt::Fatal(SyncError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        match response.text().await {
            Ok(text) if text.trim().is_empty() => Attempt::Success(None),
            Ok(text) => match serde_json::from_str(&text) {
                Ok(value) => Attempt::Success(Some(value)),
                Err(e) => Attempt::Fatal(e.into()),
            },
            Err(e) => Attempt::Fatal(e.into()),
        }
    }

    fn payload_value(payload: &MessagePayload) -> SyncResultOf<Value> {
        Ok(serde_json::to_value(payload)?)
    }
}

fn str_field<'a>(body: Option<&'a Value>, pointer: &str) -> Option<&'a str> {
    body?.pointer(pointer)?.as_str()
}

#[async_trait]
impl ForumClient for DiscordForumClient {
    async fn create_or_post(
        &self,
        target: PostTarget<'_>,
        payload: &MessagePayload,
    ) -> SyncResultOf<ThreadPost> {
        let message = Self::payload_value(payload)?;

        match target {
            PostTarget::NewThread { name } => {
                let body = json!({
                    "name": truncate_chars(name, MAX_THREAD_NAME_CHARS),
                    "auto_archive_duration": self.auto_archive_minutes,
                    "message": message,
                });
                let path = format!("/channels/{}/threads", self.forum_channel_id);
                let created = self.request(Method::POST, &path, &body).await?;

                let thread_id = str_field(created.as_ref(), "/id")
                    .ok_or(SyncError::MissingThreadId)?
                    .to_string();
                let message_id = str_field(created.as_ref(), "/message/id")
                    .or_else(|| str_field(created.as_ref(), "/last_message_id"))
                    .map(str::to_string);
                info!(thread_id = %thread_id, "Created forum thread");
                Ok(ThreadPost {
                    thread_id,
                    message_id,
                })
            }
            PostTarget::Thread(thread_id) => {
                let path = format!("/channels/{}/messages", thread_id);
                let posted = self.request(Method::POST, &path, &message).await?;
                debug!(thread_id, "Posted message");
                Ok(ThreadPost {
                    thread_id: thread_id.to_string(),
                    message_id: str_field(posted.as_ref(), "/id").map(str::to_string),
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
        let name = truncate_chars(name, MAX_THREAD_NAME_CHARS);
        let renamed = self
            .request(
                Method::PATCH,
                &format!("/channels/{}", thread_id),
                &json!({ "name": name }),
            )
            .await?;

        if let Some(payload) = payload {
            // Forum starter messages share the thread's id
            let path = format!("/channels/{}/messages/{}", thread_id, thread_id);
            let starter = match Self::payload_value(payload) {
                Ok(body) => self.request(Method::PATCH, &path, &body).await.map(|_| ()),
                Err(e) => Err(e),
            };
            if let Err(e) = starter {
                warn!(thread_id, error = %e, "Starter message update failed, keeping rename");
            }
        }

        Ok(ThreadIdentity {
            thread_id: str_field(renamed.as_ref(), "/id")
                .unwrap_or(thread_id)
                .to_string(),
            name: str_field(renamed.as_ref(), "/name")
                .map(str::to_string)
                .unwrap_or(name),
        })
    }

    async fn edit_message(
        &self,
        channel_id: &str,
        message_id: &str,
        payload: &MessagePayload,
    ) -> SyncResultOf<Value> {
        let path = format!("/channels/{}/messages/{}", channel_id, message_id);
        let edited = self
            .request(Method::PATCH, &path, &Self::payload_value(payload)?)
            .await?;
        Ok(edited.unwrap_or(Value::Null))
    }
}
