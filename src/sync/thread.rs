//! Per-project thread lifecycle: create once, then rename and post each cycle.

use crate::chat::{ForumClient, PostTarget, ThreadPost};
use crate::error::{SyncError, SyncResultOf};
use crate::format::{MessageFormatter, thread_name};
use crate::source::TaskSource;
use crate::types::{ProjectSnapshot, ThreadIdentity};
use std::sync::Arc;
use tracing::{error, info};

/// What a sync did for one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThreadOutcome {
    /// New thread created and its id written back.
    Created(ThreadPost),
    /// Existing thread renamed and a status update posted.
    Updated {
        identity: ThreadIdentity,
        post: ThreadPost,
    },
}

impl ThreadOutcome {
    pub fn thread_id(&self) -> &str {
        match self {
            ThreadOutcome::Created(post) => &post.thread_id,
            ThreadOutcome::Updated { post, .. } => &post.thread_id,
        }
    }
}

/// Drives the forum API for one snapshot at a time.
#[derive(Clone)]
pub struct ThreadSynchronizer {
    client: Arc<dyn ForumClient>,
    source: Arc<dyn TaskSource>,
    formatter: MessageFormatter,
}

impl ThreadSynchronizer {
    pub fn new(
        client: Arc<dyn ForumClient>,
        source: Arc<dyn TaskSource>,
        formatter: MessageFormatter,
    ) -> Self {
        Self {
            client,
            source,
            formatter,
        }
    }

    pub async fn sync(&self, snapshot: &ProjectSnapshot) -> SyncResultOf<ThreadOutcome> {
        match snapshot.thread_id.as_deref() {
            None => self.create(snapshot).await,
            Some(thread_id) => self.update(snapshot, thread_id).await,
        }
    }

    async fn create(&self, snapshot: &ProjectSnapshot) -> SyncResultOf<ThreadOutcome> {
        let name = thread_name(snapshot);
        let payload = self.formatter.render_initial(snapshot);
        let post = self
            .client
            .create_or_post(PostTarget::NewThread { name: &name }, &payload)
            .await?;

        // The thread exists remotely from here on; a failed write-back must
        // not lead to a second create.
        if let Err(e) = self
            .source
            .update_thread_id(snapshot.row_index, &post.thread_id)
            .await
        {
            error!(
                project_id = %snapshot.project_id,
                thread_id = %post.thread_id,
                error = %e,
                "Thread created but writing its id back failed; reconcile manually"
            );
            return Err(SyncError::WriteBack {
                thread_id: post.thread_id,
                message: e.to_string(),
            });
        }

        info!(project_id = %snapshot.project_id, thread_id = %post.thread_id, "Created new thread");
        Ok(ThreadOutcome::Created(post))
    }

    async fn update(&self, snapshot: &ProjectSnapshot, thread_id: &str) -> SyncResultOf<ThreadOutcome> {
        let name = thread_name(snapshot);
        let starter = self.formatter.render_initial(snapshot);
        let identity = self
            .client
            .update_thread_metadata(thread_id, &name, Some(&starter))
            .await?;

        let update = self.formatter.render_status_update(snapshot);
        let post = self
            .client
            .create_or_post(PostTarget::Thread(thread_id), &update)
            .await?;

        info!(project_id = %snapshot.project_id, thread_id, "Posted status update");
        Ok(ThreadOutcome::Updated { identity, post })
    }
}
