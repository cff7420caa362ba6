//! One sync cycle over every project.

use super::thread::ThreadSynchronizer;
use crate::error::{SyncError, SyncResultOf};
use crate::snapshot::SnapshotBuilder;
use crate::source::TaskSource;
use crate::types::{PageRequest, ProjectFailure, SyncResult};
use futures_util::future::join_all;
use std::sync::Arc;
use tracing::{error, info};

fn failure(project_id: &str, err: &SyncError) -> ProjectFailure {
    ProjectFailure {
        project_id: project_id.to_string(),
        message: err.to_string(),
        kind: err.kind(),
        orphaned_thread_id: err.orphaned_thread_id().map(str::to_string),
    }
}

pub struct Orchestrator {
    source: Arc<dyn TaskSource>,
    builder: SnapshotBuilder,
    synchronizer: ThreadSynchronizer,
    page: PageRequest,
}

impl Orchestrator {
    pub fn new(
        source: Arc<dyn TaskSource>,
        builder: SnapshotBuilder,
        synchronizer: ThreadSynchronizer,
    ) -> Self {
        Self {
            source,
            builder,
            synchronizer,
            page: PageRequest::default(),
        }
    }

    /// Restrict the cycle to a window of parent rows.
    pub fn with_page(mut self, page: PageRequest) -> Self {
        self.page = page;
        self
    }

    /// Run one cycle.
    ///
    /// Fails only when the parent rows cannot be loaded. Every per-project
    /// error is recorded in the result and the cycle moves on.
    pub async fn run(&self) -> SyncResultOf<SyncResult> {
        let parents = self.source.fetch_parent_rows(self.page).await?;
        info!(projects = parents.len(), "Starting sync cycle");

        let snapshots = join_all(parents.iter().map(|parent| self.builder.build(parent))).await;

        let mut result = SyncResult::default();
        for (parent, snapshot) in parents.iter().zip(snapshots) {
            info!(project_id = %parent.project_id, "[processing] {}", parent.project_id);

            let outcome = match snapshot {
                Ok(snapshot) => self.synchronizer.sync(&snapshot).await.map(|_| ()),
                Err(e) => Err(e),
            };

            match outcome {
                Ok(()) => result.record_success(),
                Err(e) => {
                    error!(project_id = %parent.project_id, kind = ?e.kind(), error = %e, "Project sync failed");
                    result.record_failure(failure(&parent.project_id, &e));
                }
            }
        }

        info!(success = result.success, failed = result.failed, "Sync cycle finished");
        Ok(result)
    }
}
