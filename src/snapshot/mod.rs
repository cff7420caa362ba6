//! Per-cycle project snapshots.
//!
//! A snapshot combines one parent row with its validated children, change
//! markers, completion metrics and progress status. Snapshots are rebuilt
//! from the data source every cycle and never mutated afterwards.

pub mod completion;
pub mod markers;
pub mod progress;
pub mod validate;

pub use markers::{ChangeDetector, DueSoonDetector, NoChanges};

use crate::clock::{Clock, SystemClock, local_today};
use crate::error::SyncResultOf;
use crate::source::{HeaderLabels, TaskSource};
use crate::types::{ParentRow, ProjectSnapshot, TaskField};
use chrono::{FixedOffset, Offset, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

/// Builds `ProjectSnapshot`s from a data source.
#[derive(Clone)]
pub struct SnapshotBuilder {
    source: Arc<dyn TaskSource>,
    detector: Arc<dyn ChangeDetector>,
    clock: Arc<dyn Clock>,
    offset: FixedOffset,
}

impl SnapshotBuilder {
    /// Builder with no change detection, the wall clock and UTC.
    pub fn new(source: Arc<dyn TaskSource>) -> Self {
        Self {
            source,
            detector: Arc::new(NoChanges),
            clock: Arc::new(SystemClock),
            offset: Utc.fix(),
        }
    }

    pub fn with_detector(mut self, detector: Arc<dyn ChangeDetector>) -> Self {
        self.detector = detector;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Offset that defines "today" for overdue checks.
    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }

    /// Build the snapshot of one project.
    ///
    /// A failed child fetch is returned to the caller. Missing or failing
    /// header labels fall back to canonical field keys.
    pub async fn build(&self, parent: &ParentRow) -> SyncResultOf<ProjectSnapshot> {
        let raw = self.source.fetch_child_rows(&parent.project_id).await?;

        let labels = match self.source.fetch_header_labels().await {
            Ok(labels) => labels.unwrap_or_default(),
            Err(e) => {
                warn!(project_id = %parent.project_id, error = %e, "Header labels unavailable, using field keys");
                HeaderLabels::default()
            }
        };

        let (mut children, invalid_children) =
            validate::partition(&raw, &TaskField::REQUIRED, &labels);
        markers::annotate(self.detector.as_ref(), &parent.project_id, &mut children);

        let now = self.clock.now();
        let completion = completion::calculate(&raw, now);
        let progress_status =
            progress::classify(&children, local_today(now, self.offset), self.offset);

        debug!(
            project_id = %parent.project_id,
            valid = children.len(),
            invalid = invalid_children.len(),
            percentage = completion.percentage,
            "Built snapshot"
        );

        Ok(ProjectSnapshot {
            row_index: parent.row_index,
            project_id: parent.project_id.clone(),
            title: parent.title.clone(),
            owner: parent.owner.clone(),
            thread_id: parent.thread_id.clone(),
            timestamp: now,
            completion,
            progress_status,
            children,
            invalid_children,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::error::SyncError;
    use crate::types::{Marker, PageRequest, ProgressStatus, RawChildRow};
    use async_trait::async_trait;
    use chrono::TimeZone;

    struct StubSource {
        children: Vec<RawChildRow>,
        labels: SyncResultOf<Option<HeaderLabels>>,
        fail_children: bool,
    }

    #[async_trait]
    impl TaskSource for StubSource {
        async fn fetch_parent_rows(&self, _page: PageRequest) -> SyncResultOf<Vec<ParentRow>> {
            Ok(Vec::new())
        }

        async fn fetch_child_rows(&self, _project_id: &str) -> SyncResultOf<Vec<RawChildRow>> {
            if self.fail_children {
                return Err(SyncError::data_source("sheet unavailable"));
            }
            Ok(self.children.clone())
        }

        async fn fetch_header_labels(&self) -> SyncResultOf<Option<HeaderLabels>> {
            match &self.labels {
                Ok(labels) => Ok(labels.clone()),
                Err(_) => Err(SyncError::data_source("no header")),
            }
        }

        async fn update_thread_id(&self, _row_index: usize, _thread_id: &str) -> SyncResultOf<()> {
            Ok(())
        }
    }

    fn raw(task_id: &str, title: &str, due: &str, status: &str) -> RawChildRow {
        RawChildRow {
            project_id: "P1".to_string(),
            task_id: task_id.to_string(),
            title: title.to_string(),
            due_date: due.to_string(),
            status: status.to_string(),
            ..Default::default()
        }
    }

    fn parent() -> ParentRow {
        ParentRow {
            row_index: 3,
            project_id: "P1".to_string(),
            title: "Launch".to_string(),
            owner: "kei".to_string(),
            thread_id: None,
        }
    }

    fn builder(source: StubSource) -> SnapshotBuilder {
        let clock = FixedClock(Utc.with_ymd_and_hms(2025, 6, 15, 3, 0, 0).unwrap());
        SnapshotBuilder::new(Arc::new(source))
            .with_clock(Arc::new(clock))
            .with_offset(FixedOffset::east_opt(9 * 3600).unwrap())
    }

    #[tokio::test]
    async fn test_build_partitions_and_counts_all_children() {
        let source = StubSource {
            children: vec![
                raw("T1", "A", "2099-01-01", "completed"),
                raw("T2", "", "", "in-progress"),
            ],
            labels: Ok(None),
            fail_children: false,
        };
        let snapshot = builder(source).build(&parent()).await.unwrap();

        assert_eq!(snapshot.row_index, 3);
        assert_eq!(snapshot.completion.total, 2);
        assert_eq!(snapshot.completion.done, 1);
        assert_eq!(snapshot.completion.percentage, 50);
        assert_eq!(snapshot.children.len(), 1);
        assert_eq!(snapshot.invalid_children.len(), 1);
        assert_eq!(
            snapshot.invalid_children[0].reason,
            "missing required fields: title, dueDate"
        );
        assert_eq!(snapshot.progress_status, ProgressStatus::OnSchedule);
    }

    #[tokio::test]
    async fn test_progress_ignores_invalid_children() {
        // The overdue child is invalid (no title), so it cannot delay the project
        let source = StubSource {
            children: vec![
                raw("T1", "", "2020-01-01", "in-progress"),
                raw("T2", "B", "2025-06-14", "in-progress"),
            ],
            labels: Ok(None),
            fail_children: false,
        };
        let snapshot = builder(source).build(&parent()).await.unwrap();
        assert_eq!(snapshot.progress_status, ProgressStatus::Delayed);

        let source = StubSource {
            children: vec![raw("T1", "", "2020-01-01", "in-progress")],
            labels: Ok(None),
            fail_children: false,
        };
        let snapshot = builder(source).build(&parent()).await.unwrap();
        assert_eq!(snapshot.progress_status, ProgressStatus::OnSchedule);
    }

    #[tokio::test]
    async fn test_label_failure_degrades_to_keys() {
        let source = StubSource {
            children: vec![raw("T1", "A", "", "todo")],
            labels: Err(SyncError::data_source("unused")),
            fail_children: false,
        };
        let snapshot = builder(source).build(&parent()).await.unwrap();
        assert_eq!(
            snapshot.invalid_children[0].reason,
            "missing required fields: dueDate"
        );
    }

    #[tokio::test]
    async fn test_child_fetch_failure_propagates() {
        let source = StubSource {
            children: Vec::new(),
            labels: Ok(None),
            fail_children: true,
        };
        let err = builder(source).build(&parent()).await.unwrap_err();
        assert!(matches!(err, SyncError::Source(_)));
    }

    #[tokio::test]
    async fn test_detector_markers_attached_to_valid_children() {
        let source = StubSource {
            children: vec![raw("T1", "A", "2025-06-16", "in-progress")],
            labels: Ok(None),
            fail_children: false,
        };
        let clock: Arc<dyn Clock> =
            Arc::new(FixedClock(Utc.with_ymd_and_hms(2025, 6, 15, 3, 0, 0).unwrap()));
        let jst = FixedOffset::east_opt(9 * 3600).unwrap();
        let detector = DueSoonDetector::new(3, clock, jst).unwrap();

        let snapshot = builder(source)
            .with_detector(Arc::new(detector))
            .build(&parent())
            .await
            .unwrap();
        assert_eq!(snapshot.children[0].markers, vec![Marker::Deadline]);
    }
}
