//! Tabular data source: project rows, task rows and thread id write-back.

pub mod grid;
pub mod local;
pub mod sheets;

pub use grid::{Grid, GridBackend, GridSource};
pub use sheets::SheetsBackend;

use crate::error::SyncResultOf;
use crate::types::{PageRequest, ParentRow, RawChildRow};
use async_trait::async_trait;
use std::collections::HashMap;

/// Read/write access to the hierarchical task sheet.
///
/// Implementations serve every read in one cycle from rows fetched once at
/// cycle start.
#[async_trait]
pub trait TaskSource: Send + Sync {
    /// One row per distinct project id in sheet order, sliced by `page`.
    async fn fetch_parent_rows(&self, page: PageRequest) -> SyncResultOf<Vec<ParentRow>>;

    /// Task rows of `project_id` that carry a task id.
    async fn fetch_child_rows(&self, project_id: &str) -> SyncResultOf<Vec<RawChildRow>>;

    /// Display labels for field keys. Sources without a header row keep the default.
    async fn fetch_header_labels(&self) -> SyncResultOf<Option<HeaderLabels>> {
        Ok(None)
    }

    /// Record the thread id of the project at data row `row_index`.
    async fn update_thread_id(&self, row_index: usize, thread_id: &str) -> SyncResultOf<()>;
}

/// Canonical field key to display label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderLabels(HashMap<String, String>);

impl HeaderLabels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, label: impl Into<String>) {
        self.0.insert(key.into(), label.into());
    }

    /// Label for `key`, or `key` itself when no non-blank label exists.
    pub fn label_for<'a>(&'a self, key: &'a str) -> &'a str {
        match self.0.get(key).map(|l| l.trim()) {
            Some(label) if !label.is_empty() => label,
            _ => key,
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for HeaderLabels {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
