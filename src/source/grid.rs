//! Sheet-shaped data source over any grid backend.
//!
//! Project rows and task rows share one grid: a project row is the first row
//! carrying a given project id, task rows are every row of that project with
//! a task id. The grid is fetched once per `GridSource` and every later read
//! is served from that copy.

use super::{HeaderLabels, TaskSource};
use crate::config::ColumnLayout;
use crate::error::{SyncError, SyncResultOf};
use crate::types::{PageRequest, ParentRow, RawChildRow, TaskField};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// Header row plus data rows of string cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grid {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Grid {
    /// Split a row-major table whose first row is the header.
    pub fn from_table(mut table: Vec<Vec<String>>) -> Self {
        if table.is_empty() {
            return Self::default();
        }
        let header = table.remove(0);
        Self {
            header,
            rows: table,
        }
    }

    /// Trimmed cell, empty when the row is shorter than `column`.
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(|c| c.trim())
            .unwrap_or("")
    }

    fn header_cell(&self, column: usize) -> &str {
        self.header.get(column).map(|c| c.trim()).unwrap_or("")
    }
}

/// Storage that can hand over the whole grid and overwrite single cells.
#[async_trait]
pub trait GridBackend: Send + Sync {
    async fn load_grid(&self) -> SyncResultOf<Grid>;

    /// Overwrite one cell. `grid_row` counts the header as row 0.
    async fn write_cell(&self, grid_row: usize, column: usize, value: &str) -> SyncResultOf<()>;
}

/// `TaskSource` over a grid backend with a per-instance row cache.
pub struct GridSource<B> {
    backend: B,
    layout: ColumnLayout,
    rows: OnceCell<Arc<Grid>>,
}

impl<B: GridBackend> GridSource<B> {
    pub fn new(backend: B, layout: ColumnLayout) -> Self {
        Self {
            backend,
            layout,
            rows: OnceCell::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Grid fetched on first use; concurrent first readers share one fetch.
    async fn grid(&self) -> SyncResultOf<Arc<Grid>> {
        let grid = self
            .rows
            .get_or_try_init(|| async {
                let grid = self.backend.load_grid().await?;
                info!(rows = grid.rows.len(), "Loaded sheet rows");
                Ok::<_, SyncError>(Arc::new(grid))
            })
            .await?;
        Ok(Arc::clone(grid))
    }

    fn child_from_row(&self, grid: &Grid, row: usize, project_id: &str) -> RawChildRow {
        let layout = &self.layout;
        RawChildRow {
            row_index: row,
            project_id: project_id.to_string(),
            task_id: grid.cell(row, layout.task_id).to_string(),
            title: grid.cell(row, layout.task_title).to_string(),
            assignee: layout
                .assignee
                .map(|c| grid.cell(row, c).to_string())
                .unwrap_or_default(),
            due_date: grid.cell(row, layout.due_date).to_string(),
            status: grid.cell(row, layout.status).to_string(),
            completed_at: grid.cell(row, layout.completed_at).to_string(),
            notes: grid.cell(row, layout.notes).to_string(),
        }
    }
}

#[async_trait]
impl<B: GridBackend> TaskSource for GridSource<B> {
    async fn fetch_parent_rows(&self, page: PageRequest) -> SyncResultOf<Vec<ParentRow>> {
        let grid = self.grid().await?;
        let layout = &self.layout;
        let mut seen = HashSet::new();

        let parents = (0..grid.rows.len())
            .filter_map(|row| {
                let project_id = grid.cell(row, layout.project_id);
                if project_id.is_empty() || !seen.insert(project_id.to_string()) {
                    return None;
                }
                let thread_id = grid.cell(row, layout.thread_id);
                Some(ParentRow {
                    row_index: row,
                    project_id: project_id.to_string(),
                    title: grid.cell(row, layout.project_title).to_string(),
                    owner: grid.cell(row, layout.owner).to_string(),
                    thread_id: (!thread_id.is_empty()).then(|| thread_id.to_string()),
                })
            })
            .skip(page.cursor)
            .take(page.limit.unwrap_or(usize::MAX))
            .collect::<Vec<_>>();

        debug!(count = parents.len(), cursor = page.cursor, "Fetched parent rows");
        Ok(parents)
    }

    async fn fetch_child_rows(&self, project_id: &str) -> SyncResultOf<Vec<RawChildRow>> {
        if project_id.trim().is_empty() {
            return Ok(Vec::new());
        }
        let grid = self.grid().await?;
        let layout = &self.layout;

        Ok((0..grid.rows.len())
            .filter(|&row| {
                grid.cell(row, layout.project_id) == project_id
                    && !grid.cell(row, layout.task_id).is_empty()
            })
            .map(|row| self.child_from_row(&grid, row, project_id))
            .collect())
    }

    async fn fetch_header_labels(&self) -> SyncResultOf<Option<HeaderLabels>> {
        let grid = self.grid().await?;
        let layout = &self.layout;

        let mut labels: HeaderLabels = layout
            .named_columns()
            .into_iter()
            .map(|(key, column)| (key, grid.header_cell(column)))
            .collect();

        for (field, column) in [
            (TaskField::TaskId, layout.task_id),
            (TaskField::Title, layout.task_title),
            (TaskField::DueDate, layout.due_date),
            (TaskField::Status, layout.status),
        ] {
            labels.insert(field.key(), grid.header_cell(column));
        }

        Ok(Some(labels))
    }

    async fn update_thread_id(&self, row_index: usize, thread_id: &str) -> SyncResultOf<()> {
        if thread_id.trim().is_empty() {
            return Err(SyncError::InvalidWriteBack(
                "thread id must not be empty".to_string(),
            ));
        }
        let grid = self.grid().await?;
        if row_index >= grid.rows.len() {
            return Err(SyncError::InvalidWriteBack(format!(
                "row {} is not in the loaded data ({} rows)",
                row_index,
                grid.rows.len()
            )));
        }

        self.backend
            .write_cell(row_index + 1, self.layout.thread_id, thread_id)
            .await?;
        info!(row_index, thread_id, "Recorded thread id");
        Ok(())
    }
}

/// Spreadsheet column letters for a 0-based index (0 = A, 26 = AA).
pub fn column_letter(mut index: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}
