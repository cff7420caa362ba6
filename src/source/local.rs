//! Local SQLite grid backend.

use super::grid::{Grid, GridBackend};
use crate::db::Database;
use crate::error::SyncResultOf;
use async_trait::async_trait;

#[async_trait]
impl GridBackend for Database {
    async fn load_grid(&self) -> SyncResultOf<Grid> {
        Database::load_grid(self)
    }

    async fn write_cell(&self, grid_row: usize, column: usize, value: &str) -> SyncResultOf<()> {
        Database::write_cell(self, grid_row, column, value)
    }
}
