//! Sheet row storage: each row is a JSON array of cell strings.

use super::Database;
use crate::error::{SyncError, SyncResultOf};
use crate::source::Grid;
use rusqlite::{OptionalExtension, params};

impl Database {
    /// Replace every stored row with `grid`, header first.
    pub fn replace_grid(&self, grid: &Grid) -> SyncResultOf<usize> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM sheet_rows", [])?;
            {
                let mut stmt = tx.prepare("INSERT INTO sheet_rows (row_no, cells) VALUES (?1, ?2)")?;
                for (row_no, cells) in std::iter::once(&grid.header)
                    .chain(grid.rows.iter())
                    .enumerate()
                {
                    stmt.execute(params![row_no as i64, serde_json::to_string(cells)?])?;
                }
            }
            tx.commit()?;
            Ok(grid.rows.len())
        })
    }

    /// Load all rows in row order. An empty table yields an empty grid.
    pub fn load_grid(&self) -> SyncResultOf<Grid> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT cells FROM sheet_rows ORDER BY row_no")?;
            let table = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .map(|cells| -> SyncResultOf<Vec<String>> { Ok(serde_json::from_str(&cells?)?) })
                .collect::<SyncResultOf<Vec<_>>>()?;
            Ok(Grid::from_table(table))
        })
    }

    /// Set one cell, padding the row with empty cells as needed.
    pub fn write_cell(&self, grid_row: usize, column: usize, value: &str) -> SyncResultOf<()> {
        self.with_conn(|conn| {
            let cells: Option<String> = conn
                .query_row(
                    "SELECT cells FROM sheet_rows WHERE row_no = ?1",
                    params![grid_row as i64],
                    |row| row.get(0),
                )
                .optional()?;
            let Some(cells) = cells else {
                return Err(SyncError::data_source(format!(
                    "sheet row {} does not exist",
                    grid_row
                )));
            };

            let mut cells: Vec<String> = serde_json::from_str(&cells)?;
            if cells.len() <= column {
                cells.resize(column + 1, String::new());
            }
            cells[column] = value.to_string();

            conn.execute(
                "UPDATE sheet_rows SET cells = ?1 WHERE row_no = ?2",
                params![serde_json::to_string(&cells)?, grid_row as i64],
            )?;
            Ok(())
        })
    }
}
