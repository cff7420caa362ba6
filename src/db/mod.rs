//! SQLite mirror of the task sheet for runs without spreadsheet access.

pub mod rows;

use crate::error::{SyncError, SyncResultOf};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Database handle wrapping a SQLite connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create the database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> SyncResultOf<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA busy_timeout=5000;",
        )?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> SyncResultOf<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    fn run_migrations(&self) -> SyncResultOf<()> {
        self.with_conn_mut(|conn| {
            embedded::migrations::runner()
                .run(conn)
                .map_err(|e| SyncError::data_source(format!("migration failed: {}", e)))?;
            Ok(())
        })
    }

    /// Execute a function with exclusive access to the connection.
    pub fn with_conn<F, T>(&self, f: F) -> SyncResultOf<T>
    where
        F: FnOnce(&Connection) -> SyncResultOf<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|_| SyncError::data_source("database lock poisoned"))?;
        f(&conn)
    }

    /// Execute a function with mutable access to the connection (for transactions).
    pub fn with_conn_mut<F, T>(&self, f: F) -> SyncResultOf<T>
    where
        F: FnOnce(&mut Connection) -> SyncResultOf<T>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| SyncError::data_source("database lock poisoned"))?;
        f(&mut conn)
    }
}
