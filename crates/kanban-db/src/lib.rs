pub mod boards;
pub mod error;
pub mod guard;
pub mod members;
pub mod migrations;
pub mod models;
pub mod projector;
pub mod queries;
pub mod seed;

use anyhow::Result;
use rusqlite::{Connection, Transaction};
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

pub use error::{BoardError, BoardResult};

/// Titles of the columns every new board starts with, in position order.
pub const DEFAULT_COLUMNS: [&str; 5] = ["Backlog", "Discovery", "In Progress", "Review", "Done"];

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // WAL mode for concurrent reads
        conn.pragma_update(None, "journal_mode", "WAL")?;

        let db = Self::init(conn)?;
        info!("Database opened at {}", path.display());
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        migrations::run(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn with_conn<F, T>(&self, f: F) -> BoardResult<T>
    where
        F: FnOnce(&Connection) -> BoardResult<T>,
    {
        let conn = self.conn.lock().map_err(|_| BoardError::Poisoned)?;
        f(&conn)
    }

    /// Run `f` inside a single transaction. Commits when `f` returns `Ok`;
    /// any error drops the transaction, which rolls it back.
    pub fn with_tx<F, T>(&self, f: F) -> BoardResult<T>
    where
        F: FnOnce(&Transaction<'_>) -> BoardResult<T>,
    {
        let mut conn = self.conn.lock().map_err(|_| BoardError::Poisoned)?;
        let tx = conn.transaction()?;
        let out = f(&tx)?;
        tx.commit()?;
        Ok(out)
    }
}
