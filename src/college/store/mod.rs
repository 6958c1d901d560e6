// SPDX-License-Identifier: MIT

//! SQLite store
//!
//! One connection behind a mutex, shared by every request. Query functions
//! live in the per-table submodules and take a `&Connection`, so they run the
//! same way on a plain connection and inside a transaction.

pub mod climate;
pub mod colleges;
pub mod divisions;
pub mod evaluations;
pub mod history;
pub mod reviews;
pub mod schema;
pub mod users;

use crate::error::AppError;
use rusqlite::{Connection, Transaction};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Open (or create) a database file and bring its schema up to date
    pub fn open(path: &Path) -> Result<Self, AppError> {
        let conn = Connection::open(path)
            .map_err(|e| AppError::other(format!("store: open {}: {e}", path.display())))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self, AppError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, AppError> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "busy_timeout", 5000)?;
        conn.execute_batch(&schema::ddl())?;
        conn.pragma_update(None, "user_version", schema::SCHEMA_VERSION)?;
        log::debug!("store schema at version {}", schema::SCHEMA_VERSION);

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, AppError> {
        self.conn
            .lock()
            .map_err(|_| AppError::other("store: connection lock poisoned"))
    }

    /// Run `f` against the shared connection
    pub fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        let conn = self.lock()?;
        f(&conn)
    }

    /// Run `f` inside a transaction; commits on `Ok`, rolls back on `Err`
    pub fn with_tx<T>(
        &self,
        f: impl FnOnce(&Transaction<'_>) -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    /// [`Store::with_conn`] on the blocking thread pool
    pub async fn call<T, F>(&self, f: F) -> Result<T, AppError>
    where
        F: FnOnce(&Connection) -> Result<T, AppError> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.with_conn(f))
            .await
            .map_err(|e| AppError::other(format!("store join: {e}")))?
    }

    /// [`Store::with_tx`] on the blocking thread pool
    pub async fn call_tx<T, F>(&self, f: F) -> Result<T, AppError>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T, AppError> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.with_tx(f))
            .await
            .map_err(|e| AppError::other(format!("store join: {e}")))?
    }

    pub fn schema_version(&self) -> Result<i32, AppError> {
        self.with_conn(|conn| Ok(conn.query_row("PRAGMA user_version", [], |row| row.get(0))?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory_creates_schema() {
        let store = Store::open_in_memory().unwrap();
        assert_eq!(store.schema_version().unwrap(), schema::SCHEMA_VERSION);

        let tables: Vec<String> = store
            .with_conn(|conn| {
                let sql = "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name";
                let mut stmt = conn.prepare(sql)?;
                let rows = stmt.query_map([], |row| row.get(0))?;
                Ok(rows.collect::<Result<Vec<_>, _>>()?)
            })
            .unwrap();
        for table in [
            "admin_divisions",
            "climate_data",
            "college_reviews",
            "colleges",
            "evaluations",
            "modification_history",
            "pending_colleges",
            "users",
        ] {
            assert!(tables.iter().any(|t| t == table), "missing table {}", table);
        }
    }

    #[test]
    fn test_open_file_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("colleges.db");
        Store::open(&path).unwrap();
        let store = Store::open(&path).unwrap();
        assert_eq!(store.schema_version().unwrap(), schema::SCHEMA_VERSION);
    }

    #[test]
    fn test_transaction_rolls_back_on_error() {
        let store = Store::open_in_memory().unwrap();
        let result: Result<(), AppError> = store.with_tx(|tx| {
            tx.execute(
                "INSERT INTO admin_divisions (object_id, admin_code, shape, name)
                 VALUES (1, '156430000', 'POINT(1 2)', '湖南省')",
                [],
            )?;
            Err(AppError::other("abort"))
        });
        assert!(result.is_err());

        let count: i64 = store
            .with_conn(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM admin_divisions", [], |r| r.get(0))?)
            })
            .unwrap();
        assert_eq!(count, 0);
    }
}
