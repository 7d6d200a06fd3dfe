//! SQLite document store
//!
//! One table holds every collection. Bodies are stored as JSON text.

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use super::traits::{DocumentStore, StoreType};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS documents (
    collection TEXT NOT NULL,
    record_id  TEXT NOT NULL,
    body       TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (collection, record_id)
);
";

pub struct SqliteDocumentStore {
    conn: Mutex<Connection>,
}

impl SqliteDocumentStore {
    /// Opens or creates the database at `path`
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open document store {:?}", path))?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory store, mostly for tests
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow::anyhow!("Document store connection poisoned"))
    }
}

impl DocumentStore for SqliteDocumentStore {
    fn store_type(&self) -> StoreType {
        StoreType::Sqlite
    }

    fn save(&self, collection: &str, record_id: &str, body: &Value) -> Result<()> {
        let json = serde_json::to_string(body).context("Failed to serialize document")?;
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO documents (collection, record_id, body, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(collection, record_id)
             DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at",
            params![collection, record_id, json, chrono::Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn load(&self, collection: &str, record_id: &str) -> Result<Option<Value>> {
        let conn = self.conn()?;
        let body: Option<String> = conn
            .query_row(
                "SELECT body FROM documents WHERE collection = ?1 AND record_id = ?2",
                params![collection, record_id],
                |row| row.get(0),
            )
            .optional()?;

        body.map(|json| serde_json::from_str(&json).context("Failed to deserialize document"))
            .transpose()
    }

    fn delete(&self, collection: &str, record_id: &str) -> Result<bool> {
        let conn = self.conn()?;
        let affected = conn.execute(
            "DELETE FROM documents WHERE collection = ?1 AND record_id = ?2",
            params![collection, record_id],
        )?;
        Ok(affected > 0)
    }

    fn list_ids(&self, collection: &str) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT record_id FROM documents WHERE collection = ?1 ORDER BY record_id")?;
        let ids = stmt
            .query_map(params![collection], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(ids)
    }
}
