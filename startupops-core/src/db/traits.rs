//! Document store abstraction
//!
//! Records are mirrored to an external document store keyed by
//! collection and record id. The workspace file stays authoritative, so a
//! failed mirror write is logged and otherwise ignored.

use anyhow::Result;
use serde::Serialize;
use serde_json::Value;

/// Collections records are written to
pub mod collections {
    pub const TASKS: &str = "tasks";
    pub const FEEDBACK: &str = "feedback";
    pub const FINANCIALS: &str = "financials";
    pub const EXPENSES: &str = "expenses";
    pub const TEAM: &str = "team";

    pub const ALL: [&str; 5] = [TASKS, FEEDBACK, FINANCIALS, EXPENSES, TEAM];
}

/// Types of document stores available
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreType {
    /// Discards every write
    Null,
    /// Local SQLite file
    Sqlite,
}

impl std::fmt::Display for StoreType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreType::Null => write!(f, "none"),
            StoreType::Sqlite => write!(f, "SQLite"),
        }
    }
}

/// Key-value persistence of JSON documents
pub trait DocumentStore: Send + Sync {
    fn store_type(&self) -> StoreType;

    /// Inserts or replaces the document at `(collection, record_id)`
    fn save(&self, collection: &str, record_id: &str, body: &Value) -> Result<()>;

    fn load(&self, collection: &str, record_id: &str) -> Result<Option<Value>>;

    /// Removes a document; returns whether one existed
    fn delete(&self, collection: &str, record_id: &str) -> Result<bool>;

    /// Record ids in `collection`, sorted
    fn list_ids(&self, collection: &str) -> Result<Vec<String>>;
}

/// A document store that accepts and forgets everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDocumentStore;

impl DocumentStore for NullDocumentStore {
    fn store_type(&self) -> StoreType {
        StoreType::Null
    }

    fn save(&self, _collection: &str, _record_id: &str, _body: &Value) -> Result<()> {
        Ok(())
    }

    fn load(&self, _collection: &str, _record_id: &str) -> Result<Option<Value>> {
        Ok(None)
    }

    fn delete(&self, _collection: &str, _record_id: &str) -> Result<bool> {
        Ok(false)
    }

    fn list_ids(&self, _collection: &str) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}

/// Serializes `record` and saves it, logging instead of failing.
/// Returns whether the write went through.
pub fn persist_quietly<T: Serialize>(
    store: &dyn DocumentStore,
    collection: &str,
    record_id: &str,
    record: &T,
) -> bool {
    let body = match serde_json::to_value(record) {
        Ok(body) => body,
        Err(e) => {
            log::warn!("Could not serialize {}/{}: {}", collection, record_id, e);
            return false;
        }
    };

    match store.save(collection, record_id, &body) {
        Ok(()) => {
            log::debug!("Persisted {}/{} to {} store", collection, record_id, store.store_type());
            true
        }
        Err(e) => {
            log::warn!("Failed to persist {}/{}: {:#}", collection, record_id, e);
            false
        }
    }
}

/// Deletes a mirrored record, logging instead of failing
pub fn remove_quietly(store: &dyn DocumentStore, collection: &str, record_id: &str) -> bool {
    match store.delete(collection, record_id) {
        Ok(_) => true,
        Err(e) => {
            log::warn!("Failed to remove {}/{}: {:#}", collection, record_id, e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct FailingStore;

    impl DocumentStore for FailingStore {
        fn store_type(&self) -> StoreType {
            StoreType::Sqlite
        }

        fn save(&self, _collection: &str, _record_id: &str, _body: &Value) -> Result<()> {
            anyhow::bail!("disk full")
        }

        fn load(&self, _collection: &str, _record_id: &str) -> Result<Option<Value>> {
            anyhow::bail!("disk full")
        }

        fn delete(&self, _collection: &str, _record_id: &str) -> Result<bool> {
            anyhow::bail!("disk full")
        }

        fn list_ids(&self, _collection: &str) -> Result<Vec<String>> {
            anyhow::bail!("disk full")
        }
    }

    #[test]
    fn test_null_store_accepts_everything() {
        let store = NullDocumentStore;
        assert!(persist_quietly(&store, collections::TASKS, "t1", &json!({"content": "x"})));
        assert_eq!(store.load(collections::TASKS, "t1").unwrap(), None);
        assert!(store.list_ids(collections::TASKS).unwrap().is_empty());
    }

    #[test]
    fn test_persist_quietly_swallows_failures() {
        let store = FailingStore;
        assert!(!persist_quietly(&store, collections::EXPENSES, "3", &json!({"amount": 10})));
        assert!(!remove_quietly(&store, collections::EXPENSES, "3"));
    }
}
