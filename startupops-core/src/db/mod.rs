//! Document store collaborators
//!
//! Records saved through the CLI are mirrored to a document store. The
//! workspace YAML file remains the source of truth.

mod sqlite_store;
mod traits;

pub use sqlite_store::SqliteDocumentStore;
pub use traits::{collections, persist_quietly, remove_quietly, DocumentStore, NullDocumentStore, StoreType};

use anyhow::Result;
use std::path::Path;

/// Opens the configured document store, or the null store when none is set
pub fn open_document_store(path: Option<&Path>) -> Result<Box<dyn DocumentStore>> {
    match path {
        Some(path) => Ok(Box::new(SqliteDocumentStore::new(path)?)),
        None => Ok(Box::new(NullDocumentStore)),
    }
}
