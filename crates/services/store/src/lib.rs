//! Document Store Library
//!
//! Collections of JSON documents behind the [`DocumentStore`] trait, with an
//! in-memory backend and a SeaORM backend, plus the typed repositories the
//! rest of the workspace reads and writes through.

pub mod document;
pub mod entities;
pub mod memory;
pub mod path;
pub mod query;
pub mod repository;
pub mod sql;
pub mod store;

use std::sync::Arc;

use common::{Database, StoreConfig};
use sea_orm::DbErr;

pub use document::{Document, DocumentEvent, EventKind, Fields, Write};
pub use memory::MemoryStore;
pub use path::CollectionPath;
pub use query::{Direction, Query};
pub use repository::{
    CrudRepository, DeleteRepository, DocumentRepository, ReadRepository, TransactionContext,
    WriteBatch, WriteRepository,
};
pub use sql::SqlStore;
pub use store::{DocumentStore, PathGuard, ServerClock};

#[cfg(any(test, feature = "test-utils"))]
pub use store::MockDocumentStore;

/// Connect to the configured database, apply migrations and open a store.
pub async fn connect_sql_store(config: &StoreConfig) -> Result<(Database, Arc<SqlStore>), DbErr> {
    let db = Database::connect(config).await?;
    let store = Arc::new(SqlStore::new(db.get_connection()));
    Ok((db, store))
}
