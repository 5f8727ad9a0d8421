//! Typed repositories over the document store.
//!
//! The read, write and delete capabilities are split into separate traits and
//! combined by a blanket [`CrudRepository`] impl. [`DocumentRepository`] is the
//! concrete implementation for one collection and record type; it decodes
//! documents at the boundary and normalises provider faults into
//! [`AppError`]s with the severity chosen by its owner.

use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use common::{AppError, AppResult, ErrorMapper, OptionExt, ProviderFault, Severity};

use crate::document::{to_fields, Document, Write};
use crate::path::CollectionPath;
use crate::query::Query;
use crate::store::DocumentStore;

/// Read operations (Query)
#[async_trait]
pub trait ReadRepository<T>: Send + Sync
where
    T: Send,
{
    /// Every record matching `query`
    async fn get_all(&self, query: Query) -> AppResult<Vec<T>>;

    /// One record; absent → `DocumentNotFound`
    async fn get_one(&self, id: &str) -> AppResult<T>;
}

/// Write operations (Command)
#[async_trait]
pub trait WriteRepository<T>: Send + Sync
where
    T: Send,
{
    /// Write `path/id`, stamp both timestamps, then re-read
    async fn create_one<P>(&self, payload: &P, id: &str) -> AppResult<T>
    where
        P: Serialize + Sync + ?Sized;

    /// Merge `partial` into `path/id`, stamp `updatedAt`, then re-read
    async fn update_one<P>(&self, partial: &P, id: &str) -> AppResult<T>
    where
        P: Serialize + Sync + ?Sized;
}

/// Delete operations
#[async_trait]
pub trait DeleteRepository: Send + Sync {
    async fn delete_one(&self, id: &str) -> AppResult<()>;
}

/// Full CRUD repository - Combines all operations
pub trait CrudRepository<T>: ReadRepository<T> + WriteRepository<T> + DeleteRepository
where
    T: Send,
{
}

impl<R, T> CrudRepository<T> for R
where
    R: ReadRepository<T> + WriteRepository<T> + DeleteRepository,
    T: Send,
{
}

/// Repository for one collection of `T` records
pub struct DocumentRepository<T> {
    store: Arc<dyn DocumentStore>,
    path: CollectionPath,
    errors: ErrorMapper,
    severity: Severity,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for DocumentRepository<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            path: self.path.clone(),
            errors: self.errors.clone(),
            severity: self.severity,
            _record: PhantomData,
        }
    }
}

impl<T> DocumentRepository<T>
where
    T: DeserializeOwned + Send,
{
    /// Create new repository instance
    pub fn new(store: Arc<dyn DocumentStore>, path: CollectionPath) -> Self {
        Self {
            store,
            path,
            errors: ErrorMapper::default(),
            severity: Severity::Error,
            _record: PhantomData,
        }
    }

    /// Severity attached to normalised provider faults
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_error_mapper(mut self, errors: ErrorMapper) -> Self {
        self.errors = errors;
        self
    }

    pub fn path(&self) -> &CollectionPath {
        &self.path
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    fn fault(&self, fault: ProviderFault) -> AppError {
        debug!(path = %self.path, "Store fault: {}", fault);
        self.errors.map(fault, self.severity)
    }

    async fn read_all(&self, query: &Query) -> AppResult<Vec<T>> {
        let documents = self
            .store
            .query(&self.path, query)
            .await
            .map_err(|f| self.fault(f))?;
        documents.iter().map(Document::decode).collect()
    }

    async fn read_one(&self, id: &str) -> AppResult<T> {
        self.store
            .get(&self.path, id)
            .await
            .map_err(|f| self.fault(f))?
            .ok_or_not_found()?
            .decode()
    }

    async fn commit(&self, writes: Vec<Write>) -> AppResult<()> {
        self.store.commit(writes).await.map_err(|f| self.fault(f))
    }

    /// Start a batch of writes on this collection
    pub fn batch(&self) -> WriteBatch {
        WriteBatch::new(self.store.clone(), self.path.clone(), self.errors.clone(), self.severity)
    }

    /// Run `f` while holding this path's transaction lock.
    ///
    /// Reads inside the closure go straight to the store; writes are buffered
    /// on the context and committed atomically once the closure succeeds. On
    /// error nothing is written.
    pub async fn transaction<F, R>(&self, f: F) -> AppResult<R>
    where
        F: for<'a> FnOnce(
                &'a mut TransactionContext<T>,
            ) -> Pin<Box<dyn Future<Output = AppResult<R>> + Send + 'a>>
            + Send,
        R: Send,
    {
        let _guard = self.store.lock(&self.path).await;

        let mut ctx = TransactionContext {
            repo: self.clone(),
            writes: self.batch(),
        };

        let result = f(&mut ctx).await;
        match result {
            Ok(value) => {
                ctx.writes.commit().await?;
                Ok(value)
            }
            Err(e) => {
                debug!(path = %self.path, "Transaction aborted: {}", e);
                Err(e)
            }
        }
    }
}

#[async_trait]
impl<T> ReadRepository<T> for DocumentRepository<T>
where
    T: DeserializeOwned + Send,
{
    async fn get_all(&self, query: Query) -> AppResult<Vec<T>> {
        self.read_all(&query).await
    }

    async fn get_one(&self, id: &str) -> AppResult<T> {
        self.read_one(id).await
    }
}

#[async_trait]
impl<T> WriteRepository<T> for DocumentRepository<T>
where
    T: DeserializeOwned + Send,
{
    async fn create_one<P>(&self, payload: &P, id: &str) -> AppResult<T>
    where
        P: Serialize + Sync + ?Sized,
    {
        let fields = to_fields(payload)?;
        self.commit(vec![Write::Set {
            path: self.path.clone(),
            id: id.to_string(),
            fields,
        }])
        .await?;
        self.read_one(id).await
    }

    async fn update_one<P>(&self, partial: &P, id: &str) -> AppResult<T>
    where
        P: Serialize + Sync + ?Sized,
    {
        let fields = to_fields(partial)?;
        self.commit(vec![Write::Merge {
            path: self.path.clone(),
            id: id.to_string(),
            fields,
        }])
        .await?;
        self.read_one(id).await
    }
}

#[async_trait]
impl<T> DeleteRepository for DocumentRepository<T>
where
    T: DeserializeOwned + Send,
{
    async fn delete_one(&self, id: &str) -> AppResult<()> {
        self.commit(vec![Write::Delete {
            path: self.path.clone(),
            id: id.to_string(),
        }])
        .await
    }
}

/// Writes on one collection committed all-or-nothing
pub struct WriteBatch {
    store: Arc<dyn DocumentStore>,
    path: CollectionPath,
    errors: ErrorMapper,
    severity: Severity,
    writes: Vec<Write>,
}

impl WriteBatch {
    fn new(
        store: Arc<dyn DocumentStore>,
        path: CollectionPath,
        errors: ErrorMapper,
        severity: Severity,
    ) -> Self {
        Self {
            store,
            path,
            errors,
            severity,
            writes: Vec::new(),
        }
    }

    pub fn set<P: Serialize + ?Sized>(&mut self, payload: &P, id: &str) -> AppResult<&mut Self> {
        self.writes.push(Write::Set {
            path: self.path.clone(),
            id: id.to_string(),
            fields: to_fields(payload)?,
        });
        Ok(self)
    }

    pub fn batch_update<P: Serialize + ?Sized>(
        &mut self,
        partial: &P,
        id: &str,
    ) -> AppResult<&mut Self> {
        self.writes.push(Write::Merge {
            path: self.path.clone(),
            id: id.to_string(),
            fields: to_fields(partial)?,
        });
        Ok(self)
    }

    pub fn delete(&mut self, id: &str) -> &mut Self {
        self.writes.push(Write::Delete {
            path: self.path.clone(),
            id: id.to_string(),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Commit every buffered write, clearing the batch
    pub async fn commit(&mut self) -> AppResult<()> {
        let writes = std::mem::take(&mut self.writes);
        self.store
            .commit(writes)
            .await
            .map_err(|f| self.errors.map(f, self.severity))
    }
}

/// Repository access inside [`DocumentRepository::transaction`]
pub struct TransactionContext<T> {
    repo: DocumentRepository<T>,
    writes: WriteBatch,
}

impl<T> TransactionContext<T>
where
    T: DeserializeOwned + Send,
{
    pub async fn get_all(&self, query: Query) -> AppResult<Vec<T>> {
        self.repo.read_all(&query).await
    }

    pub async fn get_one(&self, id: &str) -> AppResult<T> {
        self.repo.read_one(id).await
    }

    /// Buffered writes committed when the transaction succeeds
    pub fn writes(&mut self) -> &mut WriteBatch {
        &mut self.writes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MockDocumentStore;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Record {
        #[allow(dead_code)]
        id: String,
    }

    fn repo(store: MockDocumentStore) -> DocumentRepository<Record> {
        DocumentRepository::new(Arc::new(store), CollectionPath::new("roles").unwrap())
    }

    #[tokio::test]
    async fn test_coded_fault_passes_through_with_chosen_severity() {
        let mut store = MockDocumentStore::new();
        store
            .expect_query()
            .returning(|_, _| Err(ProviderFault::coded("permission-denied", "Missing permissions")));

        let err = repo(store)
            .with_severity(Severity::Fatal)
            .get_all(Query::new())
            .await
            .unwrap_err();

        assert_eq!(err.code(), "permission-denied");
        assert_eq!(err.severity(), Severity::Fatal);
    }

    #[tokio::test]
    async fn test_unclassified_fault_becomes_unknown() {
        let mut store = MockDocumentStore::new();
        store
            .expect_get()
            .returning(|_, _| Err(ProviderFault::unclassified("socket hang up")));

        let err = repo(store).get_one("r1").await.unwrap_err();

        assert_eq!(err.code(), common::DEFAULT_CODE);
        assert_eq!(err.message(), domain::DEFAULT_ERROR_MESSAGE);
    }

    #[tokio::test]
    async fn test_missing_document_is_not_found() {
        let mut store = MockDocumentStore::new();
        store.expect_get().returning(|_, _| Ok(None));

        let err = repo(store).get_one("r1").await.unwrap_err();
        assert_eq!(err, AppError::DocumentNotFound);
        assert!(err.is_info());
    }

    #[tokio::test]
    async fn test_failed_create_does_not_reread() {
        let mut store = MockDocumentStore::new();
        store
            .expect_commit()
            .times(1)
            .returning(|_| Err(ProviderFault::coded("unavailable", "offline")));
        store.expect_get().never();

        let result = repo(store)
            .create_one(&serde_json::json!({ "email": "a@x.com" }), "r1")
            .await;
        assert!(result.is_err());
    }
}
