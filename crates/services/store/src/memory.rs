//! In-memory document store.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

use common::ProviderFault;

use crate::document::{apply_write, Document, DocumentEvent, Fields, Write};
use crate::path::CollectionPath;
use crate::query::Query;
use crate::store::{DocumentStore, PathGuard, PathLocks, ServerClock, EVENT_CAPACITY};

type Key = (String, String);

/// Document store kept in a sorted map; used by tests and the demo CLI mode.
pub struct MemoryStore {
    documents: RwLock<BTreeMap<Key, Fields>>,
    clock: ServerClock,
    locks: PathLocks,
    events: broadcast::Sender<DocumentEvent>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            documents: RwLock::new(BTreeMap::new()),
            clock: ServerClock::new(),
            locks: PathLocks::new(),
            events,
        }
    }

    /// Number of stored documents across all collections
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, path: &CollectionPath, id: &str) -> Result<Option<Document>, ProviderFault> {
        let documents = self.documents.read().await;
        Ok(documents
            .get(&(path.as_str().to_string(), id.to_string()))
            .map(|fields| Document::new(path.as_str(), id, fields.clone())))
    }

    async fn query(
        &self,
        path: &CollectionPath,
        query: &Query,
    ) -> Result<Vec<Document>, ProviderFault> {
        let documents = self.documents.read().await;
        let in_path = documents
            .iter()
            .filter(|((p, _), _)| p == path.as_str())
            .map(|((p, id), fields)| Document::new(p.as_str(), id.as_str(), fields.clone()));
        Ok(query.apply(in_path))
    }

    async fn commit(&self, writes: Vec<Write>) -> Result<(), ProviderFault> {
        if writes.is_empty() {
            return Ok(());
        }

        let mut documents = self.documents.write().await;
        let stamp = self.clock.next();

        // Stage on a copy of the touched documents so a failing write leaves nothing applied
        let mut staged: BTreeMap<Key, Option<Fields>> = BTreeMap::new();
        let mut events = Vec::with_capacity(writes.len());

        for write in &writes {
            let key = (write.path().as_str().to_string(), write.id().to_string());
            let current = match staged.get(&key) {
                Some(state) => state.clone(),
                None => documents.get(&key).cloned(),
            };
            let (next, event) = apply_write(write, current.as_ref(), &stamp)?;
            staged.insert(key, next);
            events.extend(event);
        }

        for (key, state) in staged {
            match state {
                Some(fields) => {
                    documents.insert(key, fields);
                }
                None => {
                    documents.remove(&key);
                }
            }
        }
        drop(documents);

        debug!(writes = writes.len(), "Committed writes");
        for event in events {
            // No subscribers is not an error
            let _ = self.events.send(event);
        }
        Ok(())
    }

    async fn lock(&self, path: &CollectionPath) -> PathGuard {
        self.locks.lock(path).await
    }

    fn subscribe(&self) -> broadcast::Receiver<DocumentEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::EventKind;
    use serde_json::{json, Value};

    fn fields(value: Value) -> Fields {
        match value {
            Value::Object(map) => map,
            _ => Fields::new(),
        }
    }

    fn roles() -> CollectionPath {
        CollectionPath::new("roles").unwrap()
    }

    fn set(id: &str, value: Value) -> Write {
        Write::Set {
            path: roles(),
            id: id.to_string(),
            fields: fields(value),
        }
    }

    #[tokio::test]
    async fn test_set_stamps_both_timestamps() {
        let store = MemoryStore::new();
        store.commit(vec![set("r1", json!({ "email": "a@x.com" }))]).await.unwrap();

        let doc = store.get(&roles(), "r1").await.unwrap().unwrap();
        assert_eq!(doc.fields["email"], json!("a@x.com"));
        assert!(doc.created_at().is_some());
        assert_eq!(doc.created_at(), doc.updated_at());
    }

    #[tokio::test]
    async fn test_failed_commit_applies_nothing() {
        let store = MemoryStore::new();
        let merge_missing = Write::Merge {
            path: roles(),
            id: "missing".to_string(),
            fields: fields(json!({ "disabled": true })),
        };

        let result = store
            .commit(vec![set("r1", json!({ "email": "a@x.com" })), merge_missing])
            .await;

        assert!(matches!(result, Err(ProviderFault::Coded { .. })));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_events_follow_commits() {
        let store = MemoryStore::new();
        let mut events = store.subscribe();

        store.commit(vec![set("r1", json!({ "email": "a@x.com" }))]).await.unwrap();
        store
            .commit(vec![Write::Delete { path: roles(), id: "r1".to_string() }])
            .await
            .unwrap();

        let created = events.recv().await.unwrap();
        assert_eq!(created.kind, EventKind::Created);
        assert_eq!(created.snapshot().unwrap()["email"], json!("a@x.com"));

        let deleted = events.recv().await.unwrap();
        assert_eq!(deleted.kind, EventKind::Deleted);
        assert!(deleted.after.is_none());
    }

    #[tokio::test]
    async fn test_query_is_scoped_to_path() {
        let store = MemoryStore::new();
        store
            .commit(vec![
                set("r1", json!({ "email": "a@x.com" })),
                Write::Set {
                    path: CollectionPath::new("admin").unwrap(),
                    id: "a1".to_string(),
                    fields: fields(json!({ "email": "boss@x.com" })),
                },
            ])
            .await
            .unwrap();

        let docs = store.query(&roles(), &Query::new()).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, "r1");
    }
}
