//! Document store persisted through SeaORM.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, error};

use common::ProviderFault;
use domain::{FIELD_CREATED_AT, FIELD_UPDATED_AT};

use crate::document::{apply_write, Document, DocumentEvent, Fields, Write};
use crate::entities::document::{self, ActiveModel, Entity as DocumentEntity};
use crate::path::CollectionPath;
use crate::query::Query;
use crate::store::{DocumentStore, PathGuard, PathLocks, ServerClock, EVENT_CAPACITY};

type Key = (String, String);

/// Document store backed by the `documents` table.
///
/// Queries load the collection and evaluate in process, so every backend
/// shares one filtering and ordering implementation.
pub struct SqlStore {
    db: DatabaseConnection,
    clock: ServerClock,
    locks: PathLocks,
    events: broadcast::Sender<DocumentEvent>,
}

impl SqlStore {
    /// Create new store over a migrated connection
    pub fn new(db: DatabaseConnection) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            db,
            clock: ServerClock::new(),
            locks: PathLocks::new(),
            events,
        }
    }
}

fn stamp_of(fields: &Fields, name: &str) -> String {
    fields
        .get(name)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn active_model(key: &Key, fields: &Fields) -> Result<ActiveModel, ProviderFault> {
    let encoded = serde_json::to_string(fields)
        .map_err(|e| ProviderFault::coded("invalid-argument", e.to_string()))?;
    Ok(ActiveModel {
        path: Set(key.0.clone()),
        doc_id: Set(key.1.clone()),
        fields: Set(encoded),
        created_at: Set(stamp_of(fields, FIELD_CREATED_AT)),
        updated_at: Set(stamp_of(fields, FIELD_UPDATED_AT)),
    })
}

#[async_trait]
impl DocumentStore for SqlStore {
    async fn get(&self, path: &CollectionPath, id: &str) -> Result<Option<Document>, ProviderFault> {
        let model = DocumentEntity::find_by_id((path.as_str().to_string(), id.to_string()))
            .one(&self.db)
            .await?;

        model.map(document::Model::into_document).transpose()
    }

    async fn query(
        &self,
        path: &CollectionPath,
        query: &Query,
    ) -> Result<Vec<Document>, ProviderFault> {
        let models = DocumentEntity::find()
            .filter(document::Column::Path.eq(path.as_str()))
            .all(&self.db)
            .await?;

        let documents = models
            .into_iter()
            .map(document::Model::into_document)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(query.apply(documents))
    }

    async fn commit(&self, writes: Vec<Write>) -> Result<(), ProviderFault> {
        if writes.is_empty() {
            return Ok(());
        }

        let txn = self.db.begin().await?;
        let stamp = self.clock.next();

        let mut persisted: HashSet<Key> = HashSet::new();
        let mut staged: BTreeMap<Key, Option<Fields>> = BTreeMap::new();
        let mut events = Vec::with_capacity(writes.len());

        for write in &writes {
            let key = (write.path().as_str().to_string(), write.id().to_string());
            let current = match staged.get(&key) {
                Some(state) => state.clone(),
                None => {
                    let model = DocumentEntity::find_by_id(key.clone()).one(&txn).await?;
                    if model.is_some() {
                        persisted.insert(key.clone());
                    }
                    model.map(|m| m.parse_fields()).transpose()?
                }
            };

            match apply_write(write, current.as_ref(), &stamp) {
                Ok((next, event)) => {
                    staged.insert(key, next);
                    events.extend(event);
                }
                Err(fault) => {
                    if let Err(rollback_err) = txn.rollback().await {
                        error!("Transaction rollback failed: {}", rollback_err);
                    }
                    return Err(fault);
                }
            }
        }

        for (key, state) in &staged {
            match (state, persisted.contains(key)) {
                (Some(fields), true) => {
                    active_model(key, fields)?.update(&txn).await?;
                }
                (Some(fields), false) => {
                    DocumentEntity::insert(active_model(key, fields)?)
                        .exec(&txn)
                        .await?;
                }
                (None, true) => {
                    DocumentEntity::delete_by_id(key.clone()).exec(&txn).await?;
                }
                (None, false) => {}
            }
        }

        txn.commit().await?;
        debug!(writes = writes.len(), "Committed writes");

        for event in events {
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
