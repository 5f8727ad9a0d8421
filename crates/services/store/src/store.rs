//! Document store boundary.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::{broadcast, Mutex as AsyncMutex, OwnedMutexGuard};

use common::ProviderFault;

use crate::document::{format_timestamp, Document, DocumentEvent, Write};
use crate::path::CollectionPath;
use crate::query::Query;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Buffered change events per store before slow subscribers start lagging
pub const EVENT_CAPACITY: usize = 1024;

/// Guard holding the transaction lock of one collection path
pub type PathGuard = OwnedMutexGuard<()>;

/// Backend holding collections of JSON documents.
///
/// Implementations report raw [`ProviderFault`]s; callers normalise them.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read one document
    async fn get(&self, path: &CollectionPath, id: &str) -> Result<Option<Document>, ProviderFault>;

    /// Read every document of a collection that passes `query`
    async fn query(
        &self,
        path: &CollectionPath,
        query: &Query,
    ) -> Result<Vec<Document>, ProviderFault>;

    /// Apply all writes or none of them
    async fn commit(&self, writes: Vec<Write>) -> Result<(), ProviderFault>;

    /// Serialise read-then-write transactions on one path
    async fn lock(&self, path: &CollectionPath) -> PathGuard;

    /// Receive events for every committed change
    fn subscribe(&self) -> broadcast::Receiver<DocumentEvent>;
}

/// Issues strictly increasing server timestamps.
#[derive(Debug)]
pub struct ServerClock {
    last: Mutex<Option<DateTime<Utc>>>,
}

impl ServerClock {
    pub fn new() -> Self {
        Self {
            last: Mutex::new(None),
        }
    }

    /// Next stamp, never equal to or earlier than a previous one
    pub fn next(&self) -> String {
        let mut last = match self.last.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let now = Utc::now();
        let stamp = match *last {
            Some(previous) if now <= previous => previous + Duration::microseconds(1),
            _ => now,
        };
        *last = Some(stamp);
        format_timestamp(stamp)
    }
}

impl Default for ServerClock {
    fn default() -> Self {
        Self::new()
    }
}

/// In-process registry of per-path transaction locks.
#[derive(Debug, Default)]
pub struct PathLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl PathLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, path: &CollectionPath) -> PathGuard {
        let lock = {
            let mut locks = match self.locks.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            locks
                .entry(path.as_str().to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}
