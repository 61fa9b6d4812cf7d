//! In-memory document store for testing and development.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use depot_types::{predicate, Predicate, StoreResult};
use parking_lot::RwLock;
use serde_json::Value;

use crate::{DocumentStore, FindOptions, StoreSession};

type Collections = HashMap<String, Vec<Value>>;

/// In-memory document store with full predicate, sort, and paging support.
///
/// Transactions are snapshot based: a session clones the whole store when a
/// transaction starts and restores it on abort. This serializes transactional
/// semantics process-wide, which is exactly what tests want and production
/// never uses.
#[derive(Clone)]
pub struct MemoryBackend {
    data: Arc<RwLock<Collections>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Number of documents currently in a collection, including soft-deleted
    /// ones. Test helper.
    pub fn collection_len(&self, collection: &str) -> usize {
        self.data
            .read()
            .get(collection)
            .map(|docs| docs.len())
            .unwrap_or(0)
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryBackend {
    async fn start_session(&self) -> StoreResult<Box<dyn StoreSession>> {
        Ok(Box::new(MemorySession {
            data: Arc::clone(&self.data),
            snapshot: None,
        }))
    }

    async fn find(
        &self,
        collection: &str,
        predicate: &Predicate,
        options: &FindOptions,
    ) -> StoreResult<Vec<Value>> {
        let store = self.data.read();

        let mut matches: Vec<Value> = store
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|doc| predicate.matches(doc))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        drop(store);

        if let Some(sort) = &options.sort {
            matches.sort_by(|a, b| {
                let left = a.get(&sort.field).cloned().unwrap_or(Value::Null);
                let right = b.get(&sort.field).cloned().unwrap_or(Value::Null);
                let ordering =
                    predicate::compare(&left, &right).unwrap_or(std::cmp::Ordering::Equal);
                if sort.ascending {
                    ordering
                } else {
                    ordering.reverse()
                }
            });
        }

        let skipped = options.skip.unwrap_or(0);
        let mut page: Vec<Value> = matches.into_iter().skip(skipped).collect();
        if let Some(limit) = options.limit {
            page.truncate(limit);
        }

        Ok(page)
    }

    async fn insert(&self, collection: &str, document: Value) -> StoreResult<()> {
        self.data
            .write()
            .entry(collection.to_string())
            .or_default()
            .push(document);
        Ok(())
    }

    async fn replace(
        &self,
        collection: &str,
        predicate: &Predicate,
        document: Value,
    ) -> StoreResult<()> {
        let mut store = self.data.write();
        if let Some(docs) = store.get_mut(collection) {
            if let Some(slot) = docs.iter_mut().find(|doc| predicate.matches(doc)) {
                *slot = document;
            }
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, predicate: &Predicate) -> StoreResult<()> {
        let mut store = self.data.write();
        if let Some(docs) = store.get_mut(collection) {
            docs.retain(|doc| !predicate.matches(doc));
        }
        Ok(())
    }
}

/// Session over a [`MemoryBackend`].
///
/// Dropping a session while its transaction is still open restores the
/// snapshot, so an uncommitted transaction rolls back.
pub struct MemorySession {
    data: Arc<RwLock<Collections>>,
    snapshot: Option<Collections>,
}

#[async_trait]
impl StoreSession for MemorySession {
    async fn start_transaction(&mut self) -> StoreResult<()> {
        self.snapshot = Some(self.data.read().clone());
        Ok(())
    }

    async fn commit_transaction(&mut self) -> StoreResult<()> {
        self.snapshot = None;
        Ok(())
    }

    async fn abort_transaction(&mut self) -> StoreResult<()> {
        if let Some(snapshot) = self.snapshot.take() {
            *self.data.write() = snapshot;
        }
        Ok(())
    }

    fn in_transaction(&self) -> bool {
        self.snapshot.is_some()
    }
}

impl Drop for MemorySession {
    fn drop(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            *self.data.write() = snapshot;
        }
    }
}
