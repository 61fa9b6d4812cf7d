//! Typed collection handles.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use tracing::Instrument;

use depot_observe::logging::{record_storage_result, storage_span};
use depot_store::{DocumentStore, FindOptions};
use depot_types::{Document, Predicate};

use crate::error::{RepositoryError, RepositoryResult};

/// Serialize an entity into the document shape the driver expects.
pub(crate) fn to_document<T: serde::Serialize>(entity: &T) -> RepositoryResult<Value> {
    serde_json::to_value(entity).map_err(RepositoryError::serialization)
}

/// A typed handle to one named collection.
///
/// Serialization happens here, at the seam between typed entities and the
/// untyped driver boundary. Handles are cheap to clone and resolved at most
/// once per context.
pub struct Collection<D: Document> {
    store: Arc<dyn DocumentStore>,
    name: String,
    _marker: PhantomData<fn() -> D>,
}

impl<D: Document> Clone for Collection<D> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            name: self.name.clone(),
            _marker: PhantomData,
        }
    }
}

impl<D: Document> Collection<D> {
    pub(crate) fn new(store: Arc<dyn DocumentStore>, name: impl Into<String>) -> Self {
        Self {
            store,
            name: name.into(),
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Find documents matching the predicate, materialized eagerly.
    pub async fn find(
        &self,
        predicate: &Predicate,
        options: &FindOptions,
    ) -> RepositoryResult<Vec<D>> {
        let span = storage_span("find", &self.name);
        let started = Instant::now();
        let raw = self
            .store
            .find(&self.name, predicate, options)
            .instrument(span.clone())
            .await?;
        record_storage_result(&span, started.elapsed().as_millis());
        raw.into_iter()
            .map(|doc| serde_json::from_value(doc).map_err(RepositoryError::serialization))
            .collect()
    }

    /// Insert the entity immediately.
    pub async fn insert(&self, entity: &D) -> RepositoryResult<()> {
        let document = to_document(entity)?;
        let span = storage_span("insert", &self.name);
        let started = Instant::now();
        self.store
            .insert(&self.name, document)
            .instrument(span.clone())
            .await?;
        record_storage_result(&span, started.elapsed().as_millis());
        Ok(())
    }

    /// Replace the first document matching the predicate immediately.
    pub async fn replace(&self, predicate: &Predicate, entity: &D) -> RepositoryResult<()> {
        let document = to_document(entity)?;
        let span = storage_span("replace", &self.name);
        let started = Instant::now();
        self.store
            .replace(&self.name, predicate, document)
            .instrument(span.clone())
            .await?;
        record_storage_result(&span, started.elapsed().as_millis());
        Ok(())
    }
}
