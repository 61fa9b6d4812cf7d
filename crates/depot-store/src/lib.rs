//! # Depot Store - Store Driver Boundary
//!
//! Abstract driver traits the data layer is written against, plus in-memory
//! backends for testing and development.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │              Repository Layer                    │
//! │        (depot-repository, typed entities)        │
//! ├──────────────────────────────────────────────────┤
//! │              Driver Boundary                     │
//! │   DocumentStore + StoreSession  │  RowStore      │
//! │        (untyped Value documents)                 │
//! ├──────────────────────────────────────────────────┤
//! │   MemoryBackend / MemoryRowBackend / drivers     │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! Documents cross the boundary as [`serde_json::Value`]; typing and
//! serialization live one layer up so the driver traits stay object safe.

#![deny(unsafe_code)]

use async_trait::async_trait;
use depot_types::{Predicate, StoreResult};
use serde_json::Value;

pub mod factory;
pub mod memory;
pub mod row;

pub use factory::{BackendType, StoreConfig};
pub use memory::MemoryBackend;
pub use row::{MemoryRowBackend, RowStore};

/// Sort directive for a find operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    /// Field to sort by.
    pub field: String,
    /// Ascending when true, descending otherwise.
    pub ascending: bool,
}

/// Options for a find operation. The default applies no sort, skip, or limit.
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    /// Number of matching documents to skip.
    pub skip: Option<usize>,
    /// Maximum number of documents to return.
    pub limit: Option<usize>,
    /// Optional server-side sort; `None` leaves store-defined order.
    pub sort: Option<Sort>,
}

impl FindOptions {
    /// Options with only a limit set.
    pub fn limited(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }
}

/// A session over one store connection.
///
/// A session owns at most one transaction at a time. What happens to an
/// uncommitted transaction when the session is dropped is driver-defined;
/// this layer never commits on the caller's behalf.
#[async_trait]
pub trait StoreSession: Send + Sync {
    /// Begin a transaction on this session.
    async fn start_transaction(&mut self) -> StoreResult<()>;

    /// Commit the active transaction.
    async fn commit_transaction(&mut self) -> StoreResult<()>;

    /// Abort the active transaction.
    async fn abort_transaction(&mut self) -> StoreResult<()>;

    /// Whether a transaction is currently active.
    fn in_transaction(&self) -> bool;
}

/// The abstract document store interface.
///
/// Collections are addressed by name; documents travel as raw JSON values.
/// Every method is a suspension point.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Open a new session for transactional work.
    async fn start_session(&self) -> StoreResult<Box<dyn StoreSession>>;

    /// Find documents in a collection matching the predicate.
    async fn find(
        &self,
        collection: &str,
        predicate: &Predicate,
        options: &FindOptions,
    ) -> StoreResult<Vec<Value>>;

    /// Insert one document into a collection.
    async fn insert(&self, collection: &str, document: Value) -> StoreResult<()>;

    /// Replace the first document matching the predicate.
    async fn replace(&self, collection: &str, predicate: &Predicate, document: Value)
        -> StoreResult<()>;

    /// Physically delete all documents matching the predicate.
    async fn delete(&self, collection: &str, predicate: &Predicate) -> StoreResult<()>;
}
