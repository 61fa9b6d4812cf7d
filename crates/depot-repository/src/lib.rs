//! # Depot Repository - Data Access Layer
//!
//! Per-entity repositories over the store driver boundary, with deferred
//! writes staged on a per-unit-of-work storage context.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │   DocumentRepository<D, F> │ RowRepository<M>    │
//! │   (soft delete, filters)   │ (two-tier cache,    │
//! │                            │  hard delete)       │
//! ├──────────────────────────────────────────────────┤
//! │                StorageContext                    │
//! │      deferred Command queue + fan-out commit     │
//! ├──────────────────────────────────────────────────┤
//! │        DocumentStore / RowStore drivers          │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! Reads bypass the queue entirely, so a read issued before a commit never
//! sees staged writes. Within one context commit the staged commands run
//! concurrently; ordered cross-repository execution lives in the unit-of-work
//! builder one crate up.

#![deny(unsafe_code)]

pub mod collection;
pub mod context;
pub mod document;
pub mod error;
pub mod query;
pub mod row;

pub use collection::Collection;
pub use context::{Command, Operation, StorageContext};
pub use document::DocumentRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use query::build_predicate;
pub use row::RowRepository;
