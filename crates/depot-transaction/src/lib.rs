//! # Depot Transaction - Unit-of-Work Composition
//!
//! Transaction lifecycle primitives and the fluent unit-of-work builder that
//! sequences writes across unrelated repositories.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │                UnitOfWork                        │
//! │   ordered task list, one lazy Transaction        │
//! ├──────────────────────────────────────────────────┤
//! │             TransactionService                   │
//! │   create / commit / abort over a store session   │
//! ├──────────────────────────────────────────────────┤
//! │        TransactionRepository<M, I>               │
//! │   per-entity write contract (implemented by      │
//! │          the repository layer)                   │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! Tasks queued on a [`UnitOfWork`] run strictly in enqueue order; the first
//! failure aborts the transaction and surfaces unchanged to the caller.

#![deny(unsafe_code)]

pub mod builder;
pub mod transaction;

pub use builder::{UnitOfWork, UnitOfWorkFactory};
pub use transaction::{
    NoopTransactionService, SessionTransactionService, TaskError, Transaction, TransactionError,
    TransactionRepository, TransactionService,
};
