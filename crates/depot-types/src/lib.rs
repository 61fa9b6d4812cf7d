//! # Depot Types - Core Data Contracts
//!
//! Entity, filter, and predicate types shared by every depot crate.
//!
//! The repository layer is generic over three things: a [`Document`] (an
//! entity with a unique id and a soft-delete marker), a [`Filter`] (a value
//! object describing which documents a read should touch), and a
//! [`Predicate`] (the flat conjunction the filter compiles down to at the
//! store boundary). Relational entities use the lighter [`Row`] contract
//! instead of [`Document`].

#![deny(unsafe_code)]

pub mod document;
pub mod error;
pub mod filter;
pub mod predicate;

pub use document::{is_default, Document, Row};
pub use error::{StoreError, StoreResult};
pub use filter::{Filter, ScopedFilter};
pub use predicate::Predicate;
