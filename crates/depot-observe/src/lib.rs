//! # Depot Observe - Observability Layer
//!
//! Structured logging for the data layer.

#![deny(unsafe_code)]

pub mod logging;

pub use logging::{init_logging, LogConfig, LogFormat};
