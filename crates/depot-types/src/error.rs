//! Store-level error types.

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised at the store driver boundary.
///
/// Everything above the driver propagates these unchanged; there is no
/// automatic retry anywhere in the data layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Connection or session establishment failed.
    #[error("Store connection error: {0}")]
    Connection(String),

    /// Serialization or deserialization of a document failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The backing database reported a failure.
    #[error("Database error: {0}")]
    Database(String),

    /// Operation timed out.
    #[error("Operation timed out")]
    Timeout,

    /// Internal error in the store layer.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl StoreError {
    /// Shorthand for a serialization error from any serde failure.
    pub fn serialization(err: impl std::fmt::Display) -> Self {
        StoreError::Serialization(err.to_string())
    }
}
