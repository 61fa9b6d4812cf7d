//! Repository error types.
//!
//! Store failures pass through unchanged; the repository layer only adds the
//! variants it can raise itself.

use depot_types::StoreError;

/// Result type alias for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Errors that can occur during repository operations.
///
/// Absence is never an error here. A missing document reads as `None` or an
/// empty result; only a broken invariant or a failing collaborator raises.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// More than one document matched an id-scoped filter. This signals a
    /// broken uniqueness invariant, not an expected path.
    #[error("Ambiguous result: {0}")]
    Ambiguous(String),

    /// Serialization or deserialization of a document failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The store driver reported a failure. Forwarded unchanged.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl RepositoryError {
    /// Shorthand for a serialization error from any serde failure.
    pub fn serialization(err: impl std::fmt::Display) -> Self {
        RepositoryError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RepositoryError::Ambiguous("2 documents matched".to_string());
        assert_eq!(err.to_string(), "Ambiguous result: 2 documents matched");

        let err = RepositoryError::serialization("bad json");
        assert_eq!(err.to_string(), "Serialization error: bad json");
    }

    #[test]
    fn test_store_errors_pass_through_unchanged() {
        let err: RepositoryError = StoreError::Timeout.into();
        assert_eq!(err.to_string(), StoreError::Timeout.to_string());
    }
}
