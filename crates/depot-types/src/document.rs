//! Entity contracts for document and relational stores.

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Returns true when `value` equals the type's default.
///
/// This is the "unset id" probe used by the predicate builder: value-typed
/// ids (integers, zeroed uuids) never equal `null`, so absence is detected by
/// comparing against the default value instead.
pub fn is_default<T: Default + PartialEq>(value: &T) -> bool {
    *value == T::default()
}

/// A document-store entity with a unique id and a soft-delete marker.
///
/// The id is assigned at creation and never changes afterwards. Documents
/// with `is_deleted() == true` are excluded from default reads; a filter has
/// to ask for them explicitly.
pub trait Document: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Unique id type. `Default` doubles as the "unset" sentinel.
    type Id: Clone + Default + PartialEq + Serialize + Send + Sync + 'static;

    /// The document id.
    fn id(&self) -> Self::Id;

    /// Whether the document is soft-deleted.
    fn is_deleted(&self) -> bool;

    /// Set the soft-delete marker.
    fn set_deleted(&mut self, deleted: bool);
}

/// A relational-store entity identified by a primary-key value.
///
/// Rows are hard-deleted by key; there is no soft-delete marker here. The
/// asymmetry with [`Document`] is intentional and preserved per store kind.
pub trait Row: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Primary-key type.
    type Key: Clone + PartialEq + Serialize + Send + Sync + 'static;

    /// The primary-key value of this row.
    fn key(&self) -> Self::Key;
}
