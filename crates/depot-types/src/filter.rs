//! Typed read filters.
//!
//! A filter is a value object describing which documents a read touches. The
//! repository compiles it into a [`Predicate`] conjunction; the base
//! [`Filter`] trait only knows about the target id, and each filter type
//! contributes its extra terms through [`Filter::predicates`].

use serde_json::Value;
use uuid::Uuid;

use crate::document::is_default;
use crate::predicate::Predicate;

fn to_value<T: serde::Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

/// A typed filter over documents with id type `TId`.
///
/// `Default` is the unconstrained filter. A filter whose id is not the type
/// default narrows the result to at most one document.
pub trait Filter<TId>: Default + Send + Sync {
    /// The target id; the type default means "unconstrained".
    fn id(&self) -> &TId;

    /// A filter narrowed to exactly this id.
    fn with_id(id: TId) -> Self;

    /// Extra predicate terms beyond id equality.
    ///
    /// The repository appends these after the id term, so a filter type adds
    /// scope, deleted-flag, or set predicates by overriding this.
    fn predicates(&self) -> Vec<Predicate> {
        Vec::new()
    }
}

/// Standard filter for scope-owned, soft-deletable documents.
///
/// Defaults query only non-deleted documents across the current scope. The
/// tri-state `is_deleted` distinguishes "only live" (`Some(false)`), "only
/// deleted" (`Some(true)`), and "any" (`None`).
#[derive(Debug, Clone)]
pub struct ScopedFilter<TId> {
    /// Target document id; the type default means "unconstrained".
    pub id: TId,
    /// Owning scope to narrow to, unless `query_all_scopes` is set.
    pub scope_id: Option<Uuid>,
    /// Tri-state soft-delete constraint; `None` matches any.
    pub is_deleted: Option<bool>,
    /// Ignore `scope_id` and query every scope.
    pub query_all_scopes: bool,
    /// Ids to force-include.
    pub include_ids: Vec<TId>,
    /// Single id to exclude.
    pub exclude_id: Option<TId>,
}

impl<TId: Default> Default for ScopedFilter<TId> {
    fn default() -> Self {
        Self {
            id: TId::default(),
            scope_id: None,
            is_deleted: Some(false),
            query_all_scopes: false,
            include_ids: Vec::new(),
            exclude_id: None,
        }
    }
}

impl<TId> Filter<TId> for ScopedFilter<TId>
where
    TId: Clone + Default + PartialEq + serde::Serialize + Send + Sync,
{
    fn id(&self) -> &TId {
        &self.id
    }

    fn with_id(id: TId) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    fn predicates(&self) -> Vec<Predicate> {
        let mut terms = Vec::new();

        if let Some(scope) = self.scope_id {
            if !self.query_all_scopes {
                terms.push(Predicate::Eq("scope_id".to_string(), to_value(&scope)));
            }
        }

        if let Some(deleted) = self.is_deleted {
            terms.push(Predicate::Eq("is_deleted".to_string(), Value::Bool(deleted)));
        }

        if !self.include_ids.is_empty() {
            let values = self.include_ids.iter().map(to_value).collect();
            terms.push(Predicate::In("id".to_string(), values));
        }

        if let Some(excluded) = &self.exclude_id {
            if !is_default(excluded) {
                terms.push(Predicate::Ne("id".to_string(), to_value(excluded)));
            }
        }

        terms
    }
}
