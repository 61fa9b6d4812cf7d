//! Filter to predicate compilation.

use serde_json::Value;

use depot_types::{is_default, Filter, Predicate};

/// Id-equality predicate for a single document.
pub(crate) fn id_predicate<TId: serde::Serialize>(id: &TId) -> Predicate {
    Predicate::Eq(
        "id".to_string(),
        serde_json::to_value(id).unwrap_or(Value::Null),
    )
}

/// Compile a filter into a store predicate.
///
/// Terms, in precedence order: id equality when the id is not the type
/// default, then the filter's own extra terms. An empty conjunction collapses
/// to the match-everything predicate, so an unconstrained filter never
/// degenerates into "match nothing". Pure, no I/O.
pub fn build_predicate<TId, F>(filter: &F) -> Predicate
where
    TId: Clone + Default + PartialEq + serde::Serialize + Send + Sync + 'static,
    F: Filter<TId>,
{
    let mut terms = Vec::new();

    if !is_default(filter.id()) {
        terms.push(id_predicate(filter.id()));
    }
    terms.extend(filter.predicates());

    Predicate::conjunction(terms)
}
