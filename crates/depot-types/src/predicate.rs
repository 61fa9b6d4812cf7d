//! Flat conjunction predicates for store queries.
//!
//! A [`Predicate`] is the value object a typed filter compiles down to at the
//! store boundary. It is deliberately not an expression tree: the only
//! combinator is a flat conjunction of equality and range terms, which every
//! supported store can evaluate natively.

use std::cmp::Ordering;

use serde_json::Value;

/// A store predicate: a single term or a flat conjunction of terms.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Matches every document. The collapse target for empty conjunctions,
    /// so an unconstrained filter never degenerates into "match nothing".
    All,

    /// Field equals value.
    Eq(String, Value),

    /// Field differs from value.
    Ne(String, Value),

    /// Field equals one of the listed values.
    In(String, Vec<Value>),

    /// Field lies within the (inclusive) bounds that are present.
    Range {
        field: String,
        min: Option<Value>,
        max: Option<Value>,
    },

    /// Every listed predicate holds.
    And(Vec<Predicate>),
}

impl Predicate {
    /// Collapse a list of terms into a predicate.
    ///
    /// Empty input yields [`Predicate::All`]; a single term is returned as
    /// itself rather than a one-element conjunction.
    pub fn conjunction(mut terms: Vec<Predicate>) -> Predicate {
        match terms.len() {
            0 => Predicate::All,
            1 => terms.remove(0),
            _ => Predicate::And(terms),
        }
    }

    /// Evaluate the predicate against a JSON document.
    ///
    /// Missing fields evaluate as `null`. Used by the in-memory backends;
    /// real drivers translate the predicate into their native query form.
    pub fn matches(&self, document: &Value) -> bool {
        match self {
            Predicate::All => true,
            Predicate::Eq(field, value) => field_of(document, field) == *value,
            Predicate::Ne(field, value) => field_of(document, field) != *value,
            Predicate::In(field, values) => values.contains(&field_of(document, field)),
            Predicate::Range { field, min, max } => {
                let actual = field_of(document, field);
                let above_min = min
                    .as_ref()
                    .map(|m| matches!(compare(&actual, m), Some(Ordering::Greater | Ordering::Equal)))
                    .unwrap_or(true);
                let below_max = max
                    .as_ref()
                    .map(|m| matches!(compare(&actual, m), Some(Ordering::Less | Ordering::Equal)))
                    .unwrap_or(true);
                above_min && below_max
            }
            Predicate::And(terms) => terms.iter().all(|t| t.matches(document)),
        }
    }
}

fn field_of(document: &Value, field: &str) -> Value {
    document.get(field).cloned().unwrap_or(Value::Null)
}

/// Order two JSON values when they are comparable (numbers or strings).
pub fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64().partial_cmp(&y.as_f64()),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}
