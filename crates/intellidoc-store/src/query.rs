//! Query description and evaluation.
//!
//! The substrate supports exact-match filters, array-membership filters,
//! conjunction of filters, and ordering by a single field. No disjunction,
//! no joins. Queries are plain data so they can be shipped to a remote
//! backend or evaluated locally by [`MemoryStore`](crate::MemoryStore).

use std::cmp::Ordering;

use serde_json::Value;

use crate::document::{Document, Fields};

/// A single conjunction term.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Field equals value exactly. A missing field never matches.
    FieldEq { field: String, value: Value },
    /// Field is an array containing the value.
    ArrayContains { field: String, value: Value },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// A query over one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: String,
    pub filters: Vec<Filter>,
    pub order_by: Option<(String, Direction)>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn collection(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            filters: Vec::new(),
            order_by: None,
            limit: None,
        }
    }

    pub fn filter_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::FieldEq {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn array_contains(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::ArrayContains {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some((field.into(), direction));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether a document's fields satisfy every filter.
    pub fn matches(&self, fields: &Fields) -> bool {
        self.filters.iter().all(|filter| match filter {
            Filter::FieldEq { field, value } => fields.get(field) == Some(value),
            Filter::ArrayContains { field, value } => fields
                .get(field)
                .and_then(Value::as_array)
                .is_some_and(|items| items.contains(value)),
        })
    }

    /// Apply ordering and the result limit to a matched set.
    pub fn arrange(&self, docs: &mut Vec<Document>) {
        if let Some((field, direction)) = &self.order_by {
            docs.sort_by(|a, b| {
                let av = a.get(field).unwrap_or(&Value::Null);
                let bv = b.get(field).unwrap_or(&Value::Null);
                let ord = compare_values(av, bv);
                match direction {
                    Direction::Ascending => ord,
                    Direction::Descending => ord.reverse(),
                }
            });
        }
        if let Some(limit) = self.limit {
            docs.truncate(limit);
        }
    }
}

/// Total order over JSON values: null < bool < number < string < array <
/// object; documents missing the order field sort as null.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::MIN);
            let y = y.as_f64().unwrap_or(f64::MIN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

fn type_rank(v: &Value) -> u8 {
    match v {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}
