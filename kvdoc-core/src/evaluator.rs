//! In-memory filter evaluation and ordering for collection scans.
//!
//! Filters are evaluated against a document's current field values. Ordered
//! comparisons (`>`, `<`, `>=`, `<=`) only hold between values of the same
//! type with a natural ordering (numbers, strings, booleans); anything else
//! compares as false. Sorting uses a total order in which a missing field
//! sorts as `Null`, the smallest value.

use std::cmp::Ordering;

use crate::{
    document::Document,
    query::{Filter, Operator, Query},
    value::Value,
};

/// Borrowed, comparable view over a [`Value`].
#[derive(Debug, Clone, Copy)]
pub(crate) enum Comparable<'a> {
    Null,
    Bool(bool),
    Number(f64),
    String(&'a str),
    Array(&'a [Value]),
    Map(&'a Document),
}

impl<'a> From<&'a Value> for Comparable<'a> {
    fn from(value: &'a Value) -> Self {
        match value {
            Value::Null => Comparable::Null,
            Value::Bool(value) => Comparable::Bool(*value),
            Value::Number(value) => Comparable::Number(*value),
            Value::String(value) => Comparable::String(value),
            Value::Array(values) => Comparable::Array(values),
            Value::Map(doc) => Comparable::Map(doc),
        }
    }
}

impl<'a> Comparable<'a> {
    /// Looks up a field, treating a missing field as `Null`.
    fn field(document: &'a Document, field: &str) -> Self {
        document
            .get(field)
            .map(Comparable::from)
            .unwrap_or(Comparable::Null)
    }

    /// Position of the variant in the cross-type sort order.
    fn rank(&self) -> u8 {
        match self {
            Comparable::Null => 0,
            Comparable::Bool(_) => 1,
            Comparable::Number(_) => 2,
            Comparable::String(_) => 3,
            Comparable::Array(_) => 4,
            Comparable::Map(_) => 5,
        }
    }

    /// Total order used for sorting.
    ///
    /// Values of different types order by type rank; unordered same-type
    /// values (arrays, maps, NaN) compare equal so a stable sort keeps their
    /// index order.
    pub(crate) fn sort_cmp(&self, other: &Self) -> Ordering {
        self.partial_cmp(other)
            .unwrap_or_else(|| self.rank().cmp(&other.rank()))
    }
}

impl<'a> PartialEq for Comparable<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl<'a> PartialOrd for Comparable<'a> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

pub(crate) struct DocumentEvaluator<'a> {
    document: &'a Document,
}

impl<'a> DocumentEvaluator<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self { document }
    }

    /// Returns `true` when every filter holds.
    pub fn matches_all(&self, filters: &[Filter]) -> bool {
        filters.iter().all(|filter| self.matches(filter))
    }

    pub fn matches(&self, filter: &Filter) -> bool {
        let expected = Comparable::from(&filter.value);

        match self.document.get(&filter.field) {
            Some(value) => {
                let actual = Comparable::from(value);

                match filter.op {
                    Operator::Eq => actual == expected,
                    Operator::Ne => actual != expected,
                    Operator::Gt => actual.partial_cmp(&expected).is_some_and(Ordering::is_gt),
                    Operator::Gte => actual.partial_cmp(&expected).is_some_and(Ordering::is_ge),
                    Operator::Lt => actual.partial_cmp(&expected).is_some_and(Ordering::is_lt),
                    Operator::Lte => actual.partial_cmp(&expected).is_some_and(Ordering::is_le),
                }
            }
            // A missing field differs from every value and is not ordered.
            None => filter.op == Operator::Ne,
        }
    }

    /// Applies filters, descending order and limit of `query` to `documents`.
    pub fn apply(documents: Vec<Document>, query: &Query) -> Vec<Document> {
        let mut matched = documents
            .into_iter()
            .filter(|doc| DocumentEvaluator::new(doc).matches_all(&query.filters))
            .collect::<Vec<_>>();

        if let Some(field) = &query.order_by {
            matched.sort_by(|a, b| {
                let left = Comparable::field(a, field);
                let right = Comparable::field(b, field);

                right.sort_cmp(&left)
            });
        }

        if let Some(limit) = query.limit {
            matched.truncate(limit);
        }

        matched
    }
}
