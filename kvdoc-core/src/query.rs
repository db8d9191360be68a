//! Query construction for collection scans.
//!
//! A [`Query`] is a conjunction of [`Filter`] triples, an optional field to
//! order by (always descending) and an optional limit.
//!
//! # Query Building
//!
//! ```ignore
//! use kvdoc::query::{Query, Filter};
//!
//! let query = Query::builder()
//!     .filter(Filter::eq("status", "completed"))
//!     .filter(Filter::gte("amount", 100))
//!     .order_by("date")
//!     .limit(10)
//!     .build();
//! ```
//!
//! Operators also parse from their symbols, which is how filters arrive from
//! untyped callers:
//!
//! ```ignore
//! let filter = Filter::new("userId", "==".parse()?, "u-1");
//! ```

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::{error::DocumentStoreError, value::Value};

/// Field comparison operators for filter triples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    /// Equal to (`==`).
    #[serde(rename = "==")]
    Eq,
    /// Not equal to (`!=`).
    #[serde(rename = "!=")]
    Ne,
    /// Greater than (`>`).
    #[serde(rename = ">")]
    Gt,
    /// Less than (`<`).
    #[serde(rename = "<")]
    Lt,
    /// Greater than or equal to (`>=`).
    #[serde(rename = ">=")]
    Gte,
    /// Less than or equal to (`<=`).
    #[serde(rename = "<=")]
    Lte,
}

impl Operator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Eq => "==",
            Operator::Ne => "!=",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Gte => ">=",
            Operator::Lte => "<=",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Operator {
    type Err = DocumentStoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "==" => Ok(Operator::Eq),
            "!=" => Ok(Operator::Ne),
            ">" => Ok(Operator::Gt),
            "<" => Ok(Operator::Lt),
            ">=" => Ok(Operator::Gte),
            "<=" => Ok(Operator::Lte),
            other => Err(DocumentStoreError::InvalidArgument(format!(
                "unknown filter operator {other:?}"
            ))),
        }
    }
}

/// A `(field, operator, value)` predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    /// The field name to compare.
    pub field: String,
    /// The comparison operator.
    #[serde(rename = "operator")]
    pub op: Operator,
    /// The value to compare against.
    pub value: Value,
}

impl Filter {
    /// Creates a filter triple.
    pub fn new(field: impl Into<String>, op: Operator, value: impl Into<Value>) -> Self {
        Filter { field: field.into(), op, value: value.into() }
    }

    /// Matches documents where the field equals the value.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Operator::Eq, value)
    }

    /// Matches documents where the field does not equal the value.
    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Operator::Ne, value)
    }

    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Operator::Gt, value)
    }

    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Operator::Lt, value)
    }

    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Operator::Gte, value)
    }

    pub fn lte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Operator::Lte, value)
    }
}

/// A collection scan: filters (ANDed), descending order field and limit.
///
/// The default query returns every document of the collection in index
/// (insertion) order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    /// Filters a document must all satisfy.
    #[serde(default)]
    pub filters: Vec<Filter>,
    /// Field to sort by, descending.
    #[serde(default, rename = "orderBy")]
    pub order_by: Option<String>,
    /// Maximum number of documents to return.
    #[serde(default)]
    pub limit: Option<usize>,
}

impl Query {
    /// Creates a query matching every document.
    pub fn new() -> Self {
        Query::default()
    }

    /// Creates a new query builder for fluent construction.
    pub fn builder() -> QueryBuilder {
        QueryBuilder::new()
    }

    /// Creates a query from its positional parts.
    pub fn from_parts(
        filters: impl IntoIterator<Item = Filter>,
        order_by: Option<&str>,
        limit: Option<usize>,
    ) -> Self {
        Query {
            filters: filters.into_iter().collect(),
            order_by: order_by.map(str::to_string),
            limit,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    query: Query,
}

impl QueryBuilder {
    /// Creates a new query builder.
    pub fn new() -> Self {
        QueryBuilder { query: Query::default() }
    }

    /// Adds a filter; all filters must match.
    pub fn filter(mut self, filter: Filter) -> Self {
        self.query.filters.push(filter);
        self
    }

    /// Adds several filters at once.
    pub fn filters(mut self, filters: impl IntoIterator<Item = Filter>) -> Self {
        self.query.filters.extend(filters);
        self
    }

    /// Orders results by the given field, largest first.
    pub fn order_by(mut self, field: impl Into<String>) -> Self {
        self.query.order_by = Some(field.into());
        self
    }

    /// Sets the maximum number of documents to return.
    pub fn limit(mut self, limit: usize) -> Self {
        self.query.limit = Some(limit);
        self
    }

    /// Builds and returns the final query.
    pub fn build(self) -> Query {
        self.query
    }
}
