//! Convenient re-exports of commonly used types from kvdoc.
//!
//! ```ignore
//! use kvdoc::prelude::*;
//! ```

pub use kvdoc_core::{
    collection::{Collection, TypedCollection},
    config::StoreConfig,
    document,
    document::{Document, Record, RecordExt},
    error::{DocumentStoreError, DocumentStoreResult},
    id::{IdGenerator, IdStrategy, TimestampIdGenerator, UuidIdGenerator},
    query::{Filter, Operator, Query, QueryBuilder},
    store::{DocumentStore, DocumentStoreBuilder},
    substrate::{DynKeyValueStore, KeyValueStore, KeyValueStoreBuilder},
    value::Value,
};
