//! Main kvdoc crate: a local JSON document store over a key-value substrate.
//!
//! This crate is the entry point for users of kvdoc. It re-exports the core
//! types from `kvdoc-core` and the substrate implementations from their own
//! crates.
//!
//! # Features
//!
//! - **Collections of JSON documents** - Create, read, update and delete field mappings by id
//! - **Pluggable substrates** - Anything offering async get/set/remove of text values
//! - **Simple queries** - AND-ed filter triples, a descending sort field and a limit
//! - **Typed records** - Store and load serde types through typed collections
//!
//! # Quick Start
//!
//! ```ignore
//! use kvdoc::{prelude::*, memory::InMemoryKeyValueStore};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! pub struct Expense {
//!     #[serde(default)]
//!     pub id: String,
//!     pub category: String,
//!     pub amount: f64,
//! }
//!
//! impl Record for Expense {
//!     fn collection_name() -> &'static str { "expenses" }
//! }
//!
//! #[tokio::main]
//! async fn main() -> DocumentStoreResult<()> {
//!     let store = DocumentStore::new(InMemoryKeyValueStore::new());
//!     let expenses = store.typed_collection::<Expense>();
//!
//!     let expense = Expense { id: String::new(), category: "office".into(), amount: 150.0 };
//!     let id = expenses.create(&expense, None).await?;
//!
//!     let largest = expenses
//!         .query(
//!             Query::builder()
//!                 .filter(Filter::gt("amount", 100))
//!                 .order_by("amount")
//!                 .limit(10)
//!                 .build(),
//!         )
//!         .await?;
//!     assert_eq!(largest[0].id, id);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Untyped documents
//!
//! Collections can also be used with plain [`document::Document`] values
//! built with the [`document!`] macro:
//!
//! ```ignore
//! let orders = store.collection("orders");
//! let id = orders.create(document! { "amount" => 2500, "status" => "completed" }, None).await?;
//! orders.update(&id, document! { "status" => "cancelled" }).await?;
//! ```
//!
//! # Substrates
//!
//! - [`memory`] - In-memory substrate for development and testing
//! - [`fs`] - One file per key in a directory (requires the `fs` feature, on by default)

pub mod prelude;

pub use kvdoc_core::{
    collection, config, document, error, id, query, store, substrate, value,
};

/// In-memory substrate implementations.
pub mod memory {
    pub use kvdoc_memory::{InMemoryKeyValueStore, InMemoryKeyValueStoreBuilder};
}

/// Filesystem substrate implementations.
///
/// This module is only available when the `fs` feature is enabled.
#[cfg(feature = "fs")]
pub mod fs {
    pub use kvdoc_fs::{FsKeyValueStore, FsKeyValueStoreBuilder};
}

/// Per-user orders, expenses, taxes and customers with derived metrics.
///
/// This module is only available when the `business` feature is enabled.
#[cfg(feature = "business")]
pub use kvdoc_business as business;
