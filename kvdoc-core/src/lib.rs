//! A local JSON document store layered over an asynchronous key-value substrate.
//!
//! This crate is the core of the kvdoc project and provides:
//!
//! - **Values and documents** ([`value`], [`document`]) - The closed field value type, field mappings and typed records
//! - **Substrate abstraction** ([`substrate`]) - The get/set/remove contract persistence implementations fulfil
//! - **Query API** ([`query`]) - Filter triples, descending ordering and limits
//! - **Document store** ([`store`]) - Create, get, query, update and delete over collections
//! - **Collections interface** ([`collection`]) - Untyped and typed collection handles
//! - **Id generation** ([`id`]) - Timestamp-based and uuid-based document ids
//! - **Configuration** ([`config`]) - Key layout and id strategy
//! - **Error handling** ([`error`]) - Error types and result types
//!
//! # Example
//!
//! ```ignore
//! use kvdoc::{prelude::*, memory::InMemoryKeyValueStore};
//!
//! let store = DocumentStore::new(InMemoryKeyValueStore::new());
//! let id = store.create("orders", document! { "amount" => 100 }, None).await?;
//!
//! let top = store
//!     .query("orders", Query::builder().order_by("amount").limit(5).build())
//!     .await?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as kvdoc_core;

#[macro_use]
pub mod document;
pub mod collection;
pub mod config;
pub mod error;
mod evaluator;
pub mod id;
mod locks;
pub mod query;
pub mod store;
pub mod substrate;
pub mod value;

#[cfg(test)]
mod testing;
