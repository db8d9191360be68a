//! In-memory key-value substrate for kvdoc.
//!
//! This crate provides a thread-safe, in-memory implementation of the
//! `KeyValueStore` trait. It uses async-aware read-write locks for concurrent
//! access and is ideal for development, testing, and ephemeral data.
//!
//! # Quick Start
//!
//! ```ignore
//! use kvdoc::{prelude::*, memory::InMemoryKeyValueStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = DocumentStore::new(InMemoryKeyValueStore::builder().build().await?);
//!     let orders = store.collection("orders");
//!
//!     let id = orders.create(document! { "amount" => 100 }, None).await?;
//!     assert!(orders.get(&id).await?.is_some());
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as kvdoc_memory;

pub mod store;

pub use store::{InMemoryKeyValueStore, InMemoryKeyValueStoreBuilder};
