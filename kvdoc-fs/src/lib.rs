//! Filesystem key-value substrate for kvdoc.
//!
//! Stores each key as one file in a directory, giving documents the
//! durability of the local disk.
//!
//! # Quick Start
//!
//! ```ignore
//! use kvdoc::{prelude::*, fs::FsKeyValueStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let kv = FsKeyValueStore::builder("./data").build().await?;
//!     let store = DocumentStore::new(kv);
//!
//!     store.create("orders", document! { "amount" => 100 }, None).await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as kvdoc_fs;

pub mod store;

pub use store::{FsKeyValueStore, FsKeyValueStoreBuilder};
