//! In-memory key-value substrate.
//!
//! This module provides a simple substrate that keeps every key in a HashMap
//! behind an async-aware read-write lock.

use async_trait::async_trait;
use mea::rwlock::RwLock;
use std::{collections::HashMap, sync::Arc};
use tracing::trace;

use kvdoc_core::{
    error::DocumentStoreResult,
    substrate::{KeyValueStore, KeyValueStoreBuilder},
};

type EntryMap = HashMap<String, String>;

/// Thread-safe in-memory key-value substrate.
///
/// # Thread Safety
///
/// `InMemoryKeyValueStore` is cloneable and uses an `Arc`-wrapped internal
/// state, allowing it to be safely shared across async tasks. Multiple clones
/// of the same instance share the same underlying data.
///
/// # Example
///
/// ```ignore
/// use kvdoc_memory::InMemoryKeyValueStore;
/// use kvdoc::substrate::KeyValueStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let kv = InMemoryKeyValueStore::new();
///
///     kv.set("orders_a", r#"{"id":"a"}"#).await?;
///     assert!(kv.get("orders_a").await?.is_some());
///
///     Ok(())
/// }
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryKeyValueStore {
    entries: Arc<RwLock<EntryMap>>,
}

impl InMemoryKeyValueStore {
    /// Creates a new empty in-memory substrate.
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(EntryMap::new())),
        }
    }

    /// Creates a builder for constructing an `InMemoryKeyValueStore`.
    pub fn builder() -> InMemoryKeyValueStoreBuilder {
        InMemoryKeyValueStoreBuilder::default()
    }

    /// Number of keys currently stored.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// All keys currently stored, sorted.
    pub async fn keys(&self) -> Vec<String> {
        let mut keys = self
            .entries
            .read()
            .await
            .keys()
            .cloned()
            .collect::<Vec<_>>();
        keys.sort();

        keys
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn get(&self, key: &str) -> DocumentStoreResult<Option<String>> {
        trace!(key, "memory get");

        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> DocumentStoreResult<()> {
        trace!(key, bytes = value.len(), "memory set");
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());

        Ok(())
    }

    async fn remove(&self, key: &str) -> DocumentStoreResult<()> {
        trace!(key, "memory remove");
        self.entries.write().await.remove(key);

        Ok(())
    }
}

/// Builder for constructing [`InMemoryKeyValueStore`] instances.
///
/// Optionally seeds the store with initial entries, which is how fixtures and
/// previously exported data are loaded.
#[derive(Default)]
pub struct InMemoryKeyValueStoreBuilder {
    seed: EntryMap,
}

impl InMemoryKeyValueStoreBuilder {
    /// Adds an entry present when the store is built.
    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.seed.insert(key.into(), value.into());
        self
    }
}

#[async_trait]
impl KeyValueStoreBuilder for InMemoryKeyValueStoreBuilder {
    type Store = InMemoryKeyValueStore;

    async fn build(self) -> DocumentStoreResult<Self::Store> {
        Ok(InMemoryKeyValueStore {
            entries: Arc::new(RwLock::new(self.seed)),
        })
    }
}
