//! Key-value substrate abstraction underneath the document store.
//!
//! The [`KeyValueStore`] trait is the only persistence primitive the document
//! store needs: string keys mapping to opaque text values. The substrate is
//! the single source of truth; the document store keeps no state of its own
//! across calls.
//!
//! # Traits
//!
//! - [`KeyValueStore`]: the asynchronous get/set/remove contract
//! - [`KeyValueStoreBuilder`]: factory trait for creating substrate instances
//!
//! # Examples
//!
//! ```ignore
//! use kvdoc::substrate::KeyValueStore;
//!
//! let kv = MyKeyValueStore::new();
//! kv.set("orders_a", r#"{"id":"a"}"#).await?;
//! assert_eq!(kv.get("orders_a").await?.as_deref(), Some(r#"{"id":"a"}"#));
//! kv.remove("orders_a").await?;
//! ```

use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

use crate::error::DocumentStoreResult;

/// Abstract interface for key-value persistence.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; the document store may be shared
/// between tasks.
///
/// # Error Handling
///
/// Failures are reported as
/// [`DocumentStoreError::Substrate`](crate::error::DocumentStoreError::Substrate)
/// and propagated to the caller unchanged. The document store never retries.
#[async_trait]
pub trait KeyValueStore: Send + Sync + Debug {
    /// Reads the value stored under `key`, or `None` if the key is absent.
    async fn get(&self, key: &str) -> DocumentStoreResult<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> DocumentStoreResult<()>;

    /// Removes `key`. Removing an absent key succeeds.
    async fn remove(&self, key: &str) -> DocumentStoreResult<()>;
}

#[async_trait]
impl<S> KeyValueStore for &S
where
    S: KeyValueStore + ?Sized,
{
    async fn get(&self, key: &str) -> DocumentStoreResult<Option<String>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> DocumentStoreResult<()> {
        (**self).set(key, value).await
    }

    async fn remove(&self, key: &str) -> DocumentStoreResult<()> {
        (**self).remove(key).await
    }
}

#[async_trait]
impl<S> KeyValueStore for Arc<S>
where
    S: KeyValueStore + ?Sized,
{
    async fn get(&self, key: &str) -> DocumentStoreResult<Option<String>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> DocumentStoreResult<()> {
        (**self).set(key, value).await
    }

    async fn remove(&self, key: &str) -> DocumentStoreResult<()> {
        (**self).remove(key).await
    }
}

#[async_trait]
impl<S> KeyValueStore for Box<S>
where
    S: KeyValueStore + ?Sized,
{
    async fn get(&self, key: &str) -> DocumentStoreResult<Option<String>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> DocumentStoreResult<()> {
        (**self).set(key, value).await
    }

    async fn remove(&self, key: &str) -> DocumentStoreResult<()> {
        (**self).remove(key).await
    }
}

/// A type-erased substrate, for choosing the persistence at runtime.
pub type DynKeyValueStore = Arc<dyn KeyValueStore>;

#[async_trait]
pub trait KeyValueStoreBuilder {
    type Store: KeyValueStore;

    async fn build(self) -> DocumentStoreResult<Self::Store>;
}
