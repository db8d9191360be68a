//! Collection handles for document store operations.
//!
//! This module provides collection abstractions bound to a name and a
//! [`DocumentStore`]:
//!
//! - [`Collection`] - Untyped collection of [`Document`]s
//! - [`TypedCollection`] - Collection of serde [`Record`]s
//!
//! # Example
//!
//! ```ignore
//! use kvdoc::prelude::*;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! pub struct Expense {
//!     #[serde(default)]
//!     pub id: String,
//!     pub amount: f64,
//! }
//!
//! impl Record for Expense {
//!     fn collection_name() -> &'static str { "expenses" }
//! }
//!
//! let expenses = store.typed_collection::<Expense>();
//! let id = expenses.create(&Expense { id: String::new(), amount: 500.0 }, None).await?;
//! let stored = expenses.get(&id).await?.unwrap();
//! assert_eq!(stored.id, id);
//! ```

use serde_json::from_value;
use std::marker::PhantomData;

use crate::{
    document::{Document, Record, RecordExt},
    error::{DocumentStoreError, DocumentStoreResult},
    query::Query,
    store::DocumentStore,
    substrate::KeyValueStore,
};

/// An untyped collection bound to a store.
///
/// # Type Parameters
///
/// * `'a` - Lifetime of the store reference
/// * `S` - The key-value substrate type
#[derive(Debug)]
pub struct Collection<'a, S: KeyValueStore> {
    name: String,
    store: &'a DocumentStore<S>,
}

impl<'a, S: KeyValueStore> Collection<'a, S> {
    pub(crate) fn new(name: String, store: &'a DocumentStore<S>) -> Self {
        Self { name, store }
    }

    /// Returns the name of this collection.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Creates a document, generating an id unless one is given.
    ///
    /// # Errors
    ///
    /// Returns a [`DocumentStoreError`](crate::error::DocumentStoreError) if the operation fails.
    pub async fn create(&self, data: Document, id: Option<&str>) -> DocumentStoreResult<String> {
        self.store.create(&self.name, data, id).await
    }

    /// Retrieves a document by id, `None` if it does not exist.
    pub async fn get(&self, id: &str) -> DocumentStoreResult<Option<Document>> {
        self.store.get(&self.name, id).await
    }

    /// Queries documents in the collection.
    ///
    /// # Arguments
    ///
    /// * `query` - The [`Query`] specifying filters, ordering and limit
    pub async fn query(&self, query: Query) -> DocumentStoreResult<Vec<Document>> {
        self.store.query(&self.name, query).await
    }

    /// Returns every document in index order.
    pub async fn all(&self) -> DocumentStoreResult<Vec<Document>> {
        self.query(Query::new()).await
    }

    /// Shallow-merges `patch` into a document; `false` if it does not exist.
    pub async fn update(&self, id: &str, patch: Document) -> DocumentStoreResult<bool> {
        self.store.update(&self.name, id, patch).await
    }

    /// Atomic read-modify-write of one document.
    pub async fn update_with<F>(&self, id: &str, patch_fn: F) -> DocumentStoreResult<Option<Document>>
    where
        F: FnOnce(&Document) -> Document + Send,
    {
        self.store.update_with(&self.name, id, patch_fn).await
    }

    /// Deletes a document; deleting a missing document succeeds.
    pub async fn delete(&self, id: &str) -> DocumentStoreResult<bool> {
        self.store.delete(&self.name, id).await
    }

    /// Returns the ids of the collection in creation order.
    pub async fn ids(&self) -> DocumentStoreResult<Vec<String>> {
        self.store.ids(&self.name).await
    }
}

/// A collection of serde records bound to a store.
#[derive(Debug)]
pub struct TypedCollection<'a, S: KeyValueStore, R: Record> {
    inner: Collection<'a, S>,
    _marker: PhantomData<R>,
}

impl<'a, S: KeyValueStore, R: Record> TypedCollection<'a, S, R> {
    pub(crate) fn new(name: String, store: &'a DocumentStore<S>) -> Self {
        Self {
            inner: Collection::new(name, store),
            _marker: PhantomData,
        }
    }

    /// Returns the name of this collection.
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// Returns the untyped view of this collection.
    pub fn untyped(&self) -> &Collection<'a, S> {
        &self.inner
    }

    /// Stores a record and returns its id.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::InvalidDocument`]
    /// if the record does not serialize to a field mapping.
    pub async fn create(&self, record: &R, id: Option<&str>) -> DocumentStoreResult<String> {
        self.inner.create(record.to_document()?, id).await
    }

    /// Retrieves a record by id.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::MalformedData`] if the stored document
    /// does not deserialize into `R`.
    pub async fn get(&self, id: &str) -> DocumentStoreResult<Option<R>> {
        self.inner
            .get(id)
            .await?
            .map(|doc| self.decode(doc))
            .transpose()
    }

    /// Queries records in the collection.
    pub async fn query(&self, query: Query) -> DocumentStoreResult<Vec<R>> {
        self.inner
            .query(query)
            .await?
            .into_iter()
            .map(|doc| self.decode(doc))
            .collect::<Result<Vec<R>, _>>()
    }

    /// Shallow-merges `patch` into a stored record; `false` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::InvalidDocument`] and leaves the record
    /// untouched when the merged document would no longer deserialize into `R`.
    pub async fn update(&self, id: &str, patch: Document) -> DocumentStoreResult<bool> {
        let updated = self
            .inner
            .store
            .try_update_with(&self.inner.name, id, move |current| {
                let mut merged = current.clone();
                merged.merge(patch.clone());
                from_value::<R>(merged.into_json()).map_err(|err| {
                    DocumentStoreError::InvalidDocument(format!(
                        "patch does not fit the record: {err}"
                    ))
                })?;

                Ok(patch)
            })
            .await?;

        Ok(updated.is_some())
    }

    /// Deletes a record; deleting a missing record succeeds.
    pub async fn delete(&self, id: &str) -> DocumentStoreResult<bool> {
        self.inner.delete(id).await
    }

    fn decode(&self, doc: Document) -> DocumentStoreResult<R> {
        let key = self
            .inner
            .store
            .config()
            .document_key(&self.inner.name, doc.id().unwrap_or_default());

        from_value(doc.into_json()).map_err(|err| DocumentStoreError::malformed(key, err))
    }
}
