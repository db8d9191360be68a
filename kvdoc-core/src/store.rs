//! The document store: collection semantics over a key-value substrate.
//!
//! [`DocumentStore`] is an explicit instance built once around a substrate
//! handle and passed to every caller. It translates collection-scoped
//! operations into substrate reads and writes:
//!
//! - each document lives under `"<collection>_<id>"` as JSON text;
//! - each collection keeps an index under `"collection_<collection>"`, a JSON
//!   array of ids in insertion order.
//!
//! Both layouts share one key space, so a collection named `collection` (or
//! anything starting with `collection_`) could overwrite another collection's
//! index. Such names are rejected with
//! [`DocumentStoreError::InvalidArgument`]; see
//! [`StoreConfig::collides_with_index`].
//!
//! Queries scan the whole index and filter, sort and truncate in memory.
//! Nothing is cached between calls.
//!
//! # Concurrency
//!
//! Within one store instance, index mutations are serialized per collection
//! and writes per document, so concurrent creates never duplicate an index
//! entry and [`DocumentStore::update_with`] performs atomic read-modify-write.
//! Separate instances over the same substrate are last-write-wins.
//!
//! # Example
//!
//! ```ignore
//! use kvdoc::{prelude::*, memory::InMemoryKeyValueStore};
//!
//! let store = DocumentStore::new(InMemoryKeyValueStore::new());
//! let orders = store.collection("orders");
//!
//! let id = orders.create(document! { "amount" => 100, "status" => "completed" }, None).await?;
//! let order = orders.get(&id).await?.unwrap();
//! assert_eq!(order.get_f64("amount"), Some(100.0));
//! ```

use chrono::{DateTime, Duration, SecondsFormat, SubsecRound, Utc};
use std::sync::Arc;
use tracing::{debug, error, trace, warn};

use crate::{
    collection::{Collection, TypedCollection},
    config::StoreConfig,
    document::{CREATED_AT_FIELD, Document, ID_FIELD, Record, UPDATED_AT_FIELD},
    error::{DocumentStoreError, DocumentStoreResult},
    evaluator::DocumentEvaluator,
    id::IdGenerator,
    locks::KeyedLocks,
    query::Query,
    substrate::KeyValueStore,
};

/// Collection-scoped persistence with linear-scan queries.
///
/// # Type Parameters
///
/// * `S` - The key-value substrate implementation
#[derive(Debug)]
pub struct DocumentStore<S: KeyValueStore> {
    substrate: S,
    config: StoreConfig,
    ids: Arc<dyn IdGenerator>,
    index_locks: KeyedLocks,
    document_locks: KeyedLocks,
}

impl<S: KeyValueStore> DocumentStore<S> {
    /// Creates a store over `substrate` with the default configuration.
    pub fn new(substrate: S) -> Self {
        Self::builder(substrate).build()
    }

    /// Creates a builder for a store with custom configuration.
    pub fn builder(substrate: S) -> DocumentStoreBuilder<S> {
        DocumentStoreBuilder::new(substrate)
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Returns the underlying substrate.
    pub fn substrate(&self) -> &S {
        &self.substrate
    }

    /// Gets a handle on the collection with the given name.
    pub fn collection<'a>(&'a self, name: &str) -> Collection<'a, S> {
        Collection::new(name.to_string(), self)
    }

    /// Gets a typed handle on the collection records of type `R` live in.
    pub fn typed_collection<'a, R: Record>(&'a self) -> TypedCollection<'a, S, R> {
        TypedCollection::new(R::collection_name().to_string(), self)
    }

    /// Creates a document and returns its id.
    ///
    /// The store sets `id`, `createdAt` and `updatedAt`, overwriting any such
    /// fields in `data`. Without an explicit `id` one is generated. An explicit
    /// id that already exists replaces the stored document; the index never
    /// lists an id twice.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::InvalidArgument`] for an empty collection
    /// name or id, and propagates substrate failures. When the index update
    /// fails the document write is undone before the error is returned.
    pub async fn create(
        &self,
        collection: &str,
        mut data: Document,
        id: Option<&str>,
    ) -> DocumentStoreResult<String> {
        self.validate_collection(collection)?;

        let id = match id {
            Some(id) => {
                validate_id(id)?;
                id.to_string()
            }
            None => self.ids.generate(),
        };
        trace!(collection, id = %id, "creating document");

        let now = format_timestamp(now_millis());
        data.insert(ID_FIELD, id.as_str());
        data.insert(CREATED_AT_FIELD, now.as_str());
        data.insert(UPDATED_AT_FIELD, now);
        let text = serde_json::to_string(&data)?;

        let key = self.config.document_key(collection, &id);
        let lock = self.document_locks.get(&key);
        let _guard = lock.lock().await;

        let previous = self.substrate.get(&key).await?;
        self.substrate.set(&key, &text).await?;

        if let Err(err) = self.append_to_index(collection, &id).await {
            warn!(collection, id = %id, error = %err, "index update failed, undoing document write");
            self.restore(&key, previous.as_deref()).await;
            return Err(err);
        }

        debug!(collection, id = %id, "document created");

        Ok(id)
    }

    /// Reads a document, or `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Propagates substrate failures and returns
    /// [`DocumentStoreError::MalformedData`] if the stored text is not a
    /// field mapping.
    pub async fn get(&self, collection: &str, id: &str) -> DocumentStoreResult<Option<Document>> {
        self.validate_collection(collection)?;
        trace!(collection, id, "reading document");

        self.read_document(&self.config.document_key(collection, id))
            .await
    }

    /// Scans a collection and returns the documents matching `query`.
    ///
    /// Documents are read one by one in index order; ids in the index whose
    /// document is gone are skipped. Filters are ANDed, `order_by` sorts
    /// descending with missing fields last, and `limit` truncates. An unknown
    /// collection yields an empty result.
    pub async fn query(&self, collection: &str, query: Query) -> DocumentStoreResult<Vec<Document>> {
        self.validate_collection(collection)?;
        trace!(collection, ?query, "querying collection");

        let ids = self.read_index(collection).await?;
        let mut documents = Vec::with_capacity(ids.len());

        for id in &ids {
            match self
                .read_document(&self.config.document_key(collection, id))
                .await?
            {
                Some(doc) => documents.push(doc),
                None => warn!(collection, id = %id, "index lists a missing document, skipping"),
            }
        }

        let results = DocumentEvaluator::apply(documents, &query);
        debug!(collection, scanned = ids.len(), returned = results.len(), "query finished");

        Ok(results)
    }

    /// Shallow-merges `patch` into an existing document.
    ///
    /// Returns `Ok(false)` without writing anything when the document does not
    /// exist. `id` and `createdAt` cannot be changed through a patch;
    /// `updatedAt` is refreshed and always moves forward.
    pub async fn update(
        &self,
        collection: &str,
        id: &str,
        patch: Document,
    ) -> DocumentStoreResult<bool> {
        Ok(self
            .update_with(collection, id, move |_| patch)
            .await?
            .is_some())
    }

    /// Computes a patch from the current document and merges it, holding the
    /// document's lock for the whole read-modify-write.
    ///
    /// Returns the stored document, or `None` when it does not exist.
    pub async fn update_with<F>(
        &self,
        collection: &str,
        id: &str,
        patch_fn: F,
    ) -> DocumentStoreResult<Option<Document>>
    where
        F: FnOnce(&Document) -> Document + Send,
    {
        self.try_update_with(collection, id, move |current| Ok(patch_fn(current)))
            .await
    }

    /// Like [`DocumentStore::update_with`], but the patch function may refuse
    /// the update. Its error is returned and nothing is written.
    pub async fn try_update_with<F>(
        &self,
        collection: &str,
        id: &str,
        patch_fn: F,
    ) -> DocumentStoreResult<Option<Document>>
    where
        F: FnOnce(&Document) -> DocumentStoreResult<Document> + Send,
    {
        self.validate_collection(collection)?;
        trace!(collection, id, "updating document");

        let key = self.config.document_key(collection, id);
        let lock = self.document_locks.get(&key);
        let _guard = lock.lock().await;

        let Some(existing) = self.read_document(&key).await? else {
            warn!(collection, id, "update of a missing document");
            return Ok(None);
        };

        let patch = match patch_fn(&existing) {
            Ok(patch) => patch,
            Err(err) => {
                warn!(collection, id, error = %err, "update refused");
                return Err(err);
            }
        };
        let mut updated = existing.clone();
        updated.merge(patch);

        for field in [ID_FIELD, CREATED_AT_FIELD] {
            match existing.get(field) {
                Some(value) => updated.insert(field, value.clone()),
                None => updated.remove(field),
            };
        }
        if updated.id().is_none() {
            updated.insert(ID_FIELD, id);
        }
        updated.insert(
            UPDATED_AT_FIELD,
            format_timestamp(next_timestamp(existing.updated_at())),
        );

        self.substrate
            .set(&key, &serde_json::to_string(&updated)?)
            .await?;
        debug!(collection, id, "document updated");

        Ok(Some(updated))
    }

    /// Deletes a document and drops it from the collection index.
    ///
    /// Deleting a missing document succeeds.
    pub async fn delete(&self, collection: &str, id: &str) -> DocumentStoreResult<bool> {
        self.validate_collection(collection)?;
        trace!(collection, id, "deleting document");

        let key = self.config.document_key(collection, id);
        let lock = self.document_locks.get(&key);
        let _guard = lock.lock().await;

        self.substrate.remove(&key).await?;
        self.remove_from_index(collection, id).await?;
        debug!(collection, id, "document deleted");

        Ok(true)
    }

    /// Returns the collection index: ids of present documents in creation order.
    pub async fn ids(&self, collection: &str) -> DocumentStoreResult<Vec<String>> {
        self.validate_collection(collection)?;

        self.read_index(collection).await
    }

    fn validate_collection(&self, collection: &str) -> DocumentStoreResult<()> {
        if collection.is_empty() {
            return Err(DocumentStoreError::InvalidArgument(
                "collection name must not be empty".to_string(),
            ));
        }
        if self.config.collides_with_index(collection) {
            return Err(DocumentStoreError::InvalidArgument(format!(
                "collection name {collection:?} would share keys with collection indexes"
            )));
        }

        Ok(())
    }

    async fn read_document(&self, key: &str) -> DocumentStoreResult<Option<Document>> {
        match self.substrate.get(key).await? {
            Some(text) => serde_json::from_str::<Document>(&text)
                .map(Some)
                .map_err(|err| DocumentStoreError::malformed(key, err)),
            None => Ok(None),
        }
    }

    async fn read_index(&self, collection: &str) -> DocumentStoreResult<Vec<String>> {
        let key = self.config.index_key(collection);

        match self.substrate.get(&key).await? {
            Some(text) => serde_json::from_str::<Vec<String>>(&text)
                .map_err(|err| DocumentStoreError::malformed(key, err)),
            None => Ok(Vec::new()),
        }
    }

    async fn write_index(&self, collection: &str, ids: &[String]) -> DocumentStoreResult<()> {
        self.substrate
            .set(&self.config.index_key(collection), &serde_json::to_string(ids)?)
            .await
    }

    async fn append_to_index(&self, collection: &str, id: &str) -> DocumentStoreResult<()> {
        let lock = self.index_locks.get(collection);
        let _guard = lock.lock().await;

        let mut ids = self.read_index(collection).await?;
        if ids.iter().any(|existing| existing == id) {
            return Ok(());
        }
        ids.push(id.to_string());

        self.write_index(collection, &ids).await
    }

    async fn remove_from_index(&self, collection: &str, id: &str) -> DocumentStoreResult<()> {
        let lock = self.index_locks.get(collection);
        let _guard = lock.lock().await;

        let mut ids = self.read_index(collection).await?;
        let before = ids.len();
        ids.retain(|existing| existing != id);
        if ids.len() == before {
            return Ok(());
        }

        self.write_index(collection, &ids).await
    }

    /// Puts `key` back to `previous`, logging if that fails too.
    async fn restore(&self, key: &str, previous: Option<&str>) {
        let result = match previous {
            Some(text) => self.substrate.set(key, text).await,
            None => self.substrate.remove(key).await,
        };

        if let Err(err) = result {
            error!(key, error = %err, "failed to undo document write");
        }
    }
}

/// Builder for [`DocumentStore`].
///
/// # Example
///
/// ```ignore
/// let store = DocumentStore::builder(substrate)
///     .index_prefix("idx:")
///     .id_strategy(IdStrategy::Uuid)
///     .build();
/// ```
#[derive(Debug)]
pub struct DocumentStoreBuilder<S: KeyValueStore> {
    substrate: S,
    config: StoreConfig,
    ids: Option<Arc<dyn IdGenerator>>,
}

impl<S: KeyValueStore> DocumentStoreBuilder<S> {
    pub fn new(substrate: S) -> Self {
        Self {
            substrate,
            config: StoreConfig::default(),
            ids: None,
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    pub fn index_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.index_prefix = prefix.into();
        self
    }

    pub fn key_separator(mut self, separator: impl Into<String>) -> Self {
        self.config.key_separator = separator.into();
        self
    }

    pub fn id_strategy(mut self, strategy: crate::id::IdStrategy) -> Self {
        self.config.id_strategy = strategy;
        self
    }

    /// Uses a custom id generator instead of the configured strategy.
    pub fn id_generator(mut self, generator: impl IdGenerator + 'static) -> Self {
        self.ids = Some(Arc::new(generator));
        self
    }

    pub fn build(self) -> DocumentStore<S> {
        let ids = self
            .ids
            .unwrap_or_else(|| self.config.id_strategy.generator());

        DocumentStore {
            substrate: self.substrate,
            config: self.config,
            ids,
            index_locks: KeyedLocks::new(),
            document_locks: KeyedLocks::new(),
        }
    }
}

fn validate_id(id: &str) -> DocumentStoreResult<()> {
    if id.is_empty() {
        return Err(DocumentStoreError::InvalidArgument(
            "document id must not be empty".to_string(),
        ));
    }

    Ok(())
}

fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// The timestamp for an update: now, unless the clock has not moved past the
/// previous value, in which case one millisecond after it.
fn next_timestamp(previous: Option<&str>) -> DateTime<Utc> {
    let now = now_millis();

    previous
        .and_then(|text| DateTime::parse_from_rfc3339(text).ok())
        .map(|previous| previous.with_timezone(&Utc))
        .filter(|previous| *previous >= now)
        .map(|previous| previous + Duration::milliseconds(1))
        .unwrap_or(now)
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{query::Filter, testing::FlakyStore};
    use futures::future::join_all;
    use std::collections::HashSet;

    fn store() -> DocumentStore<FlakyStore> {
        DocumentStore::new(FlakyStore::new())
    }

    async fn seed_orders(store: &DocumentStore<FlakyStore>) {
        for (id, amount, status) in [
            ("a", 10, "completed"),
            ("b", 50, "pending"),
            ("c", 30, "completed"),
            ("d", 80, "cancelled"),
            ("e", 20, "pending"),
        ] {
            store
                .create("orders", document! { "amount" => amount, "status" => status }, Some(id))
                .await
                .unwrap();
        }
    }

    fn ids_of(docs: &[Document]) -> Vec<&str> {
        docs.iter().filter_map(Document::id).collect()
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let store = store();
        let id = store
            .create("orders", document! { "amount" => 100, "status" => "completed" }, None)
            .await
            .unwrap();
        let doc = store.get("orders", &id).await.unwrap().unwrap();

        assert!(id.starts_with("doc_"));
        assert_eq!(doc.id(), Some(id.as_str()));
        assert_eq!(doc.get_f64("amount"), Some(100.0));
        assert_eq!(doc.get_str("status"), Some("completed"));
        assert!(!doc.created_at().unwrap().is_empty());
        assert_eq!(doc.created_at(), doc.updated_at());
        assert_eq!(
            doc.without_metadata(),
            document! { "amount" => 100, "status" => "completed" }
        );
    }

    #[tokio::test]
    async fn uses_the_documented_key_layout() {
        let store = store();
        store
            .create("orders", document! { "amount" => 1 }, Some("a"))
            .await
            .unwrap();

        assert!(store.substrate().raw("orders_a").is_some());
        assert_eq!(
            store.substrate().raw("collection_orders").as_deref(),
            Some(r#"["a"]"#)
        );
    }

    #[tokio::test]
    async fn caller_cannot_forge_store_fields() {
        let store = store();
        let id = store
            .create(
                "orders",
                document! { ID_FIELD => "forged", CREATED_AT_FIELD => "1970-01-01T00:00:00.000Z" },
                Some("real"),
            )
            .await
            .unwrap();
        let doc = store.get("orders", &id).await.unwrap().unwrap();

        assert_eq!(id, "real");
        assert_eq!(doc.id(), Some("real"));
        assert_ne!(doc.created_at(), Some("1970-01-01T00:00:00.000Z"));
    }

    #[tokio::test]
    async fn get_of_missing_document_is_none() {
        assert!(store().get("orders", "nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn empty_collection_name_is_rejected() {
        let err = store().create("", Document::new(), None).await.unwrap_err();

        assert!(matches!(err, DocumentStoreError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn collection_names_cannot_reach_index_keys() {
        let store = store();
        seed_orders(&store).await;

        let err = store
            .create("collection", document! { "v" => 1 }, Some("orders"))
            .await
            .unwrap_err();

        assert!(matches!(err, DocumentStoreError::InvalidArgument(_)));
        assert!(matches!(
            store.get("collection_x", "y").await,
            Err(DocumentStoreError::InvalidArgument(_))
        ));
        assert_eq!(store.query("orders", Query::new()).await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn refused_update_writes_nothing() {
        let store = store();
        seed_orders(&store).await;
        let before = store.get("orders", "a").await.unwrap().unwrap();

        let err = store
            .try_update_with("orders", "a", |_| {
                Err(DocumentStoreError::InvalidDocument("no".into()))
            })
            .await
            .unwrap_err();

        assert!(matches!(err, DocumentStoreError::InvalidDocument(_)));
        assert_eq!(store.get("orders", "a").await.unwrap().unwrap(), before);
    }

    #[tokio::test]
    async fn equality_filter_selects_exact_subset() {
        let store = store();
        seed_orders(&store).await;

        let completed = store
            .query("orders", Query::builder().filter(Filter::eq("status", "completed")).build())
            .await
            .unwrap();

        assert_eq!(ids_of(&completed), vec!["a", "c"]);
    }

    #[tokio::test]
    async fn filters_are_anded() {
        let store = store();
        seed_orders(&store).await;

        let results = store
            .query(
                "orders",
                Query::builder()
                    .filter(Filter::ne("status", "cancelled"))
                    .filter(Filter::gte("amount", 20))
                    .build(),
            )
            .await
            .unwrap();

        assert_eq!(ids_of(&results), vec!["b", "c", "e"]);
    }

    #[tokio::test]
    async fn orders_descending_and_limits() {
        let store = store();
        seed_orders(&store).await;

        let top = store
            .query("orders", Query::from_parts([], Some("amount"), Some(2)))
            .await
            .unwrap();
        let amounts = top
            .iter()
            .filter_map(|doc| doc.get_f64("amount"))
            .collect::<Vec<_>>();

        assert_eq!(amounts, vec![80.0, 50.0]);
    }

    #[tokio::test]
    async fn unknown_collection_queries_empty() {
        assert!(store().query("ghosts", Query::new()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_merges_and_advances_updated_at() {
        let store = store();
        seed_orders(&store).await;
        let before = store.get("orders", "a").await.unwrap().unwrap();

        assert!(
            store
                .update("orders", "a", document! { "status" => "cancelled" })
                .await
                .unwrap()
        );
        let after = store.get("orders", "a").await.unwrap().unwrap();

        assert_eq!(after.get_str("status"), Some("cancelled"));
        assert_eq!(after.get_f64("amount"), Some(10.0));
        assert_eq!(after.created_at(), before.created_at());
        assert!(after.updated_at().unwrap() > before.updated_at().unwrap());
    }

    #[tokio::test]
    async fn update_cannot_rewrite_identity() {
        let store = store();
        seed_orders(&store).await;
        let before = store.get("orders", "a").await.unwrap().unwrap();

        store
            .update(
                "orders",
                "a",
                document! { ID_FIELD => "z", CREATED_AT_FIELD => "2000-01-01T00:00:00.000Z" },
            )
            .await
            .unwrap();
        let after = store.get("orders", "a").await.unwrap().unwrap();

        assert_eq!(after.id(), Some("a"));
        assert_eq!(after.created_at(), before.created_at());
    }

    #[tokio::test]
    async fn update_of_missing_document_reports_false() {
        let store = store();

        assert!(
            !store
                .update("orders", "missing-id", document! { "status" => "x" })
                .await
                .unwrap()
        );
        assert!(store.get("orders", "missing-id").await.unwrap().is_none());
        assert!(store.ids("orders").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = store();
        seed_orders(&store).await;

        assert!(store.delete("orders", "a").await.unwrap());
        assert!(store.get("orders", "a").await.unwrap().is_none());
        assert!(store.delete("orders", "a").await.unwrap());
        assert!(store.get("orders", "a").await.unwrap().is_none());

        let remaining = store.query("orders", Query::new()).await.unwrap();
        assert_eq!(ids_of(&remaining), vec!["b", "c", "d", "e"]);
    }

    #[tokio::test]
    async fn index_matches_present_documents() {
        let store = store();
        let mut created = Vec::new();
        for i in 0..6 {
            created.push(
                store
                    .create("expenses", document! { "n" => i }, None)
                    .await
                    .unwrap(),
            );
        }
        for id in created.iter().step_by(2) {
            store.delete("expenses", id).await.unwrap();
        }

        let queried = store
            .query("expenses", Query::new())
            .await
            .unwrap()
            .iter()
            .filter_map(|doc| doc.id().map(str::to_string))
            .collect::<HashSet<_>>();
        let mut present = HashSet::new();
        for id in &created {
            if store.get("expenses", id).await.unwrap().is_some() {
                present.insert(id.clone());
            }
        }

        assert_eq!(queried, present);
        assert_eq!(present.len(), 3);
    }

    #[tokio::test]
    async fn recreating_an_id_does_not_duplicate_index_entry() {
        let store = store();
        store.create("orders", document! { "v" => 1 }, Some("a")).await.unwrap();
        store.create("orders", document! { "v" => 2 }, Some("a")).await.unwrap();

        assert_eq!(store.ids("orders").await.unwrap(), vec!["a".to_string()]);
        assert_eq!(
            store.get("orders", "a").await.unwrap().unwrap().get_f64("v"),
            Some(2.0)
        );
    }

    #[tokio::test]
    async fn racing_creates_of_one_id_append_once() {
        let store = store();
        join_all((0..8).map(|i| store.create("orders", document! { "v" => i }, Some("same"))))
            .await
            .into_iter()
            .collect::<DocumentStoreResult<Vec<_>>>()
            .unwrap();

        assert_eq!(store.ids("orders").await.unwrap(), vec!["same".to_string()]);
    }

    #[tokio::test]
    async fn failed_index_write_leaves_no_document() {
        let store = store();
        store.substrate().fail_writes_to("collection_");

        let err = store
            .create("orders", document! { "amount" => 1 }, Some("a"))
            .await
            .unwrap_err();

        assert!(err.is_storage_failure());
        assert!(store.get("orders", "a").await.unwrap().is_none());
        assert!(store.substrate().raw("orders_a").is_none());
    }

    #[tokio::test]
    async fn failed_recreate_restores_previous_document() {
        let store = store();
        store.create("orders", document! { "v" => 1 }, Some("a")).await.unwrap();
        store.create("orders", document! { "v" => 1 }, Some("b")).await.unwrap();
        store.substrate().put_raw("collection_orders", "not json");

        let err = store
            .create("orders", document! { "v" => 2 }, Some("a"))
            .await
            .unwrap_err();

        assert!(matches!(err, DocumentStoreError::MalformedData { .. }));
        assert_eq!(
            store.get("orders", "a").await.unwrap().unwrap().get_f64("v"),
            Some(1.0)
        );
    }

    #[tokio::test]
    async fn substrate_failures_propagate() {
        let store = store();
        seed_orders(&store).await;
        store.substrate().fail_writes_to("orders_");

        assert!(matches!(
            store.update("orders", "a", document! { "v" => 1 }).await,
            Err(DocumentStoreError::Substrate(_))
        ));
        assert!(matches!(
            store.delete("orders", "a").await,
            Err(DocumentStoreError::Substrate(_))
        ));

        store.substrate().heal();
        assert!(store.delete("orders", "a").await.unwrap());
    }

    #[tokio::test]
    async fn malformed_documents_surface() {
        let store = store();
        seed_orders(&store).await;
        store.substrate().put_raw("orders_b", "{broken");

        assert!(matches!(
            store.get("orders", "b").await,
            Err(DocumentStoreError::MalformedData { .. })
        ));
        assert!(matches!(
            store.query("orders", Query::new()).await,
            Err(DocumentStoreError::MalformedData { .. })
        ));
    }

    #[tokio::test]
    async fn dangling_index_ids_are_skipped() {
        let store = store();
        seed_orders(&store).await;
        store.substrate().put_raw("collection_orders", r#"["a","ghost","b"]"#);

        let docs = store.query("orders", Query::new()).await.unwrap();

        assert_eq!(ids_of(&docs), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn concurrent_increments_are_not_lost() {
        let store = store();
        store
            .create("customers", document! { "ordersCount" => 0 }, Some("c1"))
            .await
            .unwrap();

        join_all((0..20).map(|_| {
            store.update_with("customers", "c1", |current| {
                let count = current.get_f64("ordersCount").unwrap_or(0.0);
                document! { "ordersCount" => count + 1.0 }
            })
        }))
        .await;

        let customer = store.get("customers", "c1").await.unwrap().unwrap();
        assert_eq!(customer.get_f64("ordersCount"), Some(20.0));
    }

    #[tokio::test]
    async fn builder_applies_key_layout() {
        let store = DocumentStore::builder(FlakyStore::new())
            .index_prefix("idx:")
            .key_separator("/")
            .id_strategy(crate::id::IdStrategy::Uuid)
            .build();
        let id = store.create("taxes", document! { "amount" => 5 }, None).await.unwrap();

        assert!(store.substrate().raw(&format!("taxes/{id}")).is_some());
        assert!(store.substrate().raw("idx:taxes").is_some());
        assert!(uuid::Uuid::parse_str(&id).is_ok());
    }

    #[test]
    fn timestamps_always_advance() {
        let future = format_timestamp(Utc::now() + Duration::hours(1));
        let next = format_timestamp(next_timestamp(Some(&future)));

        assert!(next > future);
        assert!(format_timestamp(next_timestamp(Some("garbage"))) < future);
    }
}
