//! Store configuration: substrate key layout and id generation.
//!
//! With the defaults, the document `a` of collection `orders` lives under
//! `orders_a` and the collection index lives under `collection_orders`.

use serde::{Deserialize, Serialize};

use crate::id::IdStrategy;

pub const DEFAULT_INDEX_PREFIX: &str = "collection_";
pub const DEFAULT_KEY_SEPARATOR: &str = "_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StoreConfig {
    /// Prefix of the key holding a collection's id index.
    pub index_prefix: String,
    /// Separator between collection name and id in document keys.
    pub key_separator: String,
    /// How ids are generated when the caller supplies none.
    pub id_strategy: IdStrategy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            index_prefix: DEFAULT_INDEX_PREFIX.to_string(),
            key_separator: DEFAULT_KEY_SEPARATOR.to_string(),
            id_strategy: IdStrategy::default(),
        }
    }
}

impl StoreConfig {
    /// Key of the record holding document `id` of `collection`.
    pub fn document_key(&self, collection: &str, id: &str) -> String {
        format!("{collection}{}{id}", self.key_separator)
    }

    /// Key of the record holding the id index of `collection`.
    pub fn index_key(&self, collection: &str) -> String {
        format!("{}{collection}", self.index_prefix)
    }

    /// Whether documents of `collection` could land on the key of some
    /// collection index.
    ///
    /// With the defaults this is `collection` itself (document `orders` would
    /// be stored at `collection_orders`) and every name starting with
    /// `collection_`.
    pub fn collides_with_index(&self, collection: &str) -> bool {
        let stem = format!("{collection}{}", self.key_separator);

        stem.starts_with(&self.index_prefix) || self.index_prefix.starts_with(&stem)
    }
}
