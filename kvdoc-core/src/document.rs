//! Documents and typed records.
//!
//! A [`Document`] is a string-keyed mapping of [`Value`]s. Once stored it always
//! carries the store-managed fields [`ID_FIELD`], [`CREATED_AT_FIELD`] and
//! [`UPDATED_AT_FIELD`].
//!
//! The [`Record`] trait lets plain serde structs be stored in a collection and
//! read back through a [`TypedCollection`](crate::collection::TypedCollection).

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Value as JsonValue, from_value, to_value};
use std::collections::{BTreeMap, btree_map};

use crate::{
    error::{DocumentStoreError, DocumentStoreResult},
    value::Value,
};

/// Field holding the document id.
pub const ID_FIELD: &str = "id";
/// Field holding the creation timestamp.
pub const CREATED_AT_FIELD: &str = "createdAt";
/// Field holding the last update timestamp.
pub const UPDATED_AT_FIELD: &str = "updatedAt";

/// A field mapping stored in a collection.
///
/// Fields are kept in key order so the stored text is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(BTreeMap<String, Value>);

impl Document {
    /// Creates an empty document.
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    pub fn get_f64(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(Value::as_f64)
    }

    pub fn get_bool(&self, field: &str) -> Option<bool> {
        self.get(field).and_then(Value::as_bool)
    }

    /// Sets a field, returning the previous value if any.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(field.into(), value.into())
    }

    /// Builder-style variant of [`Document::insert`].
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.0.remove(field)
    }

    pub fn contains_key(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Value> {
        self.0.iter()
    }

    /// Shallow merge: every field of `patch` overwrites the field of the same
    /// name, fields absent from `patch` are kept.
    pub fn merge(&mut self, patch: Document) {
        self.0.extend(patch.0);
    }

    /// The document id, if the document has been stored.
    pub fn id(&self) -> Option<&str> {
        self.get_str(ID_FIELD)
    }

    pub fn created_at(&self) -> Option<&str> {
        self.get_str(CREATED_AT_FIELD)
    }

    pub fn updated_at(&self) -> Option<&str> {
        self.get_str(UPDATED_AT_FIELD)
    }

    /// Returns a copy without the store-managed fields.
    pub fn without_metadata(&self) -> Document {
        self.0
            .iter()
            .filter(|(k, _)| !is_metadata_field(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Builds a document from a `serde_json` value, which must be an object.
    pub fn from_json(value: JsonValue) -> DocumentStoreResult<Self> {
        match Value::from(value) {
            Value::Map(doc) => Ok(doc),
            other => Err(DocumentStoreError::InvalidDocument(format!(
                "expected a field mapping, got {}",
                other.type_name()
            ))),
        }
    }

    pub fn into_json(self) -> JsonValue {
        Value::Map(self).into_json()
    }

    /// Serializes any serde value that has an object form into a document.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> DocumentStoreResult<Self> {
        Self::from_json(to_value(value)?)
    }

    /// Deserializes this document into a serde value.
    pub fn deserialize_into<T: DeserializeOwned>(self) -> DocumentStoreResult<T> {
        Ok(from_value(self.into_json())?)
    }
}

/// Returns `true` for fields owned by the store.
pub fn is_metadata_field(field: &str) -> bool {
    field == ID_FIELD || field == CREATED_AT_FIELD || field == UPDATED_AT_FIELD
}

impl FromIterator<(String, Value)> for Document {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Document {
    type Item = (String, Value);
    type IntoIter = btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Document {
    type Item = (&'a String, &'a Value);
    type IntoIter = btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Builds a [`Document`] from `field => value` pairs.
///
/// ```ignore
/// let order = document! { "amount" => 100, "status" => "completed" };
/// ```
#[macro_export]
macro_rules! document {
    () => { $crate::document::Document::new() };
    ($($field:expr => $value:expr),+ $(,)?) => {{
        let mut doc = $crate::document::Document::new();
        $( doc.insert($field, $value); )+
        doc
    }};
}

/// A serde type that can be stored in a named collection.
///
/// Records are written as field mappings, so the type must serialize to a
/// JSON object. When read back, the stored document also carries `id`,
/// `createdAt` and `updatedAt`; declare those fields (usually with
/// `#[serde(default)]`) to receive them, or leave them out to ignore them.
///
/// # Example
///
/// ```ignore
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// pub struct Expense {
///     #[serde(default)]
///     pub id: String,
///     pub amount: f64,
/// }
///
/// impl Record for Expense {
///     fn collection_name() -> &'static str { "expenses" }
/// }
/// ```
pub trait Record: Serialize + DeserializeOwned + Send + Sync {
    /// Returns the name of the collection records of this type live in.
    fn collection_name() -> &'static str;
}

/// Extension trait converting records to and from documents.
pub trait RecordExt: Record + Sized {
    /// Converts this record into a document.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::InvalidDocument`] when the record does not
    /// serialize to a field mapping.
    fn to_document(&self) -> DocumentStoreResult<Document>;

    /// Builds a record from a stored document.
    fn from_document(doc: Document) -> DocumentStoreResult<Self>;
}

impl<R: Record> RecordExt for R {
    fn to_document(&self) -> DocumentStoreResult<Document> {
        Document::from_serialize(self)
    }

    fn from_document(doc: Document) -> DocumentStoreResult<Self> {
        doc.deserialize_into()
    }
}
