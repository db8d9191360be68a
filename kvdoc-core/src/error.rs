//! Error types and result types for document store operations.
//!
//! Use [`DocumentStoreResult<T>`] as the return type for fallible operations.
//! Absence is not an error: `get` on a missing document yields `None` and
//! `delete` on a missing document succeeds.

use serde_json::Error as SerdeJsonError;
use std::io::Error as IoError;
use thiserror::Error;

/// Represents all possible errors that can occur when interacting with a document store.
#[derive(Error, Debug)]
pub enum DocumentStoreError {
    /// A document or index could not be encoded to text.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// A stored value could not be decoded into a document or an index.
    #[error("Malformed data under key {key}: {reason}")]
    MalformedData {
        /// The substrate key holding the bad value.
        key: String,
        /// Why decoding failed.
        reason: String,
    },
    /// Error during substrate initialization, such as preparing its directory.
    #[error("Initialization error: {0}")]
    Initialization(String),
    /// The key-value substrate failed to read, write or remove a key.
    #[error("Substrate error: {0}")]
    Substrate(String),
    /// A caller supplied an unusable argument, such as an empty collection name.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// A typed record did not serialize to a field mapping.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
    /// The requested document was not found in the collection.
    /// The first argument is the document ID, the second is the collection name.
    #[error("Document not found {0} in collection {1}")]
    DocumentNotFound(String, String),
}

impl DocumentStoreError {
    /// Builds a [`DocumentStoreError::MalformedData`] for the given key.
    pub fn malformed(key: impl Into<String>, reason: impl ToString) -> Self {
        DocumentStoreError::MalformedData {
            key: key.into(),
            reason: reason.to_string(),
        }
    }

    /// Returns `true` when the error originates from the substrate or from
    /// undecodable stored data, i.e. the caller may retry or surface it.
    pub fn is_storage_failure(&self) -> bool {
        matches!(
            self,
            DocumentStoreError::Substrate(_) | DocumentStoreError::MalformedData { .. }
        )
    }
}

/// A specialized `Result` type for document store operations.
pub type DocumentStoreResult<T> = Result<T, DocumentStoreError>;

impl From<SerdeJsonError> for DocumentStoreError {
    fn from(err: SerdeJsonError) -> Self {
        DocumentStoreError::Serialization(err.to_string())
    }
}

impl From<IoError> for DocumentStoreError {
    fn from(err: IoError) -> Self {
        DocumentStoreError::Substrate(err.to_string())
    }
}
