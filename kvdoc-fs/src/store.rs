//! Filesystem key-value substrate.
//!
//! Every key is stored in its own file under a root directory. File names are
//! the hex encoding of the key followed by `.json`, so any key is a valid file
//! name and collection names cannot escape the root. Encodings longer than
//! [`SEGMENT_LEN`] are split into nested directories so no path component
//! exceeds the usual 255-byte file name limit. Directories left empty by
//! `remove` are kept.

use async_trait::async_trait;
use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tokio::fs;
use tracing::{debug, error, trace};
use uuid::Uuid;

use kvdoc_core::{
    error::{DocumentStoreError, DocumentStoreResult},
    substrate::{KeyValueStore, KeyValueStoreBuilder},
};

const SUFFIX: &str = ".json";

/// Longest run of hex characters used as one path component.
pub const SEGMENT_LEN: usize = 200;

/// Durable key-value substrate backed by a directory.
///
/// Writes go to a temporary file that is then renamed over the target, so a
/// reader never observes a half-written value.
#[derive(Debug, Clone)]
pub struct FsKeyValueStore {
    root: PathBuf,
}

impl FsKeyValueStore {
    /// Uses `root` as is; the directory must already exist.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Creates a builder that prepares the root directory.
    pub fn builder(root: impl Into<PathBuf>) -> FsKeyValueStoreBuilder {
        FsKeyValueStoreBuilder::new(root)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let encoded = hex::encode(key);
        let mut path = self.root.clone();
        let mut rest = encoded.as_str();

        while rest.len() > SEGMENT_LEN {
            let (segment, tail) = rest.split_at(SEGMENT_LEN);
            path.push(segment);
            rest = tail;
        }
        path.push(format!("{rest}{SUFFIX}"));

        path
    }

    /// All keys currently stored, sorted. Files not written by this store
    /// are ignored.
    pub async fn keys(&self) -> DocumentStoreResult<Vec<String>> {
        let mut pending = vec![(self.root.clone(), String::new())];
        let mut keys = Vec::new();

        while let Some((dir, prefix)) = pending.pop() {
            let mut entries = fs::read_dir(&dir).await?;

            while let Some(entry) = entries.next_entry().await? {
                let name = entry.file_name();
                let Some(name) = name.to_str() else {
                    continue;
                };

                if entry.file_type().await?.is_dir() {
                    pending.push((entry.path(), format!("{prefix}{name}")));
                    continue;
                }
                let Some(stem) = name.strip_suffix(SUFFIX) else {
                    continue;
                };

                if let Some(key) = hex::decode(format!("{prefix}{stem}"))
                    .ok()
                    .and_then(|bytes| String::from_utf8(bytes).ok())
                {
                    keys.push(key);
                }
            }
        }
        keys.sort();

        Ok(keys)
    }
}

#[async_trait]
impl KeyValueStore for FsKeyValueStore {
    async fn get(&self, key: &str) -> DocumentStoreResult<Option<String>> {
        let path = self.path_for(key);
        trace!(key, path = %path.display(), "reading key");

        match fs::read_to_string(&path).await {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => {
                error!(key, path = %path.display(), error = %e, "failed to read key");
                Err(e.into())
            }
        }
    }

    async fn set(&self, key: &str, value: &str) -> DocumentStoreResult<()> {
        let path = self.path_for(key);
        let temp = self
            .root
            .join(format!(".{}.tmp", Uuid::new_v4().simple()));
        trace!(key, path = %path.display(), "writing key");

        if let Some(parent) = path.parent().filter(|parent| *parent != self.root.as_path()) {
            if let Err(e) = fs::create_dir_all(parent).await {
                error!(key, path = %parent.display(), error = %e, "failed to create key directory");
                return Err(e.into());
            }
        }
        if let Err(e) = fs::write(&temp, value).await {
            error!(key, path = %temp.display(), error = %e, "failed to write temporary file");
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&temp, &path).await {
            error!(key, path = %path.display(), error = %e, "failed to move value into place");
            let _ = fs::remove_file(&temp).await;
            return Err(e.into());
        }

        Ok(())
    }

    async fn remove(&self, key: &str) -> DocumentStoreResult<()> {
        let path = self.path_for(key);
        trace!(key, path = %path.display(), "removing key");

        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => {
                error!(key, path = %path.display(), error = %e, "failed to remove key");
                Err(e.into())
            }
        }
    }
}

/// Builder for [`FsKeyValueStore`].
#[derive(Debug)]
pub struct FsKeyValueStoreBuilder {
    root: PathBuf,
    create_missing: bool,
}

impl FsKeyValueStoreBuilder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), create_missing: true }
    }

    /// Whether a missing root directory is created (the default) or reported.
    pub fn create_missing(mut self, create: bool) -> Self {
        self.create_missing = create;
        self
    }
}

#[async_trait]
impl KeyValueStoreBuilder for FsKeyValueStoreBuilder {
    type Store = FsKeyValueStore;

    async fn build(self) -> DocumentStoreResult<Self::Store> {
        if self.create_missing {
            fs::create_dir_all(&self.root)
                .await
                .map_err(|e| DocumentStoreError::Initialization(e.to_string()))?;
        }

        let metadata = fs::metadata(&self.root)
            .await
            .map_err(|e| {
                DocumentStoreError::Initialization(format!("{}: {e}", self.root.display()))
            })?;
        if !metadata.is_dir() {
            return Err(DocumentStoreError::Initialization(format!(
                "{} is not a directory",
                self.root.display()
            )));
        }
        debug!(root = %self.root.display(), "filesystem substrate ready");

        Ok(FsKeyValueStore::new(self.root))
    }
}
