//! Test doubles for the key-value substrate.

use async_trait::async_trait;
use std::{
    collections::HashMap,
    sync::{Mutex, Once, PoisonError},
};

use crate::{
    error::{DocumentStoreError, DocumentStoreResult},
    substrate::KeyValueStore,
};

static INIT: Once = Once::new();

pub(crate) fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("debug")
            .with_test_writer()
            .try_init();
    });
}

/// Map-backed substrate whose writes can be made to fail per key prefix.
#[derive(Debug, Default)]
pub(crate) struct FlakyStore {
    entries: Mutex<HashMap<String, String>>,
    failing_prefixes: Mutex<Vec<String>>,
}

impl FlakyStore {
    pub fn new() -> Self {
        init_tracing();
        Self::default()
    }

    /// Makes every `set` and `remove` on keys starting with `prefix` fail.
    pub fn fail_writes_to(&self, prefix: &str) {
        self.failing_prefixes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(prefix.to_string());
    }

    pub fn heal(&self) {
        self.failing_prefixes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    pub fn put_raw(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
    }

    fn check(&self, key: &str) -> DocumentStoreResult<()> {
        let failing = self
            .failing_prefixes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|prefix| key.starts_with(prefix.as_str()));

        if failing {
            Err(DocumentStoreError::Substrate(format!("write to {key} refused")))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl KeyValueStore for FlakyStore {
    async fn get(&self, key: &str) -> DocumentStoreResult<Option<String>> {
        Ok(self.raw(key))
    }

    async fn set(&self, key: &str, value: &str) -> DocumentStoreResult<()> {
        self.check(key)?;
        self.put_raw(key, value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> DocumentStoreResult<()> {
        self.check(key)?;
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}
