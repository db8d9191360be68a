use std::sync::Once;

use kvdoc::{fs::FsKeyValueStore, memory::InMemoryKeyValueStore, prelude::*};
use tempfile::TempDir;

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("debug")
            .with_test_writer()
            .try_init();
    });
}

pub fn memory_store() -> DocumentStore<InMemoryKeyValueStore> {
    init_tracing();
    DocumentStore::new(InMemoryKeyValueStore::new())
}

/// The directory is removed when the returned guard drops.
#[allow(dead_code)]
pub async fn fs_store() -> (DocumentStore<FsKeyValueStore>, TempDir) {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let kv = FsKeyValueStore::builder(dir.path().join("data"))
        .build()
        .await
        .unwrap();

    (DocumentStore::new(kv), dir)
}
