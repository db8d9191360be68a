mod common;

use std::collections::HashSet;

use futures::future::join_all;
use kvdoc::{document, prelude::*};

use common::{fs_store, memory_store};

async fn seed_orders<S: KeyValueStore>(store: &DocumentStore<S>) {
    for (id, amount, status) in [
        ("a", 100, "completed"),
        ("b", 50, "pending"),
        ("c", 70, "completed"),
    ] {
        store
            .create(
                "orders",
                document! { "amount" => amount, "status" => status },
                Some(id),
            )
            .await
            .unwrap();
    }
}

fn sorted_ids(docs: &[Document]) -> Vec<String> {
    let mut ids: Vec<_> = docs
        .iter()
        .map(|d| d.id().unwrap().to_string())
        .collect();
    ids.sort();
    ids
}

async fn order_lifecycle<S: KeyValueStore>(store: DocumentStore<S>) {
    let id = store
        .create("orders", document! { "amount" => 100, "status" => "completed" }, None)
        .await
        .unwrap();
    let created = store.get("orders", &id).await.unwrap().unwrap();
    assert_eq!(created.get_f64("amount"), Some(100.0));
    assert_eq!(created.get_str("status"), Some("completed"));
    assert!(!created.created_at().unwrap().is_empty());
    assert_eq!(created.created_at(), created.updated_at());
    store.delete("orders", &id).await.unwrap();

    seed_orders(&store).await;
    let completed = store
        .query(
            "orders",
            Query::builder()
                .filter(Filter::eq("status", "completed"))
                .build(),
        )
        .await
        .unwrap();
    assert_eq!(sorted_ids(&completed), vec!["a", "c"]);

    let before = store.get("orders", "a").await.unwrap().unwrap();
    assert!(
        store
            .update("orders", "a", document! { "status" => "cancelled" })
            .await
            .unwrap()
    );
    let after = store.get("orders", "a").await.unwrap().unwrap();
    assert_eq!(after.get_str("status"), Some("cancelled"));
    assert_eq!(after.get_f64("amount"), Some(100.0));
    assert!(after.updated_at() > before.updated_at());
    assert_eq!(after.created_at(), before.created_at());

    assert!(
        !store
            .update("orders", "missing-id", document! { "status" => "x" })
            .await
            .unwrap()
    );
    assert!(store.get("orders", "missing-id").await.unwrap().is_none());

    assert!(store.delete("orders", "a").await.unwrap());
    assert!(store.delete("orders", "a").await.unwrap());
    let remaining = store.query("orders", Query::new()).await.unwrap();
    assert_eq!(sorted_ids(&remaining), vec!["b", "c"]);
    assert!(store.get("orders", "a").await.unwrap().is_none());
}

async fn top_amounts<S: KeyValueStore>(store: DocumentStore<S>) {
    for amount in [10, 50, 30, 80, 20] {
        store
            .create("orders", document! { "amount" => amount }, None)
            .await
            .unwrap();
    }

    let top = store
        .query("orders", Query::builder().order_by("amount").limit(2).build())
        .await
        .unwrap();

    let amounts: Vec<_> = top.iter().map(|d| d.get_f64("amount").unwrap()).collect();
    assert_eq!(amounts, vec![80.0, 50.0]);
}

#[tokio::test]
async fn order_lifecycle_in_memory() {
    order_lifecycle(memory_store()).await;
}

#[tokio::test]
async fn order_lifecycle_on_disk() {
    let (store, _dir) = fs_store().await;
    order_lifecycle(store).await;
}

#[tokio::test]
async fn top_amounts_in_memory() {
    top_amounts(memory_store()).await;
}

#[tokio::test]
async fn top_amounts_on_disk() {
    let (store, _dir) = fs_store().await;
    top_amounts(store).await;
}

#[tokio::test]
async fn generated_ids_are_distinct() {
    let store = memory_store();

    let creates = (0..200).map(|i| store.create("orders", document! { "n" => i }, None));
    let ids: Vec<_> = join_all(creates)
        .await
        .into_iter()
        .map(Result::unwrap)
        .collect();

    assert_eq!(ids.iter().collect::<HashSet<_>>().len(), 200);
    assert_eq!(store.ids("orders").await.unwrap().len(), 200);
}

#[tokio::test]
async fn equality_filter_selects_exact_subset() {
    let store = memory_store();
    let statuses = ["completed", "pending", "completed", "cancelled", "pending"];
    for (i, status) in statuses.iter().enumerate() {
        store
            .create(
                "orders",
                document! { "status" => *status, "n" => i },
                Some(format!("o{i}").as_str()),
            )
            .await
            .unwrap();
    }

    for status in ["completed", "pending", "cancelled", "refunded"] {
        let found = store
            .query("orders", Query::builder().filter(Filter::eq("status", status)).build())
            .await
            .unwrap();
        let expected: Vec<String> = statuses
            .iter()
            .enumerate()
            .filter(|(_, s)| **s == status)
            .map(|(i, _)| format!("o{i}"))
            .collect();

        assert_eq!(sorted_ids(&found), expected);
    }
}

#[tokio::test]
async fn index_matches_present_documents_after_mixed_operations() {
    let (store, _dir) = fs_store().await;

    for i in 0..10 {
        store
            .create("orders", document! { "n" => i }, Some(format!("o{i}").as_str()))
            .await
            .unwrap();
    }
    for i in [1, 4, 4, 7, 42] {
        store.delete("orders", &format!("o{i}")).await.unwrap();
    }
    store
        .create("orders", document! { "n" => 4 }, Some("o4"))
        .await
        .unwrap();

    let listed: HashSet<_> = store
        .query("orders", Query::new())
        .await
        .unwrap()
        .into_iter()
        .map(|d| d.id().unwrap().to_string())
        .collect();

    let mut present = HashSet::new();
    for i in 0..10 {
        let id = format!("o{i}");
        if store.get("orders", &id).await.unwrap().is_some() {
            present.insert(id);
        }
    }

    assert_eq!(listed, present);
    assert_eq!(listed.len(), 8);
}

#[tokio::test]
async fn documents_survive_reopening_the_directory() {
    let (store, dir) = fs_store().await;
    let id = store
        .create("expenses", document! { "amount" => 150, "vendor" => "Google" }, None)
        .await
        .unwrap();
    drop(store);

    let kv = kvdoc::fs::FsKeyValueStore::new(dir.path().join("data"));
    let reopened = DocumentStore::new(kv);

    let doc = reopened.get("expenses", &id).await.unwrap().unwrap();
    assert_eq!(doc.get_str("vendor"), Some("Google"));
    assert_eq!(reopened.ids("expenses").await.unwrap(), vec![id]);
}

#[tokio::test]
async fn substrate_keys_follow_the_collection_layout() {
    let store = memory_store();
    store
        .create("orders", document! { "amount" => 1 }, Some("a"))
        .await
        .unwrap();

    assert_eq!(
        store.substrate().keys().await,
        vec!["collection_orders".to_string(), "orders_a".to_string()]
    );
    assert_eq!(
        store.substrate().get("collection_orders").await.unwrap().as_deref(),
        Some(r#"["a"]"#)
    );
}

#[tokio::test]
async fn long_ids_work_on_disk() {
    let (store, _dir) = fs_store().await;
    let id = "x".repeat(200);

    store
        .create("orders", document! { "amount" => 5 }, Some(id.as_str()))
        .await
        .unwrap();

    let doc = store.get("orders", &id).await.unwrap().unwrap();
    assert_eq!(doc.get_f64("amount"), Some(5.0));
    assert_eq!(store.ids("orders").await.unwrap(), vec![id.clone()]);
    assert!(store.delete("orders", &id).await.unwrap());
    assert!(store.query("orders", Query::new()).await.unwrap().is_empty());
}
