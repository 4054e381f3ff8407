use super::*;
use crate::config::Config;
use tempfile::TempDir;

async fn create_test_store(dimension: u32) -> (TempDir, VectorStore) {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let mut config = Config::load(temp_dir.path()).expect("Failed to load config");
    config.ollama.embedding_dimension = dimension;

    let store = VectorStore::new(&config)
        .await
        .expect("Failed to create vector store");
    (temp_dir, store)
}

fn entry(id: &str, vector: Vec<f32>) -> VectorEntry {
    VectorEntry {
        id: id.to_string(),
        vector,
        metadata: VectorMetadata {
            title: format!("Title {}", id),
            description: String::new(),
            url: String::new(),
            content_kind: "note".to_string(),
            category: "General".to_string(),
            date_added: "2026-07-01T12:00:00+00:00".to_string(),
        },
        text: format!("text for {}", id),
    }
}

#[tokio::test]
async fn new_store_is_ready_and_empty() {
    let (_temp_dir, store) = create_test_store(4).await;

    assert!(store.is_ready().await);
    assert_eq!(store.count().await.expect("count should succeed"), 0);
}

#[tokio::test]
async fn upsert_rejects_dimension_mismatch() {
    let (_temp_dir, store) = create_test_store(4).await;

    let result = store.upsert(entry("a", vec![1.0, 0.0])).await;
    assert!(matches!(result, Err(RecallError::Database(_))));
}

#[tokio::test]
async fn upsert_replaces_existing_entry() {
    let (_temp_dir, store) = create_test_store(4).await;

    store
        .upsert(entry("a", vec![1.0, 0.0, 0.0, 0.0]))
        .await
        .expect("first upsert should succeed");
    store
        .upsert(entry("a", vec![0.0, 1.0, 0.0, 0.0]))
        .await
        .expect("second upsert should succeed");

    assert_eq!(store.count().await.expect("count should succeed"), 1);
}

#[tokio::test]
async fn query_orders_by_distance() {
    let (_temp_dir, store) = create_test_store(4).await;

    store
        .upsert(entry("near", vec![1.0, 0.0, 0.0, 0.0]))
        .await
        .expect("upsert should succeed");
    store
        .upsert(entry("far", vec![0.0, 1.0, 0.0, 0.0]))
        .await
        .expect("upsert should succeed");

    let hits = store
        .query(&[1.0, 0.0, 0.0, 0.0], 10)
        .await
        .expect("query should succeed");

    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].id, "near");
    assert!(hits[0].similarity >= hits[1].similarity);
    assert_eq!(hits[0].metadata.title, "Title near");
}

#[tokio::test]
async fn delete_removes_entry() {
    let (_temp_dir, store) = create_test_store(4).await;

    store
        .upsert(entry("a", vec![1.0, 0.0, 0.0, 0.0]))
        .await
        .expect("upsert should succeed");
    store.delete("a").await.expect("delete should succeed");

    assert_eq!(store.count().await.expect("count should succeed"), 0);
}
