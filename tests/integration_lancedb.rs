#![expect(
    clippy::tests_outside_test_module,
    reason = "integration tests are only compiled in test mode"
)]

//! Integration tests for the LanceDB vector store with realistic entries

use recall::config::Config;
use recall::database::lancedb::{VectorEntry, VectorIndex, VectorMetadata, VectorStore};
use tempfile::TempDir;
use uuid::Uuid;

const DIMENSION: u32 = 8;

fn create_test_config() -> (Config, TempDir) {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let mut config = Config::load(temp_dir.path()).expect("should load default config");
    config.ollama.embedding_dimension = DIMENSION;
    (config, temp_dir)
}

fn entry(title: &str, vector: Vec<f32>) -> VectorEntry {
    VectorEntry {
        id: Uuid::new_v4().to_string(),
        vector,
        metadata: VectorMetadata {
            title: title.to_string(),
            description: format!("Description of {}", title),
            url: format!("https://example.com/{}", title.replace(' ', "-")),
            content_kind: "webpage".to_string(),
            category: "Technology".to_string(),
            date_added: "2026-07-01T12:00:00+00:00".to_string(),
        },
        text: format!("{} searchable text", title),
    }
}

fn axis(index: usize) -> Vec<f32> {
    let mut vector = vec![0.0; DIMENSION as usize];
    vector[index] = 1.0;
    vector
}

#[tokio::test]
async fn round_trip_store_query_delete() {
    let (config, _temp_dir) = create_test_config();
    let store = VectorStore::new(&config)
        .await
        .expect("should create vector store");

    let near = entry("near match", axis(0));
    let far = entry("far match", axis(1));
    let near_id = near.id.clone();
    let far_id = far.id.clone();

    store.upsert(near).await.expect("should upsert near entry");
    store.upsert(far).await.expect("should upsert far entry");
    assert_eq!(store.count().await.expect("should count"), 2);

    let hits = store
        .query(&axis(0), 10)
        .await
        .expect("should run vector query");
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].id, near_id);
    assert!(hits[0].distance <= hits[1].distance);
    assert!(hits[0].similarity >= hits[1].similarity);
    assert_eq!(hits[0].metadata.title, "near match");
    assert_eq!(hits[0].metadata.content_kind, "webpage");
    assert!(hits[0].text.contains("searchable text"));

    store.delete(&far_id).await.expect("should delete entry");
    assert_eq!(store.count().await.expect("should count"), 1);

    let hits = store
        .query(&axis(0), 10)
        .await
        .expect("should run vector query");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, near_id);
}

#[tokio::test]
async fn query_respects_limit() {
    let (config, _temp_dir) = create_test_config();
    let store = VectorStore::new(&config)
        .await
        .expect("should create vector store");

    for index in 0..5 {
        store
            .upsert(entry(&format!("entry {}", index), axis(index)))
            .await
            .expect("should upsert entry");
    }

    let hits = store
        .query(&axis(0), 3)
        .await
        .expect("should run vector query");
    assert_eq!(hits.len(), 3);
}

#[tokio::test]
async fn reopening_store_preserves_entries() {
    let (config, _temp_dir) = create_test_config();

    {
        let store = VectorStore::new(&config)
            .await
            .expect("should create vector store");
        store
            .upsert(entry("persistent", axis(0)))
            .await
            .expect("should upsert entry");
    }

    let reopened = VectorStore::new(&config)
        .await
        .expect("should reopen vector store");
    assert!(reopened.is_ready().await);
    assert_eq!(reopened.count().await.expect("should count"), 1);
}
