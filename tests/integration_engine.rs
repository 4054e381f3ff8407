#![expect(
    clippy::tests_outside_test_module,
    reason = "integration tests are only compiled in test mode"
)]

//! End-to-end pipeline tests: records ingested through the indexer into
//! real SQLite and LanceDB stores, then retrieved through the engine

use async_trait::async_trait;
use recall::Result;
use recall::config::Config;
use recall::database::lancedb::{VectorIndex, VectorStore};
use recall::database::sqlite::Database;
use recall::database::sqlite::models::{ContentKind, NewContentRecord};
use recall::embeddings::Embedder;
use recall::indexer::Indexer;
use recall::search::{HybridSearchRequest, SearchEngine, SearchRequest};
use std::sync::Arc;
use tempfile::TempDir;

const DIMENSION: u32 = 4;

/// Deterministic toy embedder: one axis per topic term, so texts about the
/// same topic land near each other
struct TopicEmbedder;

#[async_trait]
impl Embedder for TopicEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let lower = text.to_lowercase();
        let mut vector = vec![
            f32::from(u8::from(lower.contains("burger"))),
            f32::from(u8::from(lower.contains("pancake"))),
            f32::from(u8::from(lower.contains("bread"))),
            0.1,
        ];

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        for value in &mut vector {
            *value /= norm;
        }

        Ok(vector)
    }
}

struct Fixture {
    _temp_dir: TempDir,
    store: Database,
    vectors: Arc<VectorStore>,
    embedder: Arc<TopicEmbedder>,
}

impl Fixture {
    async fn new() -> Self {
        let temp_dir = TempDir::new().expect("should create temp dir");
        let mut config = Config::load(temp_dir.path()).expect("should load default config");
        config.ollama.embedding_dimension = DIMENSION;

        let store = Database::new(config.database_path())
            .await
            .expect("should create database");
        let vectors = Arc::new(
            VectorStore::new(&config)
                .await
                .expect("should create vector store"),
        );

        Self {
            _temp_dir: temp_dir,
            store,
            vectors,
            embedder: Arc::new(TopicEmbedder),
        }
    }

    fn indexer(&self) -> Indexer {
        Indexer::new(self.store.clone(), Arc::clone(&self.embedder) as Arc<dyn Embedder>)
            .with_vector_index(Arc::clone(&self.vectors) as Arc<dyn VectorIndex>)
    }

    fn engine(&self) -> SearchEngine {
        SearchEngine::new(self.store.clone(), Arc::clone(&self.embedder) as Arc<dyn Embedder>)
            .with_vector_index(Arc::clone(&self.vectors) as Arc<dyn VectorIndex>)
    }

    async fn ingest(&self, owner: &str, title: &str, body: &str) -> String {
        let record = self
            .indexer()
            .ingest(
                owner,
                NewContentRecord {
                    title: title.to_string(),
                    body: body.to_string(),
                    content_kind: ContentKind::Webpage,
                    ..Default::default()
                },
            )
            .await
            .expect("ingest should succeed");
        assert!(record.is_indexed, "record should be indexed end to end");
        record.id
    }
}

#[tokio::test]
async fn search_finds_topically_nearest_records() {
    let fixture = Fixture::new().await;
    let burger = fixture
        .ingest("alice", "Classic Burger Recipe", "Grill the burger patty well.")
        .await;
    fixture
        .ingest("alice", "Best Pancake Recipe", "Flip the pancake once.")
        .await;
    fixture
        .ingest("alice", "Sourdough Bread Notes", "Feed the bread starter daily.")
        .await;

    let response = fixture
        .engine()
        .search("alice", &SearchRequest::new("how to cook a burger", 2))
        .await
        .expect("search should succeed");

    assert!(response.count >= 1);
    assert_eq!(response.results[0].record.id, burger);
    assert!(response.results[0].score >= response.results.last().expect("non-empty").score);
}

#[tokio::test]
async fn hybrid_search_merges_both_paths() {
    let fixture = Fixture::new().await;
    fixture
        .ingest("alice", "Classic Burger Recipe", "Grill the patty well.")
        .await;
    fixture
        .ingest("alice", "Sourdough Bread Notes", "Feed the starter daily.")
        .await;

    let response = fixture
        .engine()
        .hybrid_search("alice", &HybridSearchRequest::new("burger", 5, 0.7))
        .await
        .expect("hybrid search should succeed");

    assert!(response.count >= 1);
    let result = &response.results[0];
    assert_eq!(result.record.title, "Classic Burger Recipe");
    assert!(result.semantic_score > 0.0);
    assert!(result.keyword_score > 0.0);
    assert!((result.score - (result.semantic_score + result.keyword_score)).abs() < 1e-6);
}

#[tokio::test]
async fn find_similar_excludes_source_end_to_end() {
    let fixture = Fixture::new().await;
    let first = fixture
        .ingest("alice", "Classic Burger Recipe", "Grill the burger patty.")
        .await;
    let second = fixture
        .ingest("alice", "Smash Burger Guide", "Smash the burger thin.")
        .await;

    let response = fixture
        .engine()
        .find_similar("alice", &first, 5)
        .await
        .expect("find_similar should succeed");

    assert_eq!(response.source.id, first);
    assert!(response.results.iter().all(|r| r.record.id != first));
    assert!(response.results.iter().any(|r| r.record.id == second));
}

#[tokio::test]
async fn deleted_records_never_resurface() {
    let fixture = Fixture::new().await;
    let burger = fixture
        .ingest("alice", "Classic Burger Recipe", "Grill the burger patty.")
        .await;

    fixture
        .indexer()
        .remove_record("alice", &burger)
        .await
        .expect("remove should succeed");

    let response = fixture
        .engine()
        .search("alice", &SearchRequest::new("burger", 5))
        .await
        .expect("search should succeed");

    assert_eq!(response.count, 0);
}

#[tokio::test]
async fn foreign_records_never_surface_end_to_end() {
    let fixture = Fixture::new().await;
    fixture
        .ingest("bob", "Bob's Burger Recipe", "Bob grills a burger.")
        .await;
    let mine = fixture
        .ingest("alice", "Alice's Pancake Recipe", "Alice flips a pancake.")
        .await;

    let response = fixture
        .engine()
        .search("alice", &SearchRequest::new("burger", 5))
        .await
        .expect("search should succeed");

    // Bob's record scores highest in the vector store but is dropped at
    // enrichment; only Alice's own record may appear
    assert!(response.results.iter().all(|r| r.record.id == mine));
}
