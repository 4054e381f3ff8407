// LanceDB vector database module
// Handles vector storage and nearest-neighbor search for record embeddings

pub mod vector_store;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

pub use vector_store::VectorStore;

/// Vector entry stored alongside each indexed record. The id equals the
/// owning content record's id, which is the join key back into the
/// document store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorEntry {
    pub id: String,
    pub vector: Vec<f32>,
    pub metadata: VectorMetadata,
    /// Denormalized searchable text the vector was computed from
    pub text: String,
}

/// Snapshot of record fields stored next to the embedding, enough to
/// facet-filter and build prompts without a document store round trip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorMetadata {
    pub title: String,
    pub description: String,
    pub url: String,
    pub content_kind: String,
    pub category: String,
    /// RFC 3339 timestamp of when the record was added
    pub date_added: String,
}

/// One nearest-neighbor hit. Distances are cosine distances, so the
/// similarity score is `1 - distance`.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorHit {
    pub id: String,
    pub distance: f32,
    pub similarity: f32,
    pub metadata: VectorMetadata,
    pub text: String,
}

/// Nearest-neighbor index over vector entries. The search pipeline depends
/// on this trait; `VectorStore` is the LanceDB-backed implementation.
///
/// There is deliberately no owner filter here: ownership is enforced at the
/// document store during enrichment.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Insert or replace the entry for a record. Entries are never mutated
    /// in place; re-embedding replaces the previous entry.
    async fn upsert(&self, entry: VectorEntry) -> Result<()>;

    /// Return up to `limit` entries ordered by ascending distance
    async fn query(&self, vector: &[f32], limit: usize) -> Result<Vec<VectorHit>>;

    async fn delete(&self, id: &str) -> Result<()>;

    async fn count(&self) -> Result<u64>;
}
