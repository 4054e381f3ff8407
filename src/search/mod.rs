//! Hybrid Retrieval & Ranking Pipeline
//!
//! Turns a natural-language query into a ranked, enriched, deduplicated
//! result set. Per request the pipeline is: Embed → Retrieve (parallel
//! vector + keyword) → Fuse → Facet-filter → Truncate → Enrich → [Rerank]
//! → [Summarize/Answer] → Respond. Optional stages degrade gracefully;
//! mandatory-stage failures abort with a typed error.


pub mod assist;
pub mod fusion;

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::database::lancedb::{VectorHit, VectorIndex};
use crate::database::sqlite::Database;
use crate::database::sqlite::models::{ContentKind, ContentRecord, KeywordFilters};
use crate::embeddings::{Embedder, searchable_text};
use crate::llm::CompletionModel;
use crate::{RecallError, Result};
use fusion::{CandidateFields, KeywordHit, RankedCandidate, SemanticHit};

const DEFAULT_OVERFETCH_FACTOR: usize = 2;

/// Inclusive bounds on a record's addition timestamp
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

impl DateRange {
    #[inline]
    pub fn contains(&self, timestamp: NaiveDateTime) -> bool {
        self.start.is_none_or(|start| timestamp >= start)
            && self.end.is_none_or(|end| timestamp <= end)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub limit: usize,
    pub content_kind: Option<ContentKind>,
    pub category: Option<String>,
    pub date_range: Option<DateRange>,
    pub rerank: bool,
    pub summarize: bool,
}

impl SearchRequest {
    #[inline]
    pub fn new(query: impl Into<String>, limit: usize) -> Self {
        Self {
            query: query.into(),
            limit,
            content_kind: None,
            category: None,
            date_range: None,
            rerank: false,
            summarize: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HybridSearchRequest {
    pub query: String,
    pub limit: usize,
    pub content_kind: Option<ContentKind>,
    pub category: Option<String>,
    pub semantic_weight: f32,
}

impl HybridSearchRequest {
    #[inline]
    pub fn new(query: impl Into<String>, limit: usize, semantic_weight: f32) -> Self {
        Self {
            query: query.into(),
            limit,
            content_kind: None,
            category: None,
            semantic_weight,
        }
    }
}

/// A candidate resolved against the document store, carrying its fused
/// scores and the full record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedResult {
    pub score: f32,
    pub semantic_score: f32,
    pub keyword_score: f32,
    pub record: ContentRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResponse {
    pub count: usize,
    pub summary: Option<String>,
    pub results: Vec<EnrichedResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HybridSearchResponse {
    pub count: usize,
    pub results: Vec<EnrichedResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceRef {
    pub title: String,
    pub url: String,
    pub content_kind: ContentKind,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AskResponse {
    pub answer: String,
    pub sources: Vec<SourceRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceSummary {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarResponse {
    pub source: SourceSummary,
    pub count: usize,
    pub results: Vec<EnrichedResult>,
}

/// The retrieval pipeline with its collaborators injected at construction.
/// The vector index and completion model are optional: without the former,
/// hybrid search degrades to keyword-only and pure-semantic operations
/// report unavailability; without the latter, re-ranking, summaries, and
/// question answering are disabled.
pub struct SearchEngine {
    store: Database,
    vectors: Option<Arc<dyn VectorIndex>>,
    embedder: Arc<dyn Embedder>,
    model: Option<Arc<dyn CompletionModel>>,
    overfetch_factor: usize,
}

impl SearchEngine {
    #[inline]
    pub fn new(store: Database, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            store,
            vectors: None,
            embedder,
            model: None,
            overfetch_factor: DEFAULT_OVERFETCH_FACTOR,
        }
    }

    #[inline]
    pub fn with_vector_index(mut self, vectors: Arc<dyn VectorIndex>) -> Self {
        self.vectors = Some(vectors);
        self
    }

    #[inline]
    pub fn with_completion_model(mut self, model: Arc<dyn CompletionModel>) -> Self {
        self.model = Some(model);
        self
    }

    /// Overfetch keeps post-retrieval filtering from starving the limit;
    /// values below 2 are raised to 2
    #[inline]
    pub fn with_overfetch_factor(mut self, factor: usize) -> Self {
        self.overfetch_factor = factor.max(DEFAULT_OVERFETCH_FACTOR);
        self
    }

    /// Semantic search with optional facet and date filtering, plus
    /// optional model-backed re-ranking and summarization
    #[inline]
    pub async fn search(&self, owner_id: &str, request: &SearchRequest) -> Result<SearchResponse> {
        let query = validate_query(&request.query)?;
        let limit = request.limit.max(1);

        let mut hits = self
            .semantic_hits(query, limit * self.overfetch_factor)
            .await?;

        // The vector store has no native range filter on the addition
        // timestamp; a narrow window may fill less than the limit
        if let Some(range) = &request.date_range {
            hits.retain(|hit| range.contains(hit.fields.date_added));
        }

        let candidates = fusion::semantic_ranking(hits);
        let mut candidates = fusion::filter_by_facets(
            candidates,
            request.content_kind,
            request.category.as_deref(),
        );
        candidates.truncate(limit);

        let mut results = self.enrich(candidates, owner_id).await?;

        if request.rerank && !results.is_empty() {
            match &self.model {
                Some(model) => {
                    results = assist::rerank(model.as_ref(), query, results, limit).await;
                }
                None => warn!("Re-ranking requested but no language model is configured"),
            }
        }

        let summary = if request.summarize && !results.is_empty() {
            match &self.model {
                Some(model) => Some(assist::summarize(model.as_ref(), query, &results).await),
                None => {
                    warn!("Summarization requested but no language model is configured");
                    None
                }
            }
        } else {
            None
        };

        Ok(SearchResponse {
            count: results.len(),
            summary,
            results,
        })
    }

    /// Hybrid retrieval: the semantic and keyword paths run concurrently and
    /// join before fusion. A failing semantic path degrades this operation
    /// to keyword-only; the keyword path is the availability floor.
    #[inline]
    pub async fn hybrid_search(
        &self,
        owner_id: &str,
        request: &HybridSearchRequest,
    ) -> Result<HybridSearchResponse> {
        let query = validate_query(&request.query)?;
        let limit = request.limit.max(1);
        let fetch_limit = limit * self.overfetch_factor;

        let filters = KeywordFilters {
            content_kind: request.content_kind,
            category: request.category.clone(),
        };

        let (semantic_hits, keyword_records) = tokio::join!(
            self.degradable_semantic_hits(query, fetch_limit),
            self.store
                .find_by_text_match(query, owner_id, &filters, fetch_limit)
        );

        let keyword_records = keyword_records
            .map_err(|e| RecallError::Database(format!("Keyword search failed: {}", e)))?;
        let keyword_hits = keyword_records
            .iter()
            .map(|record| KeywordHit {
                id: record.id.clone(),
                fields: fields_from_record(record),
            })
            .collect();

        let candidates = fusion::fuse(semantic_hits, keyword_hits, request.semantic_weight);
        let mut candidates = fusion::filter_by_facets(
            candidates,
            request.content_kind,
            request.category.as_deref(),
        );
        candidates.truncate(limit);

        let results = self.enrich(candidates, owner_id).await?;

        Ok(HybridSearchResponse {
            count: results.len(),
            results,
        })
    }

    /// Answer a question from the user's own records, with source
    /// attribution. Requires both the vector store and the language model.
    #[inline]
    pub async fn ask(&self, owner_id: &str, question: &str, limit: usize) -> Result<AskResponse> {
        let question = validate_query(question)?;
        let model = self.model.as_ref().ok_or_else(|| {
            RecallError::Unavailable(
                "language model is not available; question answering is disabled".to_string(),
            )
        })?;
        let limit = limit.max(1);

        let hits = self
            .semantic_hits(question, limit * self.overfetch_factor)
            .await?;
        let mut candidates = fusion::semantic_ranking(hits);
        candidates.truncate(limit);

        let results = self.enrich(candidates, owner_id).await?;

        if results.is_empty() {
            return Ok(AskResponse {
                answer: assist::EMPTY_ANSWER.to_string(),
                sources: Vec::new(),
            });
        }

        let answer = assist::answer(model.as_ref(), question, &results).await;
        let sources = results
            .iter()
            .map(|result| SourceRef {
                title: result.record.title.clone(),
                url: result.record.url.clone(),
                content_kind: result.record.content_kind,
                score: result.score,
            })
            .collect();

        Ok(AskResponse { answer, sources })
    }

    /// Records similar to an existing record, queried by the source's own
    /// denormalized text. The source itself never appears in the results.
    #[inline]
    pub async fn find_similar(
        &self,
        owner_id: &str,
        source_id: &str,
        limit: usize,
    ) -> Result<SimilarResponse> {
        let record = self
            .store
            .get_record(source_id, owner_id)
            .await
            .map_err(|e| RecallError::Database(format!("Failed to fetch source record: {}", e)))?
            .ok_or_else(|| RecallError::NotFound(format!("Content {} not found", source_id)))?;

        let limit = limit.max(1);
        let text = searchable_text(
            &record.title,
            &record.description,
            &record.body,
            &record.url,
            &record.keywords,
        );
        if text.is_empty() {
            return Err(RecallError::InvalidArgument(
                "source record has no searchable text".to_string(),
            ));
        }

        // One extra hit because the source's own vector is its nearest
        // neighbor to itself
        let hits = self.semantic_hits(&text, limit + 1).await?;
        let hits = hits.into_iter().filter(|hit| hit.id != record.id).collect();

        let mut candidates = fusion::semantic_ranking(hits);
        candidates.truncate(limit);

        let results = self.enrich(candidates, owner_id).await?;

        Ok(SimilarResponse {
            source: SourceSummary {
                id: record.id,
                title: record.title,
            },
            count: results.len(),
            results,
        })
    }

    /// Embed the query and run the nearest-neighbor lookup. Mandatory-path
    /// variant: an absent vector store is a typed unavailability.
    async fn semantic_hits(&self, query_text: &str, fetch_limit: usize) -> Result<Vec<SemanticHit>> {
        let vectors = self.vectors.as_ref().ok_or_else(|| {
            RecallError::Unavailable(
                "vector store is not available; semantic search is disabled".to_string(),
            )
        })?;

        let query_vector = self.embedder.embed(query_text).await?;
        let hits = vectors.query(&query_vector, fetch_limit).await?;

        debug!("Semantic path returned {} hits", hits.len());

        Ok(hits.into_iter().map(semantic_hit_from).collect())
    }

    /// Semantic path for hybrid mode: any failure degrades to an empty hit
    /// list instead of aborting, since the keyword path still serves.
    async fn degradable_semantic_hits(&self, query_text: &str, fetch_limit: usize) -> Vec<SemanticHit> {
        if self.vectors.is_none() {
            debug!("Vector store not available; hybrid search degrades to keyword-only");
            return Vec::new();
        }

        match self.semantic_hits(query_text, fetch_limit).await {
            Ok(hits) => hits,
            Err(e) => {
                warn!("Semantic path failed, degrading to keyword-only: {}", e);
                Vec::new()
            }
        }
    }

    /// Resolve candidates against the document store under the requesting
    /// owner. This is where ownership is enforced for vector-path hits: an
    /// id that resolves to no record under this owner is silently dropped —
    /// it may belong to another user, or the record may have been deleted
    /// between the vector hit and the fetch.
    async fn enrich(
        &self,
        candidates: Vec<RankedCandidate>,
        owner_id: &str,
    ) -> Result<Vec<EnrichedResult>> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<String> = candidates.iter().map(|c| c.id.clone()).collect();
        let records = self.store.find_by_ids(&ids, owner_id).await.map_err(|e| {
            RecallError::Database(format!("Failed to fetch records for enrichment: {}", e))
        })?;

        let mut by_id: HashMap<String, ContentRecord> =
            records.into_iter().map(|r| (r.id.clone(), r)).collect();

        let results = candidates
            .into_iter()
            .filter_map(|candidate| match by_id.remove(&candidate.id) {
                Some(record) => Some(EnrichedResult {
                    score: candidate.final_score(),
                    semantic_score: candidate.semantic_score,
                    keyword_score: candidate.keyword_score,
                    record,
                }),
                None => {
                    debug!(
                        "Dropping candidate {} with no record under this owner",
                        candidate.id
                    );
                    None
                }
            })
            .collect();

        Ok(results)
    }
}

fn validate_query(query: &str) -> Result<&str> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(RecallError::InvalidArgument(
            "query must not be empty".to_string(),
        ));
    }
    Ok(trimmed)
}

fn semantic_hit_from(hit: VectorHit) -> SemanticHit {
    let date_added = DateTime::parse_from_rfc3339(&hit.metadata.date_added)
        .map(|d| d.naive_utc())
        .unwrap_or_else(|_| DateTime::UNIX_EPOCH.naive_utc());

    SemanticHit {
        id: hit.id,
        similarity: hit.similarity,
        fields: CandidateFields {
            title: hit.metadata.title,
            description: hit.metadata.description,
            url: hit.metadata.url,
            content_kind: hit.metadata.content_kind,
            category: hit.metadata.category,
            date_added,
            text: hit.text,
        },
    }
}

fn fields_from_record(record: &ContentRecord) -> CandidateFields {
    CandidateFields {
        title: record.title.clone(),
        description: record.description.clone(),
        url: record.url.clone(),
        content_kind: record.content_kind.as_str().to_string(),
        category: record.category.clone(),
        date_added: record.date_added,
        text: record.body.clone(),
    }
}
