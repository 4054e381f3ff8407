//! Ingestion lifecycle
//!
//! Creates records, embeds their searchable text into the vector store, and
//! keeps the `is_indexed`/`vector_id` invariant: a record is flagged
//! indexed iff a vector entry with its id exists. Indexing failures leave
//! the record stored but unindexed; the backfill picks those up later.


use chrono::{TimeZone, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::database::lancedb::{VectorEntry, VectorIndex, VectorMetadata};
use crate::database::sqlite::Database;
use crate::database::sqlite::models::{ContentRecord, DEFAULT_CATEGORY, NewContentRecord};
use crate::embeddings::{Embedder, searchable_text};
use crate::llm::CompletionModel;
use crate::search::assist;
use crate::{RecallError, Result};

const MAX_EXTRACTED_KEYWORDS: usize = 10;

/// Moves records through the embed-and-index lifecycle. The vector store is
/// optional so records can still be stored (unindexed) while it is down;
/// the completion model is optional and only enriches missing keywords and
/// categories.
pub struct Indexer {
    store: Database,
    vectors: Option<Arc<dyn VectorIndex>>,
    embedder: Arc<dyn Embedder>,
    model: Option<Arc<dyn CompletionModel>>,
}

/// Outcome of a backfill pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexingStats {
    pub indexed: usize,
    pub failed: usize,
}

impl Indexer {
    #[inline]
    pub fn new(store: Database, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            store,
            vectors: None,
            embedder,
            model: None,
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

    fn require_vectors(&self) -> Result<&Arc<dyn VectorIndex>> {
        self.vectors.as_ref().ok_or_else(|| {
            RecallError::Unavailable(
                "vector store is not available; records cannot be indexed".to_string(),
            )
        })
    }

    /// Store a new record and index it best-effort: an embedding or vector
    /// store failure leaves the record stored with `is_indexed = false`.
    #[inline]
    pub async fn ingest(
        &self,
        owner_id: &str,
        mut new_record: NewContentRecord,
    ) -> Result<ContentRecord> {
        if new_record.title.trim().is_empty() {
            return Err(RecallError::InvalidArgument(
                "title must not be empty".to_string(),
            ));
        }
        if new_record.body.trim().is_empty() {
            return Err(RecallError::InvalidArgument(
                "body must not be empty".to_string(),
            ));
        }

        if let Some(model) = &self.model {
            self.enrich_new_record(model.as_ref(), &mut new_record).await;
        }

        let mut record = self
            .store
            .create_record(owner_id, new_record)
            .await
            .map_err(|e| RecallError::Database(format!("Failed to create record: {}", e)))?;

        match self.index_record(&record).await {
            Ok(()) => {
                record.vector_id = record.id.clone();
                record.is_indexed = true;
            }
            Err(e) => {
                warn!(
                    "Record {} stored but not indexed ({}); backfill will retry",
                    record.id, e
                );
            }
        }

        Ok(record)
    }

    /// Fill in missing keywords and category from the model, best-effort
    async fn enrich_new_record(&self, model: &dyn CompletionModel, new_record: &mut NewContentRecord) {
        if new_record.keywords.is_empty() {
            let text = format!(
                "{}\n{}\n{}",
                new_record.title, new_record.description, new_record.body
            );
            let keywords = assist::extract_keywords(model, &text, MAX_EXTRACTED_KEYWORDS).await;
            if !keywords.is_empty() {
                debug!("Model proposed {} keywords", keywords.len());
                new_record.keywords = keywords;
            }
        }

        if new_record.category.is_empty() || new_record.category == DEFAULT_CATEGORY {
            new_record.category = assist::categorize(
                model,
                &new_record.title,
                &new_record.description,
                &new_record.body,
            )
            .await;
        }
    }

    /// Embed a record's searchable text and upsert its vector entry,
    /// marking it indexed on success. Re-embedding replaces the prior
    /// entry; it is never mutated in place.
    #[inline]
    pub async fn index_record(&self, record: &ContentRecord) -> Result<()> {
        let vectors = self.require_vectors()?;

        let text = searchable_text(
            &record.title,
            &record.description,
            &record.body,
            &record.url,
            &record.keywords,
        );
        if text.is_empty() {
            return Err(RecallError::InvalidArgument(
                "record has no searchable text".to_string(),
            ));
        }

        let vector = self.embedder.embed(&text).await?;

        let entry = VectorEntry {
            id: record.id.clone(),
            vector,
            metadata: VectorMetadata {
                title: record.title.clone(),
                description: record.description.clone(),
                url: record.url.clone(),
                content_kind: record.content_kind.as_str().to_string(),
                category: record.category.clone(),
                date_added: Utc.from_utc_datetime(&record.date_added).to_rfc3339(),
            },
            text,
        };

        vectors.upsert(entry).await?;

        self.store
            .mark_indexed(&record.id, &record.id)
            .await
            .map_err(|e| RecallError::Database(format!("Failed to mark record indexed: {}", e)))?;

        debug!("Indexed record {}", record.id);
        Ok(())
    }

    /// Index every record that is not flagged indexed yet, oldest first.
    /// `progress` is invoked once per processed record.
    #[inline]
    pub async fn index_pending<F>(&self, mut progress: F) -> Result<IndexingStats>
    where
        F: FnMut(&ContentRecord),
    {
        self.require_vectors()?;

        let pending = self
            .store
            .list_unindexed()
            .await
            .map_err(|e| RecallError::Database(format!("Failed to list unindexed records: {}", e)))?;

        info!("Backfilling {} unindexed records", pending.len());

        let mut stats = IndexingStats::default();
        for record in &pending {
            match self.index_record(record).await {
                Ok(()) => stats.indexed += 1,
                Err(e) => {
                    warn!("Failed to index record {}: {}", record.id, e);
                    stats.failed += 1;
                }
            }
            progress(record);
        }

        Ok(stats)
    }

    /// Delete a record and, best-effort, its vector entry. A failed vector
    /// deletion only logs: enrichment drops unresolved ids, so an orphaned
    /// entry can never resurface as a match.
    #[inline]
    pub async fn remove_record(&self, owner_id: &str, id: &str) -> Result<ContentRecord> {
        let record = self
            .store
            .delete_record(id, owner_id)
            .await
            .map_err(|e| RecallError::Database(format!("Failed to delete record: {}", e)))?
            .ok_or_else(|| RecallError::NotFound(format!("Content {} not found", id)))?;

        if record.is_indexed {
            match &self.vectors {
                Some(vectors) => {
                    if let Err(e) = vectors.delete(&record.vector_id).await {
                        warn!(
                            "Failed to delete vector entry for {}; orphan stays invisible: {}",
                            record.id, e
                        );
                    }
                }
                None => warn!(
                    "Vector store unavailable; vector entry for {} not deleted",
                    record.id
                ),
            }
        }

        Ok(record)
    }
}
