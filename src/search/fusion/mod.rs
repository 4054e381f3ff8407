//! Score fusion and ranking
//!
//! Pure functions that merge the semantic and keyword retrieval paths into
//! one deterministic ranking. No I/O happens here, so the weighting math is
//! unit-testable on its own.


use chrono::NaiveDateTime;
use std::collections::HashMap;

use crate::database::sqlite::models::ContentKind;

/// Snapshot of the fields a candidate carries between retrieval and
/// enrichment: enough for facet filtering, date filtering, and tie-breaking
/// without another store round trip
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateFields {
    pub title: String,
    pub description: String,
    pub url: String,
    pub content_kind: String,
    pub category: String,
    pub date_added: NaiveDateTime,
    pub text: String,
}

/// A hit from the semantic (vector) retrieval path
#[derive(Debug, Clone, PartialEq)]
pub struct SemanticHit {
    pub id: String,
    pub similarity: f32,
    pub fields: CandidateFields,
}

/// A hit from the keyword retrieval path; its rank is its position in the
/// result list
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordHit {
    pub id: String,
    pub fields: CandidateFields,
}

/// Fused representation of one candidate record before enrichment
#[derive(Debug, Clone, PartialEq)]
pub struct RankedCandidate {
    pub id: String,
    pub semantic_score: f32,
    pub keyword_score: f32,
    pub fields: CandidateFields,
}

impl RankedCandidate {
    #[inline]
    pub fn final_score(&self) -> f32 {
        self.semantic_score + self.keyword_score
    }
}

/// Clamp a caller-supplied semantic weight into `[0, 1]`. Out-of-range
/// values are clamped rather than rejected; a NaN weight counts as balanced.
#[inline]
pub fn clamp_weight(weight: f32) -> f32 {
    if weight.is_nan() {
        return 0.5;
    }
    weight.clamp(0.0, 1.0)
}

/// Linear rank decay for keyword hits: position `index` (0-based) out of
/// `total` scores `1 - index/total`, so the first hit scores 1 and scores
/// fall off evenly from there
#[inline]
pub fn keyword_rank_score(index: usize, total: usize) -> f32 {
    if total == 0 {
        return 0.0;
    }
    1.0 - index as f32 / total as f32
}

/// Merge both retrieval paths into one candidate per record id.
///
/// Semantic hits contribute `similarity * weight`; the keyword hit at rank
/// `i` of `n` contributes `keyword_rank_score(i, n) * (1 - weight)`. A
/// record appearing on both paths sums its contributions. The result is
/// sorted, not truncated; facet filtering happens before truncation.
#[inline]
pub fn fuse(
    semantic: Vec<SemanticHit>,
    keyword: Vec<KeywordHit>,
    semantic_weight: f32,
) -> Vec<RankedCandidate> {
    let weight = clamp_weight(semantic_weight);
    let keyword_total = keyword.len();

    let mut combined: HashMap<String, RankedCandidate> = HashMap::new();

    for hit in semantic {
        combined.insert(
            hit.id.clone(),
            RankedCandidate {
                id: hit.id,
                semantic_score: hit.similarity * weight,
                keyword_score: 0.0,
                fields: hit.fields,
            },
        );
    }

    for (index, hit) in keyword.into_iter().enumerate() {
        let score = keyword_rank_score(index, keyword_total) * (1.0 - weight);

        match combined.get_mut(&hit.id) {
            Some(candidate) => candidate.keyword_score = score,
            None => {
                combined.insert(
                    hit.id.clone(),
                    RankedCandidate {
                        id: hit.id,
                        semantic_score: 0.0,
                        keyword_score: score,
                        fields: hit.fields,
                    },
                );
            }
        }
    }

    let mut candidates: Vec<RankedCandidate> = combined.into_values().collect();
    sort_candidates(&mut candidates);
    candidates
}

/// Pure-semantic ranking: similarity is the whole score
#[inline]
pub fn semantic_ranking(hits: Vec<SemanticHit>) -> Vec<RankedCandidate> {
    let mut candidates: Vec<RankedCandidate> = hits
        .into_iter()
        .map(|hit| RankedCandidate {
            id: hit.id,
            semantic_score: hit.similarity,
            keyword_score: 0.0,
            fields: hit.fields,
        })
        .collect();

    sort_candidates(&mut candidates);
    candidates
}

/// Exact-match facet filter, applied after fusion and before truncation.
/// The vector store cannot filter on these fields, which is why retrieval
/// overfetches.
#[inline]
pub fn filter_by_facets(
    candidates: Vec<RankedCandidate>,
    content_kind: Option<ContentKind>,
    category: Option<&str>,
) -> Vec<RankedCandidate> {
    candidates
        .into_iter()
        .filter(|c| {
            content_kind.is_none_or(|kind| c.fields.content_kind == kind.as_str())
                && category.is_none_or(|cat| c.fields.category == cat)
        })
        .collect()
}

/// Descending final score; ties broken by most recent addition, then id, so
/// repeated identical queries produce byte-identical orderings
fn sort_candidates(candidates: &mut [RankedCandidate]) {
    candidates.sort_by(|a, b| {
        b.final_score()
            .total_cmp(&a.final_score())
            .then_with(|| b.fields.date_added.cmp(&a.fields.date_added))
            .then_with(|| a.id.cmp(&b.id))
    });
}
