use super::*;
use crate::database::sqlite::models::{ContentKind, ContentRecord, Origin};
use crate::{RecallError, Result};
use async_trait::async_trait;
use chrono::NaiveDate;

struct ScriptedModel {
    response: String,
}

impl ScriptedModel {
    fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
        }
    }
}

#[async_trait]
impl CompletionModel for ScriptedModel {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        Ok(self.response.clone())
    }
}

struct FailingModel;

#[async_trait]
impl CompletionModel for FailingModel {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        Err(RecallError::LanguageModel("scripted failure".to_string()))
    }
}

fn result(id: &str, title: &str, score: f32) -> EnrichedResult {
    let timestamp = NaiveDate::from_ymd_opt(2026, 7, 1)
        .and_then(|d| d.and_hms_opt(12, 0, 0))
        .expect("valid test date");

    EnrichedResult {
        score,
        semantic_score: score,
        keyword_score: 0.0,
        record: ContentRecord {
            id: id.to_string(),
            owner_id: "alice".to_string(),
            title: title.to_string(),
            description: String::new(),
            body: format!("{} body", title),
            content_kind: ContentKind::Webpage,
            url: String::new(),
            domain: String::new(),
            keywords: Vec::new(),
            category: "General".to_string(),
            origin: Origin::Manual,
            word_count: 2,
            page_count: 0,
            vector_id: id.to_string(),
            is_indexed: true,
            date_added: timestamp,
            created_date: timestamp,
        },
    }
}

#[test]
fn parse_ranking_accepts_comma_separated_indices() {
    assert_eq!(parse_ranking("2, 1, 3", 3), Some(vec![1, 0, 2]));
    assert_eq!(parse_ranking("[3, 1]", 3), Some(vec![2, 0]));
    assert_eq!(parse_ranking(" 1 ,2,\n3 ", 3), Some(vec![0, 1, 2]));
}

#[test]
fn parse_ranking_rejects_prose() {
    assert_eq!(parse_ranking("the best result is 2", 3), None);
    assert_eq!(parse_ranking("", 3), None);
    assert_eq!(parse_ranking("first, second", 3), None);
}

#[test]
fn parse_ranking_drops_out_of_range_and_duplicates() {
    assert_eq!(parse_ranking("1, 9, 2", 3), Some(vec![0, 1]));
    assert_eq!(parse_ranking("1, 1, 2", 3), Some(vec![0, 1]));
    assert_eq!(parse_ranking("0", 3), None);
}

#[tokio::test]
async fn rerank_reorders_results() {
    let model = ScriptedModel::new("3, 1, 2");
    let results = vec![
        result("a", "First", 0.9),
        result("b", "Second", 0.8),
        result("c", "Third", 0.7),
    ];

    let reranked = rerank(&model, "query", results, 3).await;

    let ids: Vec<&str> = reranked.iter().map(|r| r.record.id.as_str()).collect();
    assert_eq!(ids, vec!["c", "a", "b"]);
}

#[tokio::test]
async fn rerank_truncates_to_top_k() {
    let model = ScriptedModel::new("3, 1, 2");
    let results = vec![
        result("a", "First", 0.9),
        result("b", "Second", 0.8),
        result("c", "Third", 0.7),
    ];

    let reranked = rerank(&model, "query", results, 2).await;

    let ids: Vec<&str> = reranked.iter().map(|r| r.record.id.as_str()).collect();
    assert_eq!(ids, vec!["c", "a"]);
}

#[tokio::test]
async fn rerank_keeps_order_on_unparseable_response() {
    let model = ScriptedModel::new("I think the second one is best.");
    let results = vec![result("a", "First", 0.9), result("b", "Second", 0.8)];

    let reranked = rerank(&model, "query", results, 2).await;

    let ids: Vec<&str> = reranked.iter().map(|r| r.record.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
}

#[tokio::test]
async fn rerank_keeps_order_on_model_failure() {
    let results = vec![
        result("a", "First", 0.9),
        result("b", "Second", 0.8),
        result("c", "Third", 0.7),
    ];

    let reranked = rerank(&FailingModel, "query", results, 2).await;

    let ids: Vec<&str> = reranked.iter().map(|r| r.record.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
}

#[tokio::test]
async fn rerank_skips_model_for_single_result() {
    let results = vec![result("a", "Only", 0.9)];

    // A failing model proves the call never happens
    let reranked = rerank(&FailingModel, "query", results, 5).await;

    assert_eq!(reranked.len(), 1);
    assert_eq!(reranked[0].record.id, "a");
}

#[tokio::test]
async fn summarize_returns_model_output_trimmed() {
    let model = ScriptedModel::new("  A summary of the results.\n");
    let results = vec![result("a", "First", 0.9)];

    let summary = summarize(&model, "query", &results).await;

    assert_eq!(summary, "A summary of the results.");
}

#[tokio::test]
async fn summarize_falls_back_on_model_failure() {
    let results = vec![result("a", "First", 0.9)];

    let summary = summarize(&FailingModel, "query", &results).await;

    assert_eq!(summary, SUMMARY_FALLBACK);
}

#[tokio::test]
async fn answer_falls_back_on_model_failure() {
    let results = vec![result("a", "First", 0.9)];

    let answer_text = answer(&FailingModel, "what is this?", &results).await;

    assert_eq!(answer_text, ANSWER_FALLBACK);
}

#[tokio::test]
async fn extract_keywords_parses_json_array_with_prose() {
    let model = ScriptedModel::new("Sure! Here you go: [\"rust\", \"async\", \"tokio\"]");

    let keywords = extract_keywords(&model, "some text", 10).await;

    assert_eq!(keywords, vec!["rust", "async", "tokio"]);
}

#[tokio::test]
async fn extract_keywords_truncates_to_max() {
    let model = ScriptedModel::new("[\"a\", \"b\", \"c\"]");

    let keywords = extract_keywords(&model, "some text", 2).await;

    assert_eq!(keywords, vec!["a", "b"]);
}

#[tokio::test]
async fn extract_keywords_is_empty_on_garbage() {
    let model = ScriptedModel::new("no keywords for you");
    assert!(extract_keywords(&model, "some text", 10).await.is_empty());

    assert!(extract_keywords(&FailingModel, "some text", 10).await.is_empty());
}

#[tokio::test]
async fn categorize_maps_to_canonical_category() {
    let model = ScriptedModel::new("technology\n");
    let category = categorize(&model, "title", "desc", "body").await;
    assert_eq!(category, "Technology");
}

#[tokio::test]
async fn categorize_falls_back_on_unknown_or_failure() {
    let model = ScriptedModel::new("Cryptozoology");
    assert_eq!(categorize(&model, "t", "d", "b").await, "Other");

    assert_eq!(categorize(&FailingModel, "t", "d", "b").await, "Other");
}

#[test]
fn snippet_truncates_on_char_boundaries() {
    assert_eq!(snippet("short", 10), "short");
    assert_eq!(snippet("abcdefgh", 3), "abc...");
    assert_eq!(snippet("héllo wörld", 5), "héllo...");
}
