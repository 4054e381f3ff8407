//! Language-Model-backed assists
//!
//! Every stage here is best-effort: a model failure or an unparseable
//! response degrades the stage (original order kept, fixed fallback text)
//! and never fails the surrounding request.

#[cfg(test)]
mod tests;

use std::collections::HashSet;
use std::fmt::Write as _;
use tracing::warn;

use super::EnrichedResult;
use crate::llm::CompletionModel;

pub const SUMMARY_FALLBACK: &str = "Unable to generate summary at this time.";
pub const ANSWER_FALLBACK: &str = "Unable to answer question at this time.";
pub const EMPTY_ANSWER: &str =
    "I couldn't find any relevant content in your archive to answer this question.";

pub const CATEGORIES: &[&str] = &[
    "Technology",
    "Science",
    "Business",
    "Health",
    "Entertainment",
    "Education",
    "News",
    "Tutorial",
    "Documentation",
    "Research",
    "Personal",
    "Other",
];

const FALLBACK_CATEGORY: &str = "Other";
const RERANK_SNIPPET_CHARS: usize = 200;
const SUMMARY_CONTEXT_RESULTS: usize = 5;
const SUMMARY_SNIPPET_CHARS: usize = 500;
const ANSWER_CONTEXT_RESULTS: usize = 3;
const ANSWER_SNIPPET_CHARS: usize = 1000;
const KEYWORD_INPUT_CHARS: usize = 2000;
const CATEGORIZE_SNIPPET_CHARS: usize = 500;

/// Reorder results by asking the model for a preference ordering. Falls
/// back to the incoming order truncated to `top_k` on any failure.
#[inline]
pub async fn rerank(
    model: &dyn CompletionModel,
    query: &str,
    mut results: Vec<EnrichedResult>,
    top_k: usize,
) -> Vec<EnrichedResult> {
    if results.len() <= 1 {
        results.truncate(top_k);
        return results;
    }

    let prompt = build_rerank_prompt(query, &results, top_k);

    let response = match model.complete(&prompt).await {
        Ok(response) => response,
        Err(e) => {
            warn!("Re-ranking call failed, keeping original order: {}", e);
            results.truncate(top_k);
            return results;
        }
    };

    match parse_ranking(&response, results.len()) {
        Some(order) => {
            let mut slots: Vec<Option<EnrichedResult>> = results.into_iter().map(Some).collect();
            order
                .into_iter()
                .filter_map(|index| slots[index].take())
                .take(top_k)
                .collect()
        }
        None => {
            warn!("Could not parse ranking response, keeping original order");
            results.truncate(top_k);
            results
        }
    }
}

fn build_rerank_prompt(query: &str, results: &[EnrichedResult], top_k: usize) -> String {
    let mut listing = String::new();
    for (index, result) in results.iter().enumerate() {
        let _ = write!(
            listing,
            "[{}] Title: {}\nDescription: {}\nSnippet: {}\nScore: {:.4}\n\n",
            index + 1,
            result.record.title,
            if result.record.description.is_empty() {
                "N/A"
            } else {
                &result.record.description
            },
            snippet(&result.record.body, RERANK_SNIPPET_CHARS),
            result.score
        );
    }

    format!(
        "You are a search result ranker. Given a user query and search results, re-rank the \
         results by relevance to the query.\n\n\
         User Query: \"{}\"\n\n\
         Search Results:\n{}\
         Respond with ONLY the numbers of the top {} most relevant results, most relevant \
         first, as a comma-separated list of numbers and nothing else.\n\n\
         Example response: 3, 1, 5, 2\n\n\
         Your response:",
        query,
        listing,
        top_k.min(results.len())
    )
}

/// Parse a comma-separated list of 1-based indices into 0-based positions.
/// Accepts optional surrounding brackets. Any non-integer token fails the
/// whole parse; out-of-range and duplicate indices are dropped. Returns
/// `None` when nothing usable remains.
#[inline]
pub fn parse_ranking(response: &str, total: usize) -> Option<Vec<usize>> {
    let trimmed = response.trim();
    let trimmed = trimmed.strip_prefix('[').unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix(']').unwrap_or(trimmed);

    let mut seen = HashSet::new();
    let mut order = Vec::new();

    for token in trimmed.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }

        let index: usize = token.parse().ok()?;
        if index == 0 || index > total {
            continue;
        }
        if seen.insert(index) {
            order.push(index - 1);
        }
    }

    if order.is_empty() { None } else { Some(order) }
}

/// Summarize the top results with respect to the query. Returns the fixed
/// fallback string when the model call fails.
#[inline]
pub async fn summarize(
    model: &dyn CompletionModel,
    query: &str,
    results: &[EnrichedResult],
) -> String {
    let mut context = String::new();
    for (index, result) in results.iter().take(SUMMARY_CONTEXT_RESULTS).enumerate() {
        let _ = write!(
            context,
            "[Source {}] {}\n{}\n\n",
            index + 1,
            result.record.title,
            snippet(&result.record.body, SUMMARY_SNIPPET_CHARS)
        );
    }

    let prompt = format!(
        "You are a helpful assistant that summarizes search results.\n\n\
         User Query: \"{}\"\n\n\
         Top Search Results:\n{}\
         Task: Provide a summary that answers the user's query based on the search results. \
         Be concise but informative. Mention which sources you're drawing from.\n\n\
         Summary:",
        query, context
    );

    match model.complete(&prompt).await {
        Ok(summary) => summary.trim().to_string(),
        Err(e) => {
            warn!("Summarization call failed: {}", e);
            SUMMARY_FALLBACK.to_string()
        }
    }
}

/// Answer a question grounded in the given results. Returns the fixed
/// fallback string when the model call fails; callers handle the empty
/// result set before getting here.
#[inline]
pub async fn answer(
    model: &dyn CompletionModel,
    question: &str,
    results: &[EnrichedResult],
) -> String {
    let context = results
        .iter()
        .take(ANSWER_CONTEXT_RESULTS)
        .map(|result| {
            format!(
                "[{}]\n{}",
                result.record.title,
                snippet(&result.record.body, ANSWER_SNIPPET_CHARS)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n---\n\n");

    let prompt = format!(
        "You are a helpful assistant that answers questions based on the user's saved \
         content.\n\n\
         User Question: \"{}\"\n\n\
         Relevant Content from the User's Archive:\n{}\n\n\
         Task: Answer the user's question based ONLY on the content provided above. If the \
         content doesn't contain enough information to answer the question, say so. Cite \
         which documents you're using.\n\n\
         Answer:",
        question, context
    );

    match model.complete(&prompt).await {
        Ok(answer) => answer.trim().to_string(),
        Err(e) => {
            warn!("Answer call failed: {}", e);
            ANSWER_FALLBACK.to_string()
        }
    }
}

/// Ask the model for up to `max_keywords` keywords as a strict JSON array.
/// Returns an empty list on any failure.
#[inline]
pub async fn extract_keywords(
    model: &dyn CompletionModel,
    text: &str,
    max_keywords: usize,
) -> Vec<String> {
    let prompt = format!(
        "Extract the {} most important keywords or key phrases from the following text. \
         Return ONLY a JSON array of strings.\n\n\
         Text:\n{}\n\n\
         Return format: [\"keyword1\", \"keyword2\", \"keyword3\"]\n\n\
         Your response:",
        max_keywords,
        snippet(text, KEYWORD_INPUT_CHARS)
    );

    let response = match model.complete(&prompt).await {
        Ok(response) => response,
        Err(e) => {
            warn!("Keyword extraction call failed: {}", e);
            return Vec::new();
        }
    };

    let mut keywords = parse_keyword_array(&response).unwrap_or_default();
    keywords.truncate(max_keywords);
    keywords
}

fn parse_keyword_array(response: &str) -> Option<Vec<String>> {
    let start = response.find('[')?;
    let end = response.rfind(']')?;
    let json = response.get(start..=end)?;
    serde_json::from_str(json).ok()
}

/// Pick one category from the fixed list for the given content. Anything
/// the model returns outside the list maps to "Other".
#[inline]
pub async fn categorize(
    model: &dyn CompletionModel,
    title: &str,
    description: &str,
    body: &str,
) -> String {
    let mut category_list = String::new();
    for category in CATEGORIES {
        let _ = writeln!(category_list, "- {}", category);
    }

    let prompt = format!(
        "Categorize the following content into ONE of these categories:\n{}\n\
         Title: {}\n\
         Description: {}\n\
         Content snippet: {}\n\n\
         Return ONLY the category name, nothing else.\n\n\
         Category:",
        category_list,
        title,
        description,
        snippet(body, CATEGORIZE_SNIPPET_CHARS)
    );

    let response = match model.complete(&prompt).await {
        Ok(response) => response,
        Err(e) => {
            warn!("Categorization call failed: {}", e);
            return FALLBACK_CATEGORY.to_string();
        }
    };

    let proposed = response.trim();
    CATEGORIES
        .iter()
        .find(|category| category.eq_ignore_ascii_case(proposed))
        .map_or_else(|| FALLBACK_CATEGORY.to_string(), |c| (*c).to_string())
}

/// Char-boundary-safe prefix, with an ellipsis when the text was cut
fn snippet(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let mut out: String = text.chars().take(max_chars).collect();
    out.push_str("...");
    out
}
