// Embedding Provider adapter layer
// The pipeline depends on the `Embedder` trait; the Ollama client below is
// the production implementation

pub mod ollama;

use async_trait::async_trait;

use crate::Result;

/// Maps text to a fixed-length dense vector. Implementations own their
/// timeout and retry policy; the search pipeline calls each stage exactly
/// once per request.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Build the denormalized text that gets embedded and stored alongside a
/// record's vector entry. Empty parts are skipped so sparse records still
/// produce meaningful embeddings.
#[inline]
pub fn searchable_text(
    title: &str,
    description: &str,
    body: &str,
    url: &str,
    keywords: &[String],
) -> String {
    let joined_keywords = keywords.join(" ");
    let parts = [title, description, body, joined_keywords.as_str(), url];

    parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn searchable_text_joins_non_empty_parts() {
        let text = searchable_text(
            "Classic Burger Recipe",
            "",
            "Grill the patty for four minutes per side.",
            "https://example.com/burger",
            &["cooking".to_string(), "beef".to_string()],
        );

        assert_eq!(
            text,
            "Classic Burger Recipe Grill the patty for four minutes per side. cooking beef https://example.com/burger"
        );
    }

    #[test]
    fn searchable_text_of_empty_record_is_empty() {
        assert_eq!(searchable_text("", "  ", "", "", &[]), "");
    }
}
