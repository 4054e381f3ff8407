// Language Model adapter layer
// Optional collaborator: re-ranking, summaries, and question answering
// degrade gracefully when no completion endpoint is configured

pub mod ollama;

use async_trait::async_trait;

use crate::Result;

/// Stateless text-completion service. One prompt in, one completion out;
/// callers treat every invocation as best-effort and independent.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}
