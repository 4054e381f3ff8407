
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use super::CompletionModel;
use crate::config::LlmConfig;
use crate::{RecallError, Result};

const DEFAULT_TIMEOUT_SECONDS: u64 = 60;

/// HTTP client for the Ollama text-completion endpoint
#[derive(Debug, Clone)]
pub struct OllamaGenerator {
    base_url: Url,
    model: String,
    agent: ureq::Agent,
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

impl OllamaGenerator {
    #[inline]
    pub fn new(config: &LlmConfig) -> anyhow::Result<Self> {
        let base_url = config.url()?;

        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS)))
            .build()
            .into();

        Ok(Self {
            base_url,
            model: config.model.clone(),
            agent,
        })
    }

    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        self
    }

    /// Ping the completion endpoint to check if it's responsive
    #[inline]
    pub fn ping(&self) -> anyhow::Result<()> {
        let url = self.base_url.join("/api/tags")?;

        self.agent
            .get(url.as_str())
            .call()
            .map_err(|e| anyhow::anyhow!("Failed to ping completion endpoint: {}", e))?;

        Ok(())
    }

    /// Run a single completion request (blocking). No retries: the stages
    /// built on this client are best-effort and call once per request.
    #[inline]
    pub fn complete_blocking(&self, prompt: &str) -> Result<String> {
        debug!(
            "Requesting completion (prompt length: {} chars)",
            prompt.len()
        );

        let request = GenerateRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
        };

        let url = self.base_url.join("/api/generate").map_err(|e| {
            RecallError::LanguageModel(format!("Failed to build completion URL: {}", e))
        })?;

        let request_json = serde_json::to_string(&request).map_err(|e| {
            RecallError::LanguageModel(format!("Failed to serialize completion request: {}", e))
        })?;

        let response_text = self
            .agent
            .post(url.as_str())
            .header("Content-Type", "application/json")
            .send(&request_json)
            .and_then(|mut resp| resp.body_mut().read_to_string())
            .map_err(|e| match e {
                ureq::Error::Timeout(_) => {
                    warn!("Completion request timed out");
                    RecallError::Timeout(format!("completion request to {}", self.base_url))
                }
                other => RecallError::LanguageModel(format!("Completion request failed: {}", other)),
            })?;

        let generate_response: GenerateResponse =
            serde_json::from_str(&response_text).map_err(|e| {
                RecallError::LanguageModel(format!("Failed to parse completion response: {}", e))
            })?;

        Ok(generate_response.response)
    }
}

#[async_trait]
impl CompletionModel for OllamaGenerator {
    #[inline]
    async fn complete(&self, prompt: &str) -> Result<String> {
        let client = self.clone();
        let prompt = prompt.to_string();

        tokio::task::spawn_blocking(move || client.complete_blocking(&prompt))
            .await
            .map_err(|e| RecallError::LanguageModel(format!("Completion task panicked: {}", e)))?
    }
}
