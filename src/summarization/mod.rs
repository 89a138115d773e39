//! Abstractions for generating abstractive summaries with a pretrained model.
//!
//! The model handle is built once at process start by [`build_summarization_client`] and then
//! shared, read-only, by every request through the [`ChunkedSummarizer`]. Two HTTP backends are
//! available: a Hugging Face style inference endpoint serving a seq2seq model such as
//! `facebook/bart-large-cnn`, and a local Ollama runtime. Both decode deterministically.

mod chunked;
mod huggingface;
mod ollama;

pub use chunked::{ChunkSettings, ChunkedSummarizer, ChunkedSummary, split_into_chunks};
pub use huggingface::HuggingFaceClient;
pub use ollama::OllamaSummarizationClient;

use crate::config::{Config, SummarizationProvider};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced while attempting abstractive summarization.
#[derive(Debug, Error)]
pub enum SummarizationClientError {
    /// Provider was unreachable, missing the model, or could not be constructed.
    #[error("Summarization provider unavailable: {0}")]
    ProviderUnavailable(String),
    /// Provider returned an error response.
    #[error("Failed to generate summary: {0}")]
    GenerationFailed(String),
    /// Provider response could not be parsed.
    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),
}

/// Request payload for summarizing a single chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummarizationRequest {
    /// Text to condense.
    pub text: String,
    /// Lower bound on the summary length, in model units.
    pub min_length: usize,
    /// Upper bound on the summary length, in model units.
    pub max_length: usize,
}

/// Interface implemented by abstractive summarization providers.
///
/// Implementations must not sample: identical requests against the same model version yield
/// identical summaries.
#[async_trait]
pub trait SummarizationClient: Send + Sync {
    /// Generate a summary of `request.text`.
    async fn generate_summary(
        &self,
        request: SummarizationRequest,
    ) -> Result<String, SummarizationClientError>;
}

/// Build the summarization client selected by configuration.
pub fn build_summarization_client(
    config: &Config,
) -> Result<Arc<dyn SummarizationClient>, SummarizationClientError> {
    let client: Arc<dyn SummarizationClient> = match config.summarization_provider {
        SummarizationProvider::HuggingFace => Arc::new(HuggingFaceClient::new(
            config.summarization_url.clone(),
            config.summarization_model.clone(),
            config.summarization_api_token.clone(),
        )?),
        SummarizationProvider::Ollama => Arc::new(OllamaSummarizationClient::new(
            config.summarization_url.clone(),
            config.summarization_model.clone(),
        )?),
    };
    tracing::info!(
        provider = ?config.summarization_provider,
        model = %config.summarization_model,
        "Summarization model client ready"
    );
    Ok(client)
}

pub(crate) fn http_client(agent: &str) -> Result<reqwest::Client, SummarizationClientError> {
    reqwest::Client::builder()
        .user_agent(agent)
        .build()
        .map_err(|error| {
            SummarizationClientError::ProviderUnavailable(format!(
                "failed to construct HTTP client: {error}"
            ))
        })
}
