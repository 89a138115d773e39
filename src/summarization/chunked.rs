use std::sync::Arc;

use super::{SummarizationClient, SummarizationClientError, SummarizationRequest};
use crate::config::Config;

/// Chunking and length bounds applied to every summarization call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSettings {
    /// Characters per chunk.
    pub chunk_size: usize,
    /// Minimum summary length per chunk.
    pub min_length: usize,
    /// Maximum summary length per chunk.
    pub max_length: usize,
}

impl ChunkSettings {
    /// Read the chunking settings from the runtime configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            chunk_size: config.summary_chunk_size,
            min_length: config.summary_min_length,
            max_length: config.summary_max_length,
        }
    }
}

/// Final summary together with the number of chunks it was assembled from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkedSummary {
    /// Chunk summaries joined by a single space, in chunk order.
    pub text: String,
    /// Number of model calls made.
    pub chunk_count: usize,
}

/// Summarizes arbitrarily long text by summarizing fixed-size chunks one after another.
pub struct ChunkedSummarizer {
    client: Arc<dyn SummarizationClient>,
    settings: ChunkSettings,
}

impl ChunkedSummarizer {
    /// Wrap a shared model client with the given chunk settings.
    pub fn new(client: Arc<dyn SummarizationClient>, settings: ChunkSettings) -> Self {
        Self { client, settings }
    }

    /// Settings used for every call.
    pub fn settings(&self) -> ChunkSettings {
        self.settings
    }

    /// Summarize `text` chunk by chunk.
    ///
    /// Empty input returns an empty summary without calling the model. The first model error
    /// aborts the whole summary.
    pub async fn summarize(&self, text: &str) -> Result<ChunkedSummary, SummarizationClientError> {
        let chunks = split_into_chunks(text, self.settings.chunk_size);
        let mut summaries = Vec::with_capacity(chunks.len());

        for (index, chunk) in chunks.iter().enumerate() {
            let summary = self
                .client
                .generate_summary(SummarizationRequest {
                    text: (*chunk).to_string(),
                    min_length: self.settings.min_length,
                    max_length: self.settings.max_length,
                })
                .await?;
            tracing::debug!(
                chunk = index + 1,
                total = chunks.len(),
                input_chars = chunk.chars().count(),
                summary_chars = summary.chars().count(),
                "Summarized chunk"
            );
            summaries.push(summary);
        }

        Ok(ChunkedSummary {
            text: summaries.join(" "),
            chunk_count: chunks.len(),
        })
    }
}

/// Split `text` into consecutive slices of `chunk_size` characters.
///
/// Boundaries ignore words and sentences; only the last slice may be shorter. A `chunk_size` of
/// zero is treated as one.
pub fn split_into_chunks(text: &str, chunk_size: usize) -> Vec<&str> {
    let size = chunk_size.max(1);
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut count = 0;

    for (offset, _) in text.char_indices() {
        if count == size {
            chunks.push(&text[start..offset]);
            start = offset;
            count = 0;
        }
        count += 1;
    }
    if start < text.len() {
        chunks.push(&text[start..]);
    }
    chunks
}
