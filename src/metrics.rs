use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing pipeline activity.
#[derive(Default)]
pub struct PipelineMetrics {
    documents_processed: AtomicU64,
    ocr_fallbacks: AtomicU64,
    extraction_failures: AtomicU64,
    chunks_summarized: AtomicU64,
    summarization_failures: AtomicU64,
    summaries_displayed: AtomicU64,
}

impl PipelineMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an uploaded document entering the pipeline.
    pub fn record_document(&self) {
        self.documents_processed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record that direct extraction came back empty and OCR ran.
    pub fn record_ocr_fallback(&self) {
        self.ocr_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a document for which neither extractor produced text.
    pub fn record_extraction_failure(&self) {
        self.extraction_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a completed summary and the number of chunks it took.
    pub fn record_summary(&self, chunk_count: u64) {
        self.summaries_displayed.fetch_add(1, Ordering::Relaxed);
        self.chunks_summarized
            .fetch_add(chunk_count, Ordering::Relaxed);
    }

    /// Record a document whose summarization produced nothing.
    pub fn record_summarization_failure(&self) {
        self.summarization_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            documents_processed: self.documents_processed.load(Ordering::Relaxed),
            ocr_fallbacks: self.ocr_fallbacks.load(Ordering::Relaxed),
            extraction_failures: self.extraction_failures.load(Ordering::Relaxed),
            chunks_summarized: self.chunks_summarized.load(Ordering::Relaxed),
            summarization_failures: self.summarization_failures.load(Ordering::Relaxed),
            summaries_displayed: self.summaries_displayed.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of pipeline counters used for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Documents received since startup.
    pub documents_processed: u64,
    /// Documents that needed the OCR fallback.
    pub ocr_fallbacks: u64,
    /// Documents where no extractor produced text.
    pub extraction_failures: u64,
    /// Chunks sent through the model across all successful summaries.
    pub chunks_summarized: u64,
    /// Documents whose summarization came back empty.
    pub summarization_failures: u64,
    /// Documents that reached the display state.
    pub summaries_displayed: u64,
}
