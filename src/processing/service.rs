//! Processing service sequencing extraction, OCR fallback, and chunked summarization.

use crate::{
    config::Config,
    extraction::{DirectExtractor, OcrExtractor, TextExtractor},
    metrics::{MetricsSnapshot, PipelineMetrics},
    processing::types::{DocumentReport, Notice, PipelineStage, UploadedDocument},
    summarization::{
        ChunkSettings, ChunkedSummarizer, SummarizationClientError, build_summarization_client,
    },
};
use async_trait::async_trait;
use std::sync::Arc;

/// Runs uploads through `ExtractDirect → ExtractOcr → Summarize → Display`.
///
/// The service owns the extractors, the summarizer wrapping the shared model client, and the
/// metrics registry. Construct it once near process start and share it through an `Arc`.
pub struct ProcessingService {
    direct: Box<dyn TextExtractor>,
    ocr: Box<dyn TextExtractor>,
    summarizer: ChunkedSummarizer,
    metrics: Arc<PipelineMetrics>,
}

/// Abstraction over the processing pipeline used by external surfaces (HTTP, CLI).
#[async_trait]
pub trait ProcessingApi: Send + Sync {
    /// Process one uploaded PDF; failures are reported inside the returned report.
    async fn summarize_document(&self, document: UploadedDocument) -> DocumentReport;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

impl ProcessingService {
    /// Assemble a service from explicit components.
    pub fn new(
        direct: Box<dyn TextExtractor>,
        ocr: Box<dyn TextExtractor>,
        summarizer: ChunkedSummarizer,
    ) -> Self {
        Self {
            direct,
            ocr,
            summarizer,
            metrics: Arc::new(PipelineMetrics::new()),
        }
    }

    /// Build the production service: `lopdf` extraction, Poppler/Tesseract OCR, and the
    /// configured summarization model.
    pub fn from_config(config: &Config) -> Result<Self, SummarizationClientError> {
        tracing::info!("Initializing summarization model client");
        let client = build_summarization_client(config)?;
        Ok(Self::new(
            Box::new(DirectExtractor::new()),
            Box::new(OcrExtractor::from_config(config)),
            ChunkedSummarizer::new(client, ChunkSettings::from_config(config)),
        ))
    }

    /// Run the full flow for one upload.
    #[tracing::instrument(
        name = "document",
        skip_all,
        fields(
            request_id = %document.request_id,
            file_name = document.file_name.as_deref().unwrap_or("<unnamed>"),
            bytes = document.bytes.len(),
        )
    )]
    pub async fn summarize_document(&self, document: UploadedDocument) -> DocumentReport {
        self.metrics.record_document();
        let mut report = DocumentReport::new(&document);
        let mut text = String::new();
        let mut stage = PipelineStage::ExtractDirect;

        loop {
            tracing::debug!(?stage, "Entering stage");
            stage = match stage {
                PipelineStage::ExtractDirect => {
                    text = self.run_extractor(&*self.direct, &document, &mut report).await;
                    if has_text(&text) {
                        report.record_text(self.direct.method(), &text);
                        PipelineStage::Summarize
                    } else {
                        report
                            .notices
                            .push(Notice::warning("No text found in PDF; attempting OCR."));
                        self.metrics.record_ocr_fallback();
                        PipelineStage::ExtractOcr
                    }
                }
                PipelineStage::ExtractOcr => {
                    text = self.run_extractor(&*self.ocr, &document, &mut report).await;
                    if has_text(&text) {
                        report.record_text(self.ocr.method(), &text);
                        PipelineStage::Summarize
                    } else {
                        report
                            .notices
                            .push(Notice::error("Failed to extract text from the PDF."));
                        self.metrics.record_extraction_failure();
                        PipelineStage::Failed
                    }
                }
                PipelineStage::Summarize => self.summarize(&text, &mut report).await,
                PipelineStage::Display | PipelineStage::Failed => break,
            };
        }

        report.finish(stage);
        tracing::info!(
            stage = ?report.stage,
            method = ?report.extraction_method,
            extracted_chars = report.extracted_chars,
            chunks = report.chunk_count,
            notices = report.notices.len(),
            "Document processed"
        );
        report
    }

    /// Run one extractor, downgrading any error to empty text plus a user-visible notice.
    async fn run_extractor(
        &self,
        extractor: &dyn TextExtractor,
        document: &UploadedDocument,
        report: &mut DocumentReport,
    ) -> String {
        let method = extractor.method();
        match extractor.extract(&document.bytes).await {
            Ok(text) => text,
            Err(error) => {
                tracing::warn!(?method, error = %error, "Extraction failed");
                report.notices.push(Notice::error(format!(
                    "{}: {error}",
                    method.failure_label()
                )));
                String::new()
            }
        }
    }

    async fn summarize(&self, text: &str, report: &mut DocumentReport) -> PipelineStage {
        let summary = match self.summarizer.summarize(text).await {
            Ok(summary) => Some(summary),
            Err(error) => {
                tracing::warn!(error = %error, "Summarization failed");
                report
                    .notices
                    .push(Notice::error(format!("Error during summarization: {error}")));
                None
            }
        };

        match summary {
            Some(summary) if !summary.text.trim().is_empty() => {
                self.metrics.record_summary(summary.chunk_count as u64);
                report.chunk_count = summary.chunk_count;
                report.summary = Some(summary.text);
                PipelineStage::Display
            }
            _ => {
                report.notices.push(Notice::error("Summarization failed."));
                self.metrics.record_summarization_failure();
                PipelineStage::Failed
            }
        }
    }

    /// Return the current pipeline metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

/// Whitespace-only output counts as "no text".
///
/// lopdf emits a newline for every `ET` operator, so a PDF whose only text objects are empty
/// still yields a string of line breaks from the text layer.
fn has_text(text: &str) -> bool {
    !text.trim().is_empty()
}

#[async_trait]
impl ProcessingApi for ProcessingService {
    async fn summarize_document(&self, document: UploadedDocument) -> DocumentReport {
        ProcessingService::summarize_document(self, document).await
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        ProcessingService::metrics_snapshot(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::{ExtractionError, ExtractionMethod};
    use crate::processing::types::{NoticeLevel, PREVIEW_CHARS};
    use crate::summarization::{SummarizationClient, SummarizationRequest};
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Behaviour {
        Text(&'static str),
        Owned(String),
        Fail,
    }

    struct StubExtractor {
        method: ExtractionMethod,
        behaviour: Behaviour,
        calls: Arc<AtomicUsize>,
    }

    impl StubExtractor {
        fn boxed(method: ExtractionMethod, behaviour: Behaviour) -> (Box<Self>, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Box::new(Self {
                    method,
                    behaviour,
                    calls: calls.clone(),
                }),
                calls,
            )
        }
    }

    #[async_trait]
    impl TextExtractor for StubExtractor {
        fn method(&self) -> ExtractionMethod {
            self.method
        }

        async fn extract(&self, _pdf: &[u8]) -> Result<String, ExtractionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.behaviour {
                Behaviour::Text(text) => Ok((*text).to_string()),
                Behaviour::Owned(text) => Ok(text.clone()),
                Behaviour::Fail => Err(ExtractionError::Pdf("broken xref".into())),
            }
        }
    }

    struct StubClient {
        fail: bool,
        empty: bool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SummarizationClient for StubClient {
        async fn generate_summary(
            &self,
            request: SummarizationRequest,
        ) -> Result<String, SummarizationClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(SummarizationClientError::GenerationFailed("model crashed".into()));
            }
            if self.empty {
                return Ok(String::new());
            }
            Ok(format!("summary of {} chars", request.text.chars().count()))
        }
    }

    fn client(fail: bool, empty: bool) -> Arc<StubClient> {
        Arc::new(StubClient {
            fail,
            empty,
            calls: AtomicUsize::new(0),
        })
    }

    fn service(
        direct: Box<StubExtractor>,
        ocr: Box<StubExtractor>,
        client: Arc<StubClient>,
    ) -> ProcessingService {
        ProcessingService::new(
            direct,
            ocr,
            ChunkedSummarizer::new(
                client,
                ChunkSettings {
                    chunk_size: 1024,
                    min_length: 30,
                    max_length: 150,
                },
            ),
        )
    }

    fn document() -> UploadedDocument {
        UploadedDocument::new(Some("report.pdf".into()), b"%PDF-1.7".to_vec())
    }

    #[tokio::test]
    async fn direct_text_skips_ocr() {
        let (direct, _) =
            StubExtractor::boxed(ExtractionMethod::Direct, Behaviour::Text("Hello World"));
        let (ocr, ocr_calls) =
            StubExtractor::boxed(ExtractionMethod::Ocr, Behaviour::Text("unused"));
        let service = service(direct, ocr, client(false, false));

        let report = service.summarize_document(document()).await;

        assert_eq!(report.stage, PipelineStage::Display);
        assert_eq!(report.extraction_method, Some(ExtractionMethod::Direct));
        assert_eq!(report.extracted_text_preview, "Hello World");
        assert_eq!(report.summary.as_deref(), Some("summary of 11 chars"));
        assert_eq!(report.chunk_count, 1);
        assert!(report.notices.is_empty());
        assert_eq!(ocr_calls.load(Ordering::SeqCst), 0);
        assert!(!report.processed_at.is_empty());
    }

    #[test]
    fn line_breaks_from_empty_text_objects_are_not_text() {
        assert!(!has_text(""));
        assert!(!has_text("\n\n \t"));
        assert!(has_text("\nHello\n"));
    }

    #[tokio::test]
    async fn empty_text_layer_falls_back_to_ocr() {
        let (direct, _) = StubExtractor::boxed(ExtractionMethod::Direct, Behaviour::Text("  \n"));
        let (ocr, ocr_calls) =
            StubExtractor::boxed(ExtractionMethod::Ocr, Behaviour::Text("Invoice #123"));
        let service = service(direct, ocr, client(false, false));

        let report = service.summarize_document(document()).await;

        assert_eq!(ocr_calls.load(Ordering::SeqCst), 1);
        assert_eq!(report.stage, PipelineStage::Display);
        assert_eq!(report.extraction_method, Some(ExtractionMethod::Ocr));
        assert_eq!(
            report.notices,
            vec![Notice::warning("No text found in PDF; attempting OCR.")]
        );
        assert_eq!(service.metrics_snapshot().ocr_fallbacks, 1);
    }

    #[tokio::test]
    async fn parse_error_is_reported_and_degrades_to_ocr() {
        let (direct, _) = StubExtractor::boxed(ExtractionMethod::Direct, Behaviour::Fail);
        let (ocr, _) = StubExtractor::boxed(ExtractionMethod::Ocr, Behaviour::Text("scanned"));
        let service = service(direct, ocr, client(false, false));

        let report = service.summarize_document(document()).await;

        assert_eq!(report.stage, PipelineStage::Display);
        assert_eq!(report.notices[0].level, NoticeLevel::Error);
        assert_eq!(
            report.notices[0].message,
            "Error reading PDF: invalid PDF: broken xref"
        );
        assert_eq!(report.notices[1].level, NoticeLevel::Warning);
    }

    #[tokio::test]
    async fn no_text_from_either_extractor_fails_without_summarizing() {
        let (direct, _) = StubExtractor::boxed(ExtractionMethod::Direct, Behaviour::Text(""));
        let (ocr, _) = StubExtractor::boxed(ExtractionMethod::Ocr, Behaviour::Fail);
        let model = client(false, false);
        let service = service(direct, ocr, model.clone());

        let report = service.summarize_document(document()).await;

        assert_eq!(report.stage, PipelineStage::Failed);
        assert_eq!(report.extraction_method, None);
        let messages: Vec<_> = report.notices.iter().map(|n| n.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "No text found in PDF; attempting OCR.",
                "Error during OCR: invalid PDF: broken xref",
                "Failed to extract text from the PDF.",
            ]
        );
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
        assert_eq!(service.metrics_snapshot().extraction_failures, 1);
    }

    #[tokio::test]
    async fn model_error_fails_but_keeps_extracted_text() {
        let (direct, _) = StubExtractor::boxed(ExtractionMethod::Direct, Behaviour::Text("Body"));
        let (ocr, _) = StubExtractor::boxed(ExtractionMethod::Ocr, Behaviour::Text("unused"));
        let service = service(direct, ocr, client(true, false));

        let report = service.summarize_document(document()).await;

        assert_eq!(report.stage, PipelineStage::Failed);
        assert_eq!(report.extracted_text_preview, "Body");
        assert!(report.summary.is_none());
        let messages: Vec<_> = report.notices.iter().map(|n| n.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "Error during summarization: Failed to generate summary: model crashed",
                "Summarization failed.",
            ]
        );
        assert_eq!(service.metrics_snapshot().summarization_failures, 1);
    }

    #[tokio::test]
    async fn empty_model_output_is_a_summarization_failure() {
        let (direct, _) = StubExtractor::boxed(ExtractionMethod::Direct, Behaviour::Text("Body"));
        let (ocr, _) = StubExtractor::boxed(ExtractionMethod::Ocr, Behaviour::Text("unused"));
        let service = service(direct, ocr, client(false, true));

        let report = service.summarize_document(document()).await;

        assert_eq!(report.stage, PipelineStage::Failed);
        assert_eq!(report.notices, vec![Notice::error("Summarization failed.")]);
    }

    #[tokio::test]
    async fn long_documents_are_previewed_and_chunked() {
        let body = "x".repeat(PREVIEW_CHARS * 2 + 5);
        let (direct, _) =
            StubExtractor::boxed(ExtractionMethod::Direct, Behaviour::Owned(body.clone()));
        let (ocr, _) = StubExtractor::boxed(ExtractionMethod::Ocr, Behaviour::Text("unused"));
        let model = client(false, false);
        let service = service(direct, ocr, model.clone());

        let report = service.summarize_document(document()).await;

        assert_eq!(report.extracted_text_preview.chars().count(), PREVIEW_CHARS);
        assert_eq!(report.extracted_chars, body.len());
        assert_eq!(report.chunk_count, body.len().div_ceil(1024));
        assert_eq!(model.calls.load(Ordering::SeqCst), report.chunk_count);
        assert_eq!(
            report.summary.as_deref().map(|s| s.matches("summary of").count()),
            Some(report.chunk_count)
        );
        assert_eq!(service.metrics_snapshot().chunks_summarized, report.chunk_count as u64);
    }
}
