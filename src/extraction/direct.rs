use async_trait::async_trait;
use lopdf::Document;

use super::{ExtractionError, ExtractionMethod, TextExtractor};

/// Extracts the native text layer of a PDF with `lopdf`.
///
/// Parsing is CPU-bound, so it runs on Tokio's blocking pool. A panic inside the parser surfaces
/// as [`ExtractionError::Worker`] instead of tearing down the request.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectExtractor;

impl DirectExtractor {
    /// Construct a new direct extractor.
    pub const fn new() -> Self {
        Self
    }

    /// Synchronously extract text from every page, in page order.
    pub fn extract_pages(pdf: &[u8]) -> Result<String, ExtractionError> {
        let document =
            Document::load_mem(pdf).map_err(|error| ExtractionError::Pdf(error.to_string()))?;

        let pages = document.get_pages();
        let mut text = String::new();
        for &page_number in pages.keys() {
            let page_text = document.extract_text(&[page_number]).map_err(|error| {
                ExtractionError::Pdf(format!("page {page_number}: {error}"))
            })?;
            tracing::trace!(
                page = page_number,
                chars = page_text.chars().count(),
                "Extracted page text"
            );
            text.push_str(&page_text);
        }

        tracing::debug!(
            pages = pages.len(),
            chars = text.chars().count(),
            "Direct extraction finished"
        );
        Ok(text)
    }
}

#[async_trait]
impl TextExtractor for DirectExtractor {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::Direct
    }

    async fn extract(&self, pdf: &[u8]) -> Result<String, ExtractionError> {
        let owned = pdf.to_vec();
        tokio::task::spawn_blocking(move || Self::extract_pages(&owned))
            .await
            .map_err(|error| ExtractionError::Worker(error.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn corrupted_bytes_are_reported_as_errors() {
        let error = DirectExtractor::new()
            .extract(b"%PDF-1.4\nthis is not really a pdf")
            .await
            .expect_err("corrupted input");
        assert!(matches!(
            error,
            ExtractionError::Pdf(_) | ExtractionError::Worker(_)
        ));
    }

    #[tokio::test]
    async fn empty_upload_fails_without_panicking() {
        let error = DirectExtractor::new()
            .extract(&[])
            .await
            .expect_err("empty input");
        assert!(error.to_string().starts_with("invalid PDF"));
    }
}
