//! Text extraction from uploaded PDF bytes.
//!
//! Two extractors share the [`TextExtractor`] seam:
//!
//! - [`DirectExtractor`] reads the embedded text layer page by page with `lopdf`.
//! - [`OcrExtractor`] rasterizes each page with `pdftoppm` and runs `tesseract` on the images.
//!
//! Both return an explicit `Result`; deciding whether an error ends the request or degrades to
//! "no text" is left to the processing service.

mod direct;
mod ocr;

pub use direct::DirectExtractor;
pub use ocr::OcrExtractor;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Errors raised while turning PDF bytes into text.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The PDF could not be parsed or a page's content stream was unreadable.
    #[error("invalid PDF: {0}")]
    Pdf(String),
    /// Rasterization or recognition failed.
    #[error("OCR failed: {0}")]
    Ocr(String),
    /// Scratch files for the OCR tools could not be written.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The blocking worker running the parser died (for example by panicking).
    #[error("extraction worker failed: {0}")]
    Worker(String),
}

/// Which extractor produced the text shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMethod {
    /// Native text layer of the PDF.
    Direct,
    /// Optical character recognition over rasterized pages.
    Ocr,
}

impl ExtractionMethod {
    /// Prefix of the user-visible message reported when this extractor fails.
    pub fn failure_label(self) -> &'static str {
        match self {
            Self::Direct => "Error reading PDF",
            Self::Ocr => "Error during OCR",
        }
    }
}

/// Interface implemented by PDF text extractors.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Strategy implemented by this extractor.
    fn method(&self) -> ExtractionMethod;

    /// Extract the text of every page, in page order, from raw PDF bytes.
    ///
    /// An `Ok` result may be empty when the document carries no recognizable text.
    async fn extract(&self, pdf: &[u8]) -> Result<String, ExtractionError>;
}
