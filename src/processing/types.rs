//! Data carried through a single upload: the document, user-visible notices, and the report.

use serde::Serialize;
use sha2::{Digest, Sha256};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use uuid::Uuid;

use crate::extraction::ExtractionMethod;

/// Number of extracted characters echoed back for display.
pub const PREVIEW_CHARS: usize = 2000;

/// Raw PDF bytes received for one request.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    /// Identifier used to correlate logs for this upload.
    pub request_id: Uuid,
    /// Client-side file name, when one was supplied.
    pub file_name: Option<String>,
    /// Complete PDF content.
    pub bytes: Vec<u8>,
}

impl UploadedDocument {
    /// Wrap uploaded bytes, assigning a fresh request identifier.
    pub fn new(file_name: Option<String>, bytes: Vec<u8>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            file_name,
            bytes,
        }
    }

    /// Hex-encoded SHA-256 of the uploaded bytes.
    pub fn fingerprint(&self) -> String {
        hex::encode(Sha256::digest(&self.bytes))
    }
}

/// States of the processing flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Reading the PDF text layer.
    ExtractDirect,
    /// Running OCR because the text layer was empty.
    ExtractOcr,
    /// Summarizing the extracted text.
    Summarize,
    /// Terminal success: text and summary are ready for display.
    Display,
    /// Terminal failure: a user-visible error explains why.
    Failed,
}

/// Severity of a user-visible notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    /// Processing continues on a fallback path.
    Warning,
    /// A stage failed.
    Error,
}

/// One-line message shown inline in the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    /// Severity of the message.
    pub level: NoticeLevel,
    /// Human readable text.
    pub message: String,
}

impl Notice {
    /// Build a warning notice.
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    /// Build an error notice.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Everything the UI needs to render the outcome of an upload.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentReport {
    /// Identifier of the upload, matching the log span.
    pub request_id: String,
    /// Client-side file name, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// Hex SHA-256 of the uploaded bytes.
    pub document_sha256: String,
    /// Size of the upload in bytes.
    pub byte_count: usize,
    /// Terminal stage: `display` or `failed`.
    pub stage: PipelineStage,
    /// Extractor whose output was used, if any produced text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extraction_method: Option<ExtractionMethod>,
    /// First [`PREVIEW_CHARS`] characters of the extracted text.
    pub extracted_text_preview: String,
    /// Total number of extracted characters.
    pub extracted_chars: usize,
    /// Number of chunks sent to the model.
    pub chunk_count: usize,
    /// Final summary when the flow reached `display`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Warnings and errors in the order they occurred.
    pub notices: Vec<Notice>,
    /// RFC 3339 timestamp of when processing finished.
    pub processed_at: String,
}

impl DocumentReport {
    pub(crate) fn new(document: &UploadedDocument) -> Self {
        Self {
            request_id: document.request_id.to_string(),
            file_name: document.file_name.clone(),
            document_sha256: document.fingerprint(),
            byte_count: document.bytes.len(),
            stage: PipelineStage::ExtractDirect,
            extraction_method: None,
            extracted_text_preview: String::new(),
            extracted_chars: 0,
            chunk_count: 0,
            summary: None,
            notices: Vec::new(),
            processed_at: String::new(),
        }
    }

    pub(crate) fn record_text(&mut self, method: ExtractionMethod, text: &str) {
        self.extraction_method = Some(method);
        self.extracted_text_preview = text.chars().take(PREVIEW_CHARS).collect();
        self.extracted_chars = text.chars().count();
    }

    pub(crate) fn finish(&mut self, stage: PipelineStage) {
        self.stage = stage;
        self.processed_at = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_default();
    }

    /// Whether the flow ended in the display state.
    pub fn succeeded(&self) -> bool {
        self.stage == PipelineStage::Display
    }
}
