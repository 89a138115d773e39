//! Document processing pipeline: extraction, OCR fallback, and chunked summarization.

mod service;
pub mod types;

pub use service::{ProcessingApi, ProcessingService};
pub use types::{
    DocumentReport, Notice, NoticeLevel, PREVIEW_CHARS, PipelineStage, UploadedDocument,
};
