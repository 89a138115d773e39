#![deny(missing_docs)]

//! Core library for the pdfsum PDF summarizer.

/// HTTP routing, upload handling, and the browser page.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// PDF text extraction (text layer and OCR).
pub mod extraction;
/// Structured logging and tracing setup.
pub mod logging;
/// Pipeline metrics helpers.
pub mod metrics;
/// Upload processing flow.
pub mod processing;
/// Summarization model clients and chunked summarization.
pub mod summarization;
