//! HTTP surface for pdfsum.
//!
//! - `GET /` – Browser page with the PDF upload form, busy indicator, and result blocks.
//! - `POST /api/summarize` – Multipart upload (`file` field) processed through the pipeline.
//!   Returns the document report for both successful and failed runs; pipeline failures are
//!   described by `stage` and `notices`, not by the HTTP status.
//! - `GET /metrics` – Pipeline counters.
//! - `GET /commands` – Machine-readable command catalog.
//!
//! Upload size is not limited by the service.

use crate::processing::{DocumentReport, ProcessingApi, UploadedDocument};
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State, multipart::MultipartError},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

const INDEX_HTML: &str = include_str!("ui/index.html");
const UPLOAD_FIELD: &str = "file";

/// Build the HTTP router exposing the upload page and API.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: ProcessingApi + 'static,
{
    Router::new()
        .route("/", get(index_page))
        .route("/api/summarize", post(summarize_upload::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .route("/commands", get(get_commands))
        .layer(DefaultBodyLimit::disable())
        .with_state(service)
}

async fn index_page() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Accept a PDF upload and run it through extraction and summarization.
async fn summarize_upload<S>(
    State(service): State<Arc<S>>,
    mut multipart: Multipart,
) -> Result<Json<DocumentReport>, AppError>
where
    S: ProcessingApi,
{
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        if !is_pdf_upload(file_name.as_deref(), content_type.as_deref()) {
            return Err(AppError::UnsupportedMediaType {
                file_name,
                content_type,
            });
        }

        let bytes = field.bytes().await?;
        tracing::info!(
            file_name = file_name.as_deref().unwrap_or("<unnamed>"),
            bytes = bytes.len(),
            "Upload received"
        );
        let report = service
            .summarize_document(UploadedDocument::new(file_name, bytes.to_vec()))
            .await;
        return Ok(Json(report));
    }

    Err(AppError::MissingFile)
}

/// Uploads are accepted by `.pdf` extension or `application/pdf` content type.
fn is_pdf_upload(file_name: Option<&str>, content_type: Option<&str>) -> bool {
    let by_name = file_name
        .map(|name| name.to_ascii_lowercase().ends_with(".pdf"))
        .unwrap_or(false);
    let by_type = content_type
        .map(|value| value.trim().eq_ignore_ascii_case("application/pdf"))
        .unwrap_or(false);
    by_name || by_type
}

/// Return the pipeline counters.
async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<crate::metrics::MetricsSnapshot>
where
    S: ProcessingApi,
{
    Json(service.metrics_snapshot())
}

/// Descriptor for a single command in the discovery catalog.
#[derive(Serialize)]
struct CommandDescriptor {
    name: &'static str,
    method: &'static str,
    path: &'static str,
    description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    content_type: Option<&'static str>,
}

/// Response body for `GET /commands`.
#[derive(Serialize)]
struct CommandsResponse {
    commands: Vec<CommandDescriptor>,
}

/// Enumerate supported HTTP commands for discovery by tools.
async fn get_commands() -> Json<CommandsResponse> {
    Json(CommandsResponse {
        commands: vec![
            CommandDescriptor {
                name: "upload_page",
                method: "GET",
                path: "/",
                description: "Browser page for uploading a PDF and reading its summary.",
                content_type: None,
            },
            CommandDescriptor {
                name: "summarize",
                method: "POST",
                path: "/api/summarize",
                description: "Upload a PDF in the `file` field; extracts text (OCR fallback) and \
                              returns the extracted text preview, summary, and notices.",
                content_type: Some("multipart/form-data"),
            },
            CommandDescriptor {
                name: "metrics",
                method: "GET",
                path: "/metrics",
                description: "Return pipeline counters \
                              (documents, OCR fallbacks, chunks, failures).",
                content_type: None,
            },
        ],
    })
}

/// Request-level failures; pipeline failures travel inside [`DocumentReport`] instead.
#[derive(Debug)]
enum AppError {
    MissingFile,
    UnsupportedMediaType {
        file_name: Option<String>,
        content_type: Option<String>,
    },
    Multipart(MultipartError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::MissingFile => (
                StatusCode::BAD_REQUEST,
                format!("multipart body must contain a `{UPLOAD_FIELD}` field"),
            ),
            Self::UnsupportedMediaType {
                file_name,
                content_type,
            } => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                format!(
                    "only PDF uploads are accepted (file name: {}, content type: {})",
                    file_name.as_deref().unwrap_or("none"),
                    content_type.as_deref().unwrap_or("none")
                ),
            ),
            Self::Multipart(error) => (error.status(), error.body_text()),
        };
        tracing::warn!(status = %status, error = %message, "Rejected upload");
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<MultipartError> for AppError {
    fn from(inner: MultipartError) -> Self {
        Self::Multipart(inner)
    }
}
