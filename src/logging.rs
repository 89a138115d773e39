//! Tracing configuration and log routing.
//!
//! Every upload runs inside a span carrying its request id, while the browser only ever sees the
//! short user-facing notices. The log file keeps the full error chain (lopdf parse errors,
//! Poppler/Tesseract stderr, model HTTP statuses) for a given request after the page is closed.
//! Output goes to stdout through a compact formatter and is appended to `PDFSUM_LOG_FILE`,
//! or `logs/pdfsum.log` when that variable is unset.
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const LOG_FILE_ENV: &str = "PDFSUM_LOG_FILE";
const DEFAULT_LOG_FILE: &str = "logs/pdfsum.log";

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Configure tracing for stdout and the pdfsum log file.
///
/// `RUST_LOG` controls filtering (default `info`). When the log file cannot be opened the
/// subscriber falls back to stdout only. Later calls leave the first subscriber in place.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_layer = fmt::layer().with_target(false).compact();
    let file_layer = open_log_writer(&log_file_path(std::env::var(LOG_FILE_ENV).ok())).map(
        |writer| {
            fmt::layer()
                .with_writer(writer)
                .with_target(true)
                .with_ansi(false)
                .compact()
        },
    );

    let result = tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init();

    if let Err(err) = result {
        eprintln!("Tracing already initialized: {err}");
    }
}

/// Resolve the log file from the `PDFSUM_LOG_FILE` value, ignoring blank overrides.
fn log_file_path(configured: Option<String>) -> PathBuf {
    configured
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .map_or_else(|| PathBuf::from(DEFAULT_LOG_FILE), PathBuf::from)
}

/// Open `path` for appending behind a non-blocking writer, creating parent directories.
fn open_log_writer(path: &Path) -> Option<NonBlocking> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        if let Err(err) = fs::create_dir_all(parent) {
            eprintln!("Failed to create log directory {}: {err}", parent.display());
            return None;
        }
    }

    match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(file);
            let _ = LOG_GUARD.set(guard);
            Some(non_blocking)
        }
        Err(err) => {
            eprintln!("Failed to open log file {}: {err}", path.display());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_path_defaults_when_unset_or_blank() {
        assert_eq!(log_file_path(None), PathBuf::from(DEFAULT_LOG_FILE));
        assert_eq!(log_file_path(Some("  ".into())), PathBuf::from(DEFAULT_LOG_FILE));
        assert_eq!(
            log_file_path(Some(" /var/log/pdfsum.log ".into())),
            PathBuf::from("/var/log/pdfsum.log")
        );
    }

    #[test]
    fn log_writer_creates_missing_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("pdfsum.log");

        assert!(open_log_writer(&path).is_some());
        assert!(path.exists());
    }
}
