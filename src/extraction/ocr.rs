use std::path::{Path, PathBuf};
use std::process::Output;

use async_trait::async_trait;
use tokio::process::Command;

use super::{ExtractionError, ExtractionMethod, TextExtractor};
use crate::config::Config;

const PAGE_PREFIX: &str = "page";

/// OCR fallback built on the Poppler and Tesseract command-line tools.
///
/// The PDF is written to a scratch directory, `pdftoppm` renders one PNG per page, and
/// `tesseract` recognizes each image in page order. The scratch directory is removed when the
/// extraction returns.
#[derive(Debug, Clone)]
pub struct OcrExtractor {
    pdftoppm_bin: String,
    tesseract_bin: String,
    language: String,
    dpi: Option<u32>,
}

impl OcrExtractor {
    /// Construct an extractor from explicit tool paths and settings.
    pub fn new(
        pdftoppm_bin: impl Into<String>,
        tesseract_bin: impl Into<String>,
        language: impl Into<String>,
        dpi: Option<u32>,
    ) -> Self {
        Self {
            pdftoppm_bin: pdftoppm_bin.into(),
            tesseract_bin: tesseract_bin.into(),
            language: language.into(),
            dpi,
        }
    }

    /// Construct an extractor using the OCR settings from the runtime configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.pdftoppm_bin.clone(),
            config.tesseract_bin.clone(),
            config.ocr_language.clone(),
            config.ocr_dpi,
        )
    }

    async fn rasterize(
        &self,
        input: &Path,
        scratch: &Path,
    ) -> Result<Vec<PathBuf>, ExtractionError> {
        let mut command = Command::new(&self.pdftoppm_bin);
        command.kill_on_drop(true).arg("-png");
        if let Some(dpi) = self.dpi {
            command.arg("-r").arg(dpi.to_string());
        }
        command.arg(input).arg(scratch.join(PAGE_PREFIX));

        let output = command.output().await.map_err(|error| {
            ExtractionError::Ocr(format!("failed to start {}: {error}", self.pdftoppm_bin))
        })?;
        ensure_success(&self.pdftoppm_bin, &output)?;

        let pages = collect_page_images(scratch)?;
        if pages.is_empty() {
            return Err(ExtractionError::Ocr(format!(
                "{} produced no page images",
                self.pdftoppm_bin
            )));
        }
        tracing::debug!(pages = pages.len(), dpi = ?self.dpi, "Rasterized PDF pages");
        Ok(pages)
    }

    async fn recognize(&self, image: &Path) -> Result<String, ExtractionError> {
        let output = Command::new(&self.tesseract_bin)
            .arg(image)
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|error| {
                ExtractionError::Ocr(format!("failed to start {}: {error}", self.tesseract_bin))
            })?;
        ensure_success(&self.tesseract_bin, &output)?;

        String::from_utf8(output.stdout).map_err(|error| {
            ExtractionError::Ocr(format!(
                "{} returned non UTF-8 text: {error}",
                self.tesseract_bin
            ))
        })
    }
}

#[async_trait]
impl TextExtractor for OcrExtractor {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::Ocr
    }

    async fn extract(&self, pdf: &[u8]) -> Result<String, ExtractionError> {
        let scratch = tempfile::Builder::new().prefix("pdfsum-ocr-").tempdir()?;
        let input = scratch.path().join("input.pdf");
        tokio::fs::write(&input, pdf).await?;

        let pages = self.rasterize(&input, scratch.path()).await?;
        let mut text = String::new();
        for (index, image) in pages.iter().enumerate() {
            let page_text = self.recognize(image).await?;
            tracing::trace!(
                page = index + 1,
                chars = page_text.chars().count(),
                "Recognized page text"
            );
            text.push_str(&page_text);
        }

        tracing::debug!(
            pages = pages.len(),
            chars = text.chars().count(),
            language = %self.language,
            "OCR extraction finished"
        );
        Ok(text)
    }
}

fn ensure_success(program: &str, output: &Output) -> Result<(), ExtractionError> {
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    Err(ExtractionError::Ocr(format!(
        "{program} exited with {}: {}",
        output.status,
        single_line(&stderr)
    )))
}

fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// List rendered page images in page order.
///
/// `pdftoppm` names its output `page-N.png`, zero-padding `N` to the width of the page count.
fn collect_page_images(dir: &Path) -> Result<Vec<PathBuf>, ExtractionError> {
    let mut pages = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        if let Some(number) = page_number(name) {
            pages.push((number, path));
        }
    }
    pages.sort_by_key(|(number, _)| *number);
    Ok(pages.into_iter().map(|(_, path)| path).collect())
}

fn page_number(file_name: &str) -> Option<u32> {
    file_name
        .strip_prefix(PAGE_PREFIX)?
        .strip_prefix('-')?
        .strip_suffix(".png")?
        .parse()
        .ok()
}
