//! Source document loading.
//!
//! [`FileLoader`] reads UTF-8 text files as they are and extracts the text
//! layer of PDF files (by `.pdf` extension) when the `pdf` feature is on.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::error::{RagError, Result};

/// Turns a manifest file locator into the document's extracted text.
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    /// Load the full text of the document at `locator`.
    async fn load(&self, locator: &str) -> Result<String>;
}

/// Reads text and PDF files, resolving relative locators against a base directory.
#[derive(Debug, Clone, Default)]
pub struct FileLoader {
    base_dir: PathBuf,
}

impl FileLoader {
    /// Resolve relative locators against `base_dir`.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self { base_dir: base_dir.into() }
    }

    fn resolve(&self, locator: &str) -> PathBuf {
        let path = Path::new(locator);
        if path.is_absolute() { path.to_path_buf() } else { self.base_dir.join(path) }
    }
}

#[async_trait]
impl DocumentLoader for FileLoader {
    async fn load(&self, locator: &str) -> Result<String> {
        let path = self.resolve(locator);
        let bytes = tokio::fs::read(&path).await.map_err(|e| RagError::LoadError {
            locator: locator.to_string(),
            message: format!("{}: {e}", path.display()),
        })?;
        let text = if is_pdf(&path) {
            extract_pdf_text(locator, bytes).await?
        } else {
            String::from_utf8(bytes).map_err(|e| RagError::LoadError {
                locator: locator.to_string(),
                message: format!("not valid UTF-8 text: {e}"),
            })?
        };
        debug!(locator, chars = text.chars().count(), "loaded document");
        Ok(text)
    }
}

fn is_pdf(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

#[cfg(feature = "pdf")]
async fn extract_pdf_text(locator: &str, bytes: Vec<u8>) -> Result<String> {
    let to_error = |message: String| RagError::LoadError { locator: locator.to_string(), message };

    // The parser is CPU-bound and panics on some malformed files.
    let extracted = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|e| to_error(format!("PDF extraction aborted: {e}")))?;
    extracted.map_err(|e| to_error(format!("not a readable PDF: {e}")))
}

#[cfg(not(feature = "pdf"))]
async fn extract_pdf_text(locator: &str, _bytes: Vec<u8>) -> Result<String> {
    Err(RagError::LoadError {
        locator: locator.to_string(),
        message: "PDF support is disabled (enable the `pdf` feature)".to_string(),
    })
}
