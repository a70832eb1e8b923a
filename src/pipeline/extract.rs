//! PDF text extraction via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! pdfium is a C++ library and every call blocks. [`extract_text`] moves the
//! work onto Tokio's blocking pool so request handlers never stall a worker
//! thread. A `Pdfium` handle cannot cross threads, so [`PdfiumTextReader`]
//! keeps only the resolved library path and binds pdfium per extraction,
//! inside the blocking task.

use super::fetch::StagedPdf;
use crate::error::{ClassifierError, ExtractionError};
use pdfium_auto::PdfiumLocator;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Reads the full text of a PDF file, pages in order.
///
/// Implementations are shared by every in-flight request.
pub trait PdfTextReader: Send + Sync {
    fn read_text(&self, path: &Path) -> Result<String, ExtractionError>;
}

/// [`PdfTextReader`] backed by the pdfium shared library at a fixed path.
#[derive(Debug, Clone)]
pub struct PdfiumTextReader {
    library: PathBuf,
}

impl PdfiumTextReader {
    pub fn new(library: impl Into<PathBuf>) -> Self {
        Self {
            library: library.into(),
        }
    }

    /// Resolve pdfium through `locator`, downloading the library if it is not
    /// cached, and check once that it binds.
    pub fn bind(locator: &PdfiumLocator) -> Result<Self, ClassifierError> {
        let library = locator
            .ensure(None)
            .map_err(|e| ClassifierError::PdfiumBindingFailed(e.to_string()))?;
        pdfium_auto::bind_pdfium_from_path(&library)
            .map_err(|e| ClassifierError::PdfiumBindingFailed(e.to_string()))?;
        Ok(Self::new(library))
    }

    pub fn library_path(&self) -> &Path {
        &self.library
    }
}

impl PdfTextReader for PdfiumTextReader {
    fn read_text(&self, path: &Path) -> Result<String, ExtractionError> {
        let pdfium = pdfium_auto::bind_pdfium_from_path(&self.library).map_err(|e| {
            ExtractionError::Internal {
                detail: e.to_string(),
            }
        })?;
        let document = pdfium.load_pdf_from_file(path, None).map_err(|e| {
            let detail = format!("{e:?}");
            if detail.contains("Password") || detail.contains("password") {
                ExtractionError::PasswordRequired
            } else {
                ExtractionError::CorruptPdf { detail }
            }
        })?;

        let pages = document.pages();
        let mut page_texts = Vec::with_capacity(pages.len() as usize);
        for (idx, page) in pages.iter().enumerate() {
            let text = page.text().map_err(|e| ExtractionError::CorruptPdf {
                detail: format!("page {}: {e:?}", idx + 1),
            })?;
            page_texts.push(text.all());
        }
        debug!("Read {} pages from {}", page_texts.len(), path.display());

        Ok(page_texts.join("\n"))
    }
}

/// Run `reader` over a staged PDF on the blocking thread pool.
pub async fn extract_text(
    reader: Arc<dyn PdfTextReader>,
    staged: &StagedPdf,
) -> Result<String, ExtractionError> {
    let path = staged.path().to_path_buf();
    let text = tokio::task::spawn_blocking(move || reader.read_text(&path))
        .await
        .map_err(|e| ExtractionError::Internal {
            detail: format!("extraction task failed: {e}"),
        })??;

    info!("Extracted {} chars of text", text.chars().count());
    Ok(text)
}
