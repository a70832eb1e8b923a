//! Download a PDF from a URL into request-scoped temporary storage.
//!
//! ## Why stage to a temp file?
//!
//! pdfium opens documents from a file-system path. The body is written into
//! a `TempDir` owned by [`StagedPdf`]; dropping the guard removes the
//! directory whether extraction succeeded, failed, or the handler panicked.

use super::extract::{self, PdfTextReader};
use crate::error::ExtractionError;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tracing::{debug, info};

const PDF_MAGIC: &[u8] = b"%PDF";
const STAGED_FILE_NAME: &str = "document.pdf";

/// A PDF written to a temporary directory that lives as long as this value.
#[derive(Debug)]
pub struct StagedPdf {
    path: PathBuf,
    _temp_dir: TempDir,
}

impl StagedPdf {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Build the outbound client. `timeout_secs = None` leaves requests unbounded.
pub fn build_client(
    timeout_secs: Option<u64>,
    user_agent: &str,
) -> Result<reqwest::Client, reqwest::Error> {
    let mut builder = reqwest::Client::builder().user_agent(user_agent);
    if let Some(secs) = timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    builder.build()
}

/// GET `url` and stage the body. Fails on network errors, timeouts,
/// non-2xx statuses and bodies without the `%PDF` header.
pub async fn download_pdf(
    client: &reqwest::Client,
    url: &str,
    timeout_secs: Option<u64>,
) -> Result<StagedPdf, ExtractionError> {
    info!("Downloading PDF from: {}", url);

    let send_error = |e: reqwest::Error| match timeout_secs {
        Some(secs) if e.is_timeout() => ExtractionError::DownloadTimeout {
            url: url.to_string(),
            secs,
        },
        _ => ExtractionError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        },
    };

    let response = client.get(url).send().await.map_err(send_error)?;

    let status = response.status();
    if !status.is_success() {
        return Err(ExtractionError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let bytes = response.bytes().await.map_err(send_error)?;
    debug!("Downloaded {} bytes", bytes.len());

    stage_bytes(&bytes).await
}

/// Write in-memory PDF bytes to a fresh temporary directory.
pub async fn stage_bytes(bytes: &[u8]) -> Result<StagedPdf, ExtractionError> {
    if !bytes.starts_with(PDF_MAGIC) {
        return Err(ExtractionError::NotAPdf {
            first_bytes: bytes.iter().take(PDF_MAGIC.len()).copied().collect(),
        });
    }

    let temp_dir = TempDir::new().map_err(|e| ExtractionError::Staging {
        detail: e.to_string(),
    })?;
    let path = temp_dir.path().join(STAGED_FILE_NAME);

    tokio::fs::write(&path, bytes)
        .await
        .map_err(|e| ExtractionError::Staging {
            detail: format!("failed to write temp file: {e}"),
        })?;

    debug!("Staged PDF at {}", path.display());
    Ok(StagedPdf {
        path,
        _temp_dir: temp_dir,
    })
}

/// Download `url` and return its text: the Fetcher stage end to end.
pub async fn fetch_text(
    client: &reqwest::Client,
    reader: Arc<dyn PdfTextReader>,
    url: &str,
    timeout_secs: Option<u64>,
) -> Result<String, ExtractionError> {
    let staged = download_pdf(client, url, timeout_secs).await?;
    extract::extract_text(reader, &staged).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn staged_file_is_removed_on_drop() {
        let staged = stage_bytes(b"%PDF-1.4\n%%EOF\n").await.unwrap();
        let path = staged.path().to_path_buf();
        let dir = path.parent().unwrap().to_path_buf();
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.4\n%%EOF\n");

        drop(staged);
        assert!(!path.exists());
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn non_pdf_bytes_are_rejected() {
        let err = stage_bytes(b"<html>nope</html>").await.unwrap_err();
        assert_eq!(
            err,
            ExtractionError::NotAPdf {
                first_bytes: b"<htm".to_vec()
            }
        );
    }

    #[tokio::test]
    async fn empty_body_is_not_a_pdf() {
        let err = stage_bytes(b"").await.unwrap_err();
        assert!(matches!(err, ExtractionError::NotAPdf { first_bytes } if first_bytes.is_empty()));
    }

    #[tokio::test]
    async fn malformed_url_is_a_download_failure() {
        let client = build_client(None, "test").unwrap();
        let err = download_pdf(&client, "not a url", None).await.unwrap_err();
        assert!(matches!(err, ExtractionError::DownloadFailed { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn unreachable_host_is_a_download_failure() {
        let client = build_client(Some(5), "test").unwrap();
        // Port 9 (discard) on localhost is closed on any sane test machine.
        let err = download_pdf(&client, "http://127.0.0.1:9/doc.pdf", Some(5))
            .await
            .unwrap_err();
        assert!(
            matches!(
                err,
                ExtractionError::DownloadFailed { .. } | ExtractionError::DownloadTimeout { .. }
            ),
            "{err:?}"
        );
    }
}
