//! Error types for the pdf-classifier library.
//!
//! Two error types for two failure modes:
//!
//! * [`ClassifierError`] — **Fatal**: the service cannot start or keep
//!   serving (artifact missing or inconsistent, pdfium cannot be bound, the
//!   listener cannot bind). Returned as `Err(ClassifierError)` from startup
//!   functions; the binary exits on it.
//!
//! * [`ExtractionError`] — **Per request**: the PDF behind one URL could not
//!   be downloaded or read. Carried inside
//!   [`crate::output::Prediction::ExtractionFailed`] so the caller always gets
//!   a result value back, never a propagated error.

use std::path::PathBuf;
use thiserror::Error;

/// Prefix of every user-visible extraction failure message.
pub const ERROR_MARKER: &str = "Error processing PDF";

/// Fatal errors raised while loading artifacts or starting the service.
#[derive(Debug, Error)]
pub enum ClassifierError {
    // ── Artifact errors ──────────────────────────────────────────────────
    /// An artifact file does not exist.
    #[error("Model artifact not found: '{path}'\nExport the fitted artifacts to JSON and point --model-dir at them.")]
    ArtifactNotFound { path: PathBuf },

    /// An artifact file exists but could not be read.
    #[error("Failed to read model artifact '{path}': {source}")]
    ArtifactUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An artifact file is not valid JSON for its expected schema.
    #[error("Model artifact '{path}' is malformed: {source}")]
    ArtifactMalformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The vectorizer, model and labels were not fitted together.
    #[error("Model artifacts are inconsistent: {0}")]
    ArtifactMismatch(String),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Runtime setup errors ──────────────────────────────────────────────
    /// Could not locate or bind a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy."
    )]
    PdfiumBindingFailed(String),

    /// The outbound HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),

    /// The web server could not bind its listening socket.
    #[error("Failed to bind web server to {addr}: {source}")]
    BindFailed {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The web server stopped with an I/O error.
    #[error("Web server error: {0}")]
    Server(#[source] std::io::Error),

    // ── Catch-all ─────────────────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Why the text of one PDF could not be obtained.
///
/// `Display` gives the detail only; the user-facing string is
/// `"{ERROR_MARKER}: {detail}"`, see [`ExtractionError::user_message`].
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExtractionError {
    /// Request could not be sent or the body could not be read.
    /// Malformed URLs end up here too.
    #[error("failed to download '{url}': {reason}")]
    DownloadFailed { url: String, reason: String },

    /// Only produced when a download timeout is configured.
    #[error("download of '{url}' timed out after {secs}s")]
    DownloadTimeout { url: String, secs: u64 },

    /// Server answered with a non-2xx status.
    #[error("HTTP {} for url '{url}'", status_text(.status))]
    HttpStatus { url: String, status: u16 },

    /// The body does not start with the `%PDF` magic bytes.
    #[error("document is not a PDF (first bytes: {first_bytes:?})")]
    NotAPdf { first_bytes: Vec<u8> },

    /// pdfium could not open or read the document.
    #[error("PDF is corrupt or unreadable: {detail}")]
    CorruptPdf { detail: String },

    /// The document is encrypted with a user password.
    #[error("PDF is encrypted and requires a password")]
    PasswordRequired,

    /// The temporary staging file could not be created or written.
    #[error("failed to stage downloaded PDF: {detail}")]
    Staging { detail: String },

    /// Extraction task panicked or was cancelled.
    #[error("internal extraction error: {detail}")]
    Internal { detail: String },
}

impl ExtractionError {
    /// Message shown to users in place of a label, e.g.
    /// `Error processing PDF: HTTP 404 Not Found for url '...'`.
    pub fn user_message(&self) -> String {
        format!("{ERROR_MARKER}: {self}")
    }
}

fn status_text(status: &u16) -> String {
    match reqwest::StatusCode::from_u16(*status) {
        Ok(code) => code.to_string(),
        Err(_) => status.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_display_includes_reason() {
        let e = ExtractionError::HttpStatus {
            url: "https://example.com/a.pdf".into(),
            status: 404,
        };
        let msg = e.to_string();
        assert!(msg.contains("404 Not Found"), "got: {msg}");
        assert!(msg.contains("https://example.com/a.pdf"));
    }

    #[test]
    fn user_message_starts_with_marker() {
        let e = ExtractionError::PasswordRequired;
        let msg = e.user_message();
        assert!(msg.starts_with(ERROR_MARKER));
        assert!(msg.starts_with("Error processing PDF: "));
    }

    #[test]
    fn extraction_error_serialises_with_kind_tag() {
        let e = ExtractionError::DownloadTimeout {
            url: "http://x".into(),
            secs: 5,
        };
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["kind"], "download_timeout");
        assert_eq!(json["secs"], 5);
    }

    #[test]
    fn unknown_status_code_falls_back_to_number() {
        assert_eq!(status_text(&42), "42");
    }

    #[test]
    fn mismatch_display() {
        let e = ClassifierError::ArtifactMismatch("4 labels but 3 classes".into());
        assert!(e.to_string().contains("4 labels but 3 classes"));
    }
}
