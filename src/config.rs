//! Configuration for the classifier service.
//!
//! Everything the process needs at startup lives in [`ClassifierConfig`],
//! built through [`ClassifierConfigBuilder`]. The artifacts it points at are
//! loaded once by [`crate::artifacts::Artifacts::load`] and never re-read.

use crate::error::ClassifierError;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Default directory holding the exported model artifacts.
pub const DEFAULT_MODEL_DIR: &str = "models";
pub const DEFAULT_MODEL_FILE: &str = "product_classifier_model.json";
pub const DEFAULT_VECTORIZER_FILE: &str = "tfidf_vectorizer.json";
pub const DEFAULT_LABELS_FILE: &str = "labels.json";
/// Local-only by default; pass `0.0.0.0:PORT` to expose the form.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:7860";

/// Startup configuration.
///
/// # Example
/// ```rust
/// use pdf_classifier::ClassifierConfig;
///
/// let config = ClassifierConfig::builder()
///     .model_dir("models")
///     .download_timeout_secs(30)
///     .build()
///     .unwrap();
/// assert_eq!(config.download_timeout_secs, Some(30));
/// ```
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Directory containing the three artifact files. Default: `models`.
    pub model_dir: PathBuf,

    /// Trained classifier export. Default: `product_classifier_model.json`.
    pub model_file: String,

    /// Fitted TF-IDF vectorizer export. Default: `tfidf_vectorizer.json`.
    pub vectorizer_file: String,

    /// Ordered label names, aligned with the classifier's classes.
    /// Default: `labels.json`.
    pub labels_file: String,

    /// Address the web form listens on. Default: `127.0.0.1:7860`.
    pub bind_addr: SocketAddr,

    /// Timeout for the outbound PDF download, in seconds. Default: `None`.
    ///
    /// `None` leaves the request unbounded: a hanging server blocks that one
    /// request until it closes the connection.
    pub download_timeout_secs: Option<u64>,

    /// `User-Agent` sent with the PDF download.
    pub user_agent: String,

    /// Explicit pdfium shared library. If `None`, [`pdfium_auto::PdfiumLocator`]
    /// resolves it from `PDFIUM_LIB_PATH`, the cache, or a download.
    pub pdfium_library_path: Option<PathBuf>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from(DEFAULT_MODEL_DIR),
            model_file: DEFAULT_MODEL_FILE.to_string(),
            vectorizer_file: DEFAULT_VECTORIZER_FILE.to_string(),
            labels_file: DEFAULT_LABELS_FILE.to_string(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 7860)),
            download_timeout_secs: None,
            user_agent: concat!("pdf-classifier/", env!("CARGO_PKG_VERSION")).to_string(),
            pdfium_library_path: None,
        }
    }
}

impl ClassifierConfig {
    pub fn builder() -> ClassifierConfigBuilder {
        ClassifierConfigBuilder {
            config: Self::default(),
            bind_addr: None,
        }
    }

    pub fn model_path(&self) -> PathBuf {
        self.model_dir.join(&self.model_file)
    }

    pub fn vectorizer_path(&self) -> PathBuf {
        self.model_dir.join(&self.vectorizer_file)
    }

    pub fn labels_path(&self) -> PathBuf {
        self.model_dir.join(&self.labels_file)
    }
}

/// Builder for [`ClassifierConfig`].
#[derive(Debug)]
pub struct ClassifierConfigBuilder {
    config: ClassifierConfig,
    bind_addr: Option<String>,
}

impl ClassifierConfigBuilder {
    pub fn model_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.model_dir = dir.into();
        self
    }

    pub fn model_file(mut self, name: impl Into<String>) -> Self {
        self.config.model_file = name.into();
        self
    }

    pub fn vectorizer_file(mut self, name: impl Into<String>) -> Self {
        self.config.vectorizer_file = name.into();
        self
    }

    pub fn labels_file(mut self, name: impl Into<String>) -> Self {
        self.config.labels_file = name.into();
        self
    }

    /// Listening address as `host:port`; parsed in [`Self::build`].
    pub fn bind_addr(mut self, addr: impl Into<String>) -> Self {
        self.bind_addr = Some(addr.into());
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = Some(secs);
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    pub fn pdfium_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_library_path = Some(path.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(mut self) -> Result<ClassifierConfig, ClassifierError> {
        if let Some(addr) = self.bind_addr.take() {
            self.config.bind_addr = addr.parse().map_err(|_| {
                ClassifierError::InvalidConfig(format!(
                    "bind address must be host:port, got '{addr}'"
                ))
            })?;
        }

        let c = &self.config;
        if c.download_timeout_secs == Some(0) {
            return Err(ClassifierError::InvalidConfig(
                "download timeout must be ≥ 1 second".into(),
            ));
        }
        for (what, name) in [
            ("model", &c.model_file),
            ("vectorizer", &c.vectorizer_file),
            ("labels", &c.labels_file),
        ] {
            if name.trim().is_empty() {
                return Err(ClassifierError::InvalidConfig(format!(
                    "{what} file name must not be empty"
                )));
            }
        }
        Ok(self.config)
    }
}
