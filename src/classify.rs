//! Classification entry points: URL → text → features → label.
//!
//! [`PdfClassifier`] owns everything a request needs that outlives the
//! request: the loaded [`Artifacts`], the pdfium text reader and the HTTP
//! client. All three are read-only and cheap to share behind `Arc`, so one
//! classifier serves any number of concurrent requests without locking.

use crate::artifacts::Artifacts;
use crate::config::ClassifierConfig;
use crate::error::ClassifierError;
use crate::output::{round4, Classification, LabelProbabilities, Prediction};
use crate::pipeline::extract::{self, PdfTextReader, PdfiumTextReader};
use crate::pipeline::model::argmax;
use crate::pipeline::{fetch, normalize};
use pdfium_auto::PdfiumLocator;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// A ready-to-use classifier.
///
/// # Example
/// ```rust,no_run
/// use pdf_classifier::{ClassifierConfig, PdfClassifier};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let classifier = PdfClassifier::from_config(&ClassifierConfig::default())?;
/// let prediction = classifier.classify_url("https://example.com/datasheet.pdf").await;
/// println!("{}", prediction.label_text());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct PdfClassifier {
    artifacts: Arc<Artifacts>,
    reader: Arc<dyn PdfTextReader>,
    client: reqwest::Client,
    download_timeout_secs: Option<u64>,
}

impl PdfClassifier {
    /// Build from already-loaded parts.
    pub fn new(
        artifacts: Arc<Artifacts>,
        reader: Arc<dyn PdfTextReader>,
        config: &ClassifierConfig,
    ) -> Result<Self, ClassifierError> {
        let client = fetch::build_client(config.download_timeout_secs, &config.user_agent)
            .map_err(|e| ClassifierError::HttpClient(e.to_string()))?;
        Ok(Self {
            artifacts,
            reader,
            client,
            download_timeout_secs: config.download_timeout_secs,
        })
    }

    /// Load artifacts and bind pdfium as described by `config`.
    ///
    /// Blocking: may download the pdfium library on first run.
    pub fn from_config(config: &ClassifierConfig) -> Result<Self, ClassifierError> {
        let artifacts = Arc::new(Artifacts::load(config)?);
        let reader = PdfiumTextReader::bind(&pdfium_locator(config))?;

        Self::new(artifacts, Arc::new(reader), config)
    }

    pub fn artifacts(&self) -> &Artifacts {
        &self.artifacts
    }

    /// Download, read, normalize and classify the PDF at `url`.
    ///
    /// Never fails: fetch and extraction problems come back as
    /// [`Prediction::ExtractionFailed`] and skip the remaining stages.
    pub async fn classify_url(&self, url: &str) -> Prediction {
        let start = Instant::now();
        info!("Classifying: {}", url);

        let text = match fetch::fetch_text(
            &self.client,
            Arc::clone(&self.reader),
            url,
            self.download_timeout_secs,
        )
        .await
        {
            Ok(text) => text,
            Err(e) => {
                warn!("Extraction failed for {}: {}", url, e);
                return Prediction::ExtractionFailed(e);
            }
        };

        let classification = self.classify_text(&text);
        info!(
            "Classified {} as {} in {}ms",
            url,
            classification.label,
            start.elapsed().as_millis()
        );
        Prediction::Classified(classification)
    }

    /// Classify PDF bytes already in memory.
    pub async fn classify_bytes(&self, bytes: &[u8]) -> Prediction {
        let staged = match fetch::stage_bytes(bytes).await {
            Ok(staged) => staged,
            Err(e) => return Prediction::ExtractionFailed(e),
        };
        match extract::extract_text(Arc::clone(&self.reader), &staged).await {
            Ok(text) => Prediction::Classified(self.classify_text(&text)),
            Err(e) => Prediction::ExtractionFailed(e),
        }
    }

    /// Normalize raw document text and classify it.
    pub fn classify_text(&self, text: &str) -> Classification {
        let clean = normalize::normalize(text);
        debug!(
            "Normalized {} chars into {} tokens",
            text.len(),
            clean.split(' ').filter(|t| !t.is_empty()).count()
        );
        self.classify_normalized(&clean)
    }

    /// Vectorize already-normalized text and query the model.
    pub fn classify_normalized(&self, normalized: &str) -> Classification {
        let features = self.artifacts.vectorizer().transform(normalized);
        debug!(
            "Feature vector: {} of {} columns set",
            features.nnz(),
            features.dim()
        );

        let probabilities = self.artifacts.model().predict_proba(&features);
        let labels = self.artifacts.labels();
        // validated at load: labels equal the model classes, at least two
        let best = argmax(&probabilities).unwrap_or(0);

        Classification {
            label: labels[best].clone(),
            probabilities: LabelProbabilities::new(
                labels
                    .iter()
                    .cloned()
                    .zip(probabilities.into_iter().map(round4))
                    .collect(),
            ),
        }
    }
}

/// Locator for the pdfium library: environment first, then an explicit
/// `pdfium_library_path` from `config`.
pub fn pdfium_locator(config: &ClassifierConfig) -> PdfiumLocator {
    let locator = PdfiumLocator::from_env();
    match config.pdfium_library_path {
        Some(ref path) => locator.with_library_path(path),
        None => locator,
    }
}

/// Synchronous wrapper around [`PdfClassifier::classify_url`].
///
/// Creates a temporary tokio runtime internally.
pub fn classify_url_sync(classifier: &PdfClassifier, url: &str) -> Result<Prediction, ClassifierError> {
    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| ClassifierError::Internal(format!("Failed to create tokio runtime: {e}")))?;
    Ok(runtime.block_on(classifier.classify_url(url)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExtractionError;
    use crate::pipeline::model::TextModel;
    use crate::pipeline::vectorize::TfidfVectorizer;
    use std::path::Path;

    struct FixedText(&'static str);

    impl PdfTextReader for FixedText {
        fn read_text(&self, _path: &Path) -> Result<String, ExtractionError> {
            Ok(self.0.to_string())
        }
    }

    fn classifier(text: &'static str) -> PdfClassifier {
        let vectorizer: TfidfVectorizer = serde_json::from_str(
            r#"{"vocabulary": {"cable": 0, "fuse": 1, "lamp": 2, "widget": 3}}"#,
        )
        .unwrap();
        let model: TextModel = serde_json::from_str(
            r#"{"kind": "logistic_regression",
                "classes": ["Cables", "Fuses", "Lighting", "Others"],
                "coef": [[4, 0, 0, 0], [0, 4, 0, 0], [0, 0, 4, 0], [0, 0, 0, 4]],
                "intercept": [0, 0, 0, 0.1]}"#,
        )
        .unwrap();
        let labels = ["Cables", "Fuses", "Lighting", "Others"]
            .map(String::from)
            .to_vec();
        let artifacts = Artifacts::from_parts(vectorizer, model, labels).unwrap();
        PdfClassifier::new(
            Arc::new(artifacts),
            Arc::new(FixedText(text)),
            &ClassifierConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn fuse_text_is_classified_as_fuses() {
        let c = classifier("").classify_text("Fuse FUSE fuse, fuse!");
        assert_eq!(c.label, "Fuses");
        assert_eq!(c.probabilities.len(), 4);
        assert!((c.probabilities.total() - 1.0).abs() < 1e-3);
        assert!(c.probabilities.iter().all(|(_, p)| (0.0..=1.0).contains(&p)));
    }

    #[test]
    fn label_is_argmax_of_probabilities() {
        for text in ["cable lamp lamp", "widget", "", "the and of"] {
            let c = classifier("").classify_text(text);
            let (best, _) = c
                .probabilities
                .iter()
                .fold(("", f64::MIN), |acc, (l, p)| if p > acc.1 { (l, p) } else { acc });
            assert_eq!(c.label, best, "text: {text:?}");
        }
    }

    #[test]
    fn empty_text_falls_back_to_intercepts() {
        let c = classifier("").classify_text("");
        assert_eq!(c.label, "Others");
    }

    #[test]
    fn probabilities_are_rounded_to_four_places() {
        let c = classifier("").classify_text("cable fuse");
        for (_, p) in c.probabilities.iter() {
            assert_eq!(p, round4(p));
        }
    }

    #[tokio::test]
    async fn classify_bytes_runs_reader() {
        let c = classifier("lamp lamp lamp");
        let prediction = c.classify_bytes(b"%PDF-1.7 stub").await;
        assert_eq!(prediction.label_text(), "Lighting");
    }

    #[tokio::test]
    async fn classify_bytes_rejects_non_pdf() {
        let c = classifier("lamp");
        let prediction = c.classify_bytes(b"GIF89a").await;
        assert!(prediction.label_text().starts_with("Error processing PDF"));
        assert!(prediction.probabilities().is_empty());
    }

    #[tokio::test]
    async fn bad_url_short_circuits() {
        let c = classifier("fuse");
        let prediction = c.classify_url("definitely not a url").await;
        assert!(matches!(
            prediction.error(),
            Some(ExtractionError::DownloadFailed { .. })
        ));
        assert!(prediction.probabilities().is_empty());
    }
}
