//! Loading of the fitted model artifacts.
//!
//! The vectorizer, the classifier and the ordered label list are exported
//! together from the training environment. They are read once at startup,
//! cross-checked, and then shared read-only (`Arc<Artifacts>`) by every
//! request. Any failure here is fatal.

use crate::config::ClassifierConfig;
use crate::error::ClassifierError;
use crate::pipeline::model::TextModel;
use crate::pipeline::vectorize::TfidfVectorizer;
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::info;

/// The immutable, jointly-fitted artifacts.
#[derive(Debug, Clone)]
pub struct Artifacts {
    vectorizer: TfidfVectorizer,
    model: TextModel,
    labels: Vec<String>,
}

impl Artifacts {
    /// Read and validate the three artifact files named by `config`.
    pub fn load(config: &ClassifierConfig) -> Result<Self, ClassifierError> {
        let model: TextModel = read_json(&config.model_path())?;
        let vectorizer: TfidfVectorizer = read_json(&config.vectorizer_path())?;
        let labels: Vec<String> = read_json(&config.labels_path())?;

        let artifacts = Self::from_parts(vectorizer, model, labels)?;
        info!(
            "Loaded {} model: {} labels, {} features",
            artifacts.model.kind(),
            artifacts.labels.len(),
            artifacts.vectorizer.n_features()
        );
        Ok(artifacts)
    }

    /// Assemble artifacts already in memory, enforcing that they share one
    /// feature space and one class list.
    pub fn from_parts(
        vectorizer: TfidfVectorizer,
        model: TextModel,
        labels: Vec<String>,
    ) -> Result<Self, ClassifierError> {
        model.validate().map_err(ClassifierError::ArtifactMismatch)?;

        if vectorizer.n_features() != model.n_features() {
            return Err(ClassifierError::ArtifactMismatch(format!(
                "vectorizer has {} features but model expects {}",
                vectorizer.n_features(),
                model.n_features()
            )));
        }
        if labels.len() != model.classes().len() {
            return Err(ClassifierError::ArtifactMismatch(format!(
                "{} labels but model has {} classes",
                labels.len(),
                model.classes().len()
            )));
        }
        if let Some(i) = labels.iter().zip(model.classes()).position(|(l, c)| l != c) {
            return Err(ClassifierError::ArtifactMismatch(format!(
                "label {i} is '{}' but model class {i} is '{}'",
                labels[i],
                model.classes()[i]
            )));
        }
        if let Some(blank) = labels.iter().position(|l| l.trim().is_empty()) {
            return Err(ClassifierError::ArtifactMismatch(format!(
                "label {blank} is empty"
            )));
        }

        Ok(Self {
            vectorizer,
            model,
            labels,
        })
    }

    pub fn vectorizer(&self) -> &TfidfVectorizer {
        &self.vectorizer
    }

    pub fn model(&self) -> &TextModel {
        &self.model
    }

    /// Label names, aligned index-for-index with the model's probabilities.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ClassifierError> {
    let raw = std::fs::read(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ClassifierError::ArtifactNotFound {
                path: path.to_path_buf(),
            }
        } else {
            ClassifierError::ArtifactUnreadable {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    serde_json::from_slice(&raw).map_err(|source| ClassifierError::ArtifactMalformed {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const VECTORIZER: &str = r#"{"vocabulary": {"cable": 0, "fuse": 1}}"#;
    const MODEL: &str = r#"{"kind": "logistic_regression", "classes": ["Cables", "Fuses"],
        "coef": [[1.0, 0.0], [0.0, 1.0]], "intercept": [0.0, 0.0]}"#;

    fn write_artifacts(dir: &Path, vectorizer: &str, model: &str, labels: &str) -> ClassifierConfig {
        fs::write(dir.join("tfidf_vectorizer.json"), vectorizer).unwrap();
        fs::write(dir.join("product_classifier_model.json"), model).unwrap();
        fs::write(dir.join("labels.json"), labels).unwrap();
        ClassifierConfig::builder().model_dir(dir).build().unwrap()
    }

    #[test]
    fn loads_consistent_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_artifacts(dir.path(), VECTORIZER, MODEL, r#"["Cables", "Fuses"]"#);
        let a = Artifacts::load(&config).unwrap();
        assert_eq!(a.labels(), &["Cables", "Fuses"]);
        assert_eq!(a.vectorizer().n_features(), 2);
        assert_eq!(a.model().kind(), "logistic_regression");
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClassifierConfig::builder().model_dir(dir.path()).build().unwrap();
        let err = Artifacts::load(&config).unwrap_err();
        assert!(matches!(err, ClassifierError::ArtifactNotFound { .. }), "{err}");
    }

    #[test]
    fn malformed_json_is_reported_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_artifacts(dir.path(), VECTORIZER, "{not json", "[]");
        let err = Artifacts::load(&config).unwrap_err();
        assert!(matches!(err, ClassifierError::ArtifactMalformed { .. }));
        assert!(err.to_string().contains("product_classifier_model.json"));
    }

    #[test]
    fn label_count_must_match_classes() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_artifacts(dir.path(), VECTORIZER, MODEL, r#"["Cables"]"#);
        let err = Artifacts::load(&config).unwrap_err();
        assert!(matches!(err, ClassifierError::ArtifactMismatch(_)), "{err}");
    }

    #[test]
    fn label_order_must_match_classes() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_artifacts(dir.path(), VECTORIZER, MODEL, r#"["Fuses", "Cables"]"#);
        let err = Artifacts::load(&config).unwrap_err();
        assert!(matches!(err, ClassifierError::ArtifactMismatch(_)), "{err}");
        assert!(err.to_string().contains("label 0 is 'Fuses'"), "{err}");
    }

    #[test]
    fn feature_space_must_match() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_artifacts(
            dir.path(),
            r#"{"vocabulary": {"cable": 0, "fuse": 1, "lamp": 2}}"#,
            MODEL,
            r#"["Cables", "Fuses"]"#,
        );
        let err = Artifacts::load(&config).unwrap_err();
        assert!(err.to_string().contains("3 features"), "{err}");
    }

    #[test]
    fn shipped_artifacts_load() {
        let config = ClassifierConfig::builder()
            .model_dir(Path::new(env!("CARGO_MANIFEST_DIR")).join("models"))
            .build()
            .unwrap();
        let a = Artifacts::load(&config).expect("models/ must hold a consistent export");
        assert_eq!(a.labels(), &["Cables", "Fuses", "Lighting", "Others"]);
    }
}
