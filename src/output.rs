//! Result types returned by the classification pipeline.

use crate::error::ExtractionError;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Ordered `label → probability` mapping.
///
/// Serialises as a JSON object whose keys keep the artifact's label order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LabelProbabilities(Vec<(String, f64)>);

impl LabelProbabilities {
    pub fn new(entries: Vec<(String, f64)>) -> Self {
        Self(entries)
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, label: &str) -> Option<f64> {
        self.0.iter().find(|(l, _)| l == label).map(|(_, p)| *p)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(l, p)| (l.as_str(), *p))
    }

    /// Sum of all probabilities (≈ 1 for a classification, 0 when empty).
    pub fn total(&self) -> f64 {
        self.0.iter().map(|(_, p)| p).sum()
    }
}

impl Serialize for LabelProbabilities {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (label, p) in &self.0 {
            map.serialize_entry(label, p)?;
        }
        map.end()
    }
}

/// A successful classification.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Classification {
    /// The most likely label.
    pub label: String,
    /// Every known label with its probability rounded to 4 decimals.
    pub probabilities: LabelProbabilities,
}

/// Outcome of classifying one PDF URL.
#[derive(Debug, Clone, PartialEq)]
pub enum Prediction {
    Classified(Classification),
    /// The PDF could not be fetched or read; nothing was classified.
    ExtractionFailed(ExtractionError),
}

impl Prediction {
    /// Text for the "Predicted Label" field: the label, or the
    /// `Error processing PDF: ...` message.
    pub fn label_text(&self) -> String {
        match self {
            Prediction::Classified(c) => c.label.clone(),
            Prediction::ExtractionFailed(e) => e.user_message(),
        }
    }

    /// Probabilities to display; empty when extraction failed.
    pub fn probabilities(&self) -> LabelProbabilities {
        match self {
            Prediction::Classified(c) => c.probabilities.clone(),
            Prediction::ExtractionFailed(_) => LabelProbabilities::empty(),
        }
    }

    pub fn is_classified(&self) -> bool {
        matches!(self, Prediction::Classified(_))
    }

    pub fn error(&self) -> Option<&ExtractionError> {
        match self {
            Prediction::Classified(_) => None,
            Prediction::ExtractionFailed(e) => Some(e),
        }
    }
}

/// Round to 4 decimal places, as displayed to users.
pub fn round4(p: f64) -> f64 {
    (p * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probabilities_serialise_in_order() {
        let probs = LabelProbabilities::new(vec![
            ("Lighting".into(), 0.1),
            ("Cables".into(), 0.9),
        ]);
        let json = serde_json::to_string(&probs).unwrap();
        assert_eq!(json, r#"{"Lighting":0.1,"Cables":0.9}"#);
    }

    #[test]
    fn failed_prediction_has_empty_probabilities() {
        let p = Prediction::ExtractionFailed(ExtractionError::HttpStatus {
            url: "http://x/y.pdf".into(),
            status: 404,
        });
        assert!(p.label_text().starts_with("Error processing PDF: HTTP 404 Not Found"));
        assert!(p.probabilities().is_empty());
        assert!(!p.is_classified());
        assert!(p.error().is_some());
        assert_eq!(serde_json::to_string(&p.probabilities()).unwrap(), "{}");
    }

    #[test]
    fn classified_prediction_exposes_label() {
        let c = Classification {
            label: "Fuses".into(),
            probabilities: LabelProbabilities::new(vec![("Fuses".into(), 1.0)]),
        };
        let p = Prediction::Classified(c);
        assert_eq!(p.label_text(), "Fuses");
        assert_eq!(p.probabilities().get("Fuses"), Some(1.0));
        assert_eq!(p.error(), None);
    }

    #[test]
    fn rounding() {
        assert_eq!(round4(0.123_456), 0.1235);
        assert_eq!(round4(0.99996), 1.0);
        assert_eq!(round4(0.0), 0.0);
    }
}
