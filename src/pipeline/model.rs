//! Pre-trained probabilistic text classifiers.
//!
//! Two exported model families are supported, selected by the `kind` tag of
//! `product_classifier_model.json`:
//!
//! | `kind` | Fitted parameters | Probabilities |
//! |--------|-------------------|---------------|
//! | `logistic_regression` | `coef` (classes × features), `intercept` | softmax (`multinomial`) or normalized sigmoids (`ovr`) |
//! | `multinomial_nb` | `class_log_prior`, `feature_log_prob` | normalized joint log likelihood |
//!
//! Class order in the export is the order of the returned probabilities.

use super::vectorize::SparseVector;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TextModel {
    LogisticRegression(LogisticRegression),
    MultinomialNb(MultinomialNb),
}

/// How a multi-class logistic regression turns scores into probabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MultiClass {
    #[default]
    Multinomial,
    Ovr,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogisticRegression {
    pub classes: Vec<String>,
    /// One row per class, or a single row for a binary model.
    pub coef: Vec<Vec<f64>>,
    pub intercept: Vec<f64>,
    #[serde(default)]
    pub multi_class: MultiClass,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MultinomialNb {
    pub classes: Vec<String>,
    pub class_log_prior: Vec<f64>,
    /// One row per class.
    pub feature_log_prob: Vec<Vec<f64>>,
}

impl TextModel {
    pub fn kind(&self) -> &'static str {
        match self {
            TextModel::LogisticRegression(_) => "logistic_regression",
            TextModel::MultinomialNb(_) => "multinomial_nb",
        }
    }

    /// Class names in probability order.
    pub fn classes(&self) -> &[String] {
        match self {
            TextModel::LogisticRegression(m) => &m.classes,
            TextModel::MultinomialNb(m) => &m.classes,
        }
    }

    /// Width of every parameter row.
    pub fn n_features(&self) -> usize {
        let rows = match self {
            TextModel::LogisticRegression(m) => &m.coef,
            TextModel::MultinomialNb(m) => &m.feature_log_prob,
        };
        rows.first().map_or(0, Vec::len)
    }

    /// Check parameter shapes against each other.
    pub fn validate(&self) -> Result<(), String> {
        let n_classes = self.classes().len();
        if n_classes < 2 {
            return Err(format!("model needs at least 2 classes, got {n_classes}"));
        }
        let width = self.n_features();
        if width == 0 {
            return Err("model has no feature weights".into());
        }

        let (rows, biases, expected_rows) = match self {
            TextModel::LogisticRegression(m) => {
                let expected = if n_classes == 2 && m.coef.len() == 1 { 1 } else { n_classes };
                (&m.coef, &m.intercept, expected)
            }
            TextModel::MultinomialNb(m) => (&m.feature_log_prob, &m.class_log_prior, n_classes),
        };
        if rows.len() != expected_rows || biases.len() != expected_rows {
            return Err(format!(
                "{} classes need {expected_rows} weight rows and biases, got {} and {}",
                n_classes,
                rows.len(),
                biases.len()
            ));
        }
        if let Some(bad) = rows.iter().position(|r| r.len() != width) {
            return Err(format!(
                "weight row {bad} has {} features, expected {width}",
                rows[bad].len()
            ));
        }
        Ok(())
    }

    /// Probability of each class for one feature vector, in [`Self::classes`] order.
    pub fn predict_proba(&self, x: &SparseVector) -> Vec<f64> {
        match self {
            TextModel::LogisticRegression(m) => {
                let scores: Vec<f64> = m
                    .coef
                    .iter()
                    .zip(&m.intercept)
                    .map(|(row, b)| x.dot(row) + b)
                    .collect();
                if scores.len() == 1 {
                    let p = sigmoid(scores[0]);
                    return vec![1.0 - p, p];
                }
                match m.multi_class {
                    MultiClass::Multinomial => softmax(&scores),
                    MultiClass::Ovr => {
                        let raw: Vec<f64> = scores.into_iter().map(sigmoid).collect();
                        let total: f64 = raw.iter().sum();
                        raw.into_iter().map(|p| p / total).collect()
                    }
                }
            }
            TextModel::MultinomialNb(m) => {
                let joint: Vec<f64> = m
                    .feature_log_prob
                    .iter()
                    .zip(&m.class_log_prior)
                    .map(|(row, prior)| x.dot(row) + prior)
                    .collect();
                softmax(&joint)
            }
        }
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// Numerically stable softmax (also log-sum-exp normalization of log scores).
fn softmax(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

/// Index of the largest value; the first one wins on ties.
pub fn argmax(values: &[f64]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, &v)| match best {
            Some((_, b)) if b >= v => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(json: &str) -> TextModel {
        let m: TextModel = serde_json::from_str(json).expect("valid model export");
        m.validate().expect("consistent model");
        m
    }

    fn assert_distribution(p: &[f64]) {
        assert!(p.iter().all(|v| (0.0..=1.0).contains(v)), "{p:?}");
        assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-9, "{p:?}");
    }

    #[test]
    fn multinomial_logistic_regression() {
        let m = model(
            r#"{"kind": "logistic_regression", "classes": ["a", "b", "c"],
                "coef": [[2.0, 0.0], [0.0, 2.0], [0.0, 0.0]],
                "intercept": [0.0, 0.0, 0.0]}"#,
        );
        let p = m.predict_proba(&SparseVector::new(2, [(0, 1.0)]));
        assert_distribution(&p);
        let e2 = 2f64.exp();
        assert!((p[0] - e2 / (e2 + 2.0)).abs() < 1e-12);
        assert_eq!(argmax(&p), Some(0));
    }

    #[test]
    fn ovr_logistic_regression_is_normalized() {
        let m = model(
            r#"{"kind": "logistic_regression", "classes": ["a", "b"],
                "coef": [[1.0], [-1.0]], "intercept": [0.0, 0.0], "multi_class": "ovr"}"#,
        );
        let p = m.predict_proba(&SparseVector::new(1, [(0, 3.0)]));
        assert_distribution(&p);
        assert!(p[0] > p[1]);
    }

    #[test]
    fn binary_logistic_regression_single_row() {
        let m = model(
            r#"{"kind": "logistic_regression", "classes": ["neg", "pos"],
                "coef": [[1.0]], "intercept": [0.0]}"#,
        );
        let p = m.predict_proba(&SparseVector::new(1, []));
        assert_eq!(p, vec![0.5, 0.5]);
    }

    #[test]
    fn multinomial_naive_bayes() {
        let m = model(
            r#"{"kind": "multinomial_nb", "classes": ["x", "y"],
                "class_log_prior": [-0.6931471805599453, -0.6931471805599453],
                "feature_log_prob": [[-0.1, -2.3], [-2.3, -0.1]]}"#,
        );
        let p = m.predict_proba(&SparseVector::new(2, [(1, 1.0)]));
        assert_distribution(&p);
        assert_eq!(argmax(&p), Some(1));
        let expected = 1.0 / (1.0 + (-2.2f64).exp());
        assert!((p[1] - expected).abs() < 1e-12);
    }

    #[test]
    fn softmax_survives_large_scores() {
        let p = softmax(&[1000.0, 1000.0, -1000.0]);
        assert_distribution(&p);
        assert!((p[0] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn argmax_first_wins() {
        assert_eq!(argmax(&[0.25, 0.25, 0.25, 0.25]), Some(0));
        assert_eq!(argmax(&[0.1, 0.7, 0.7]), Some(1));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn validate_catches_shape_errors() {
        let m: TextModel = serde_json::from_str(
            r#"{"kind": "logistic_regression", "classes": ["a", "b", "c"],
                "coef": [[1.0], [1.0]], "intercept": [0.0, 0.0]}"#,
        )
        .unwrap();
        assert!(m.validate().is_err());

        let m: TextModel = serde_json::from_str(
            r#"{"kind": "multinomial_nb", "classes": ["a", "b"],
                "class_log_prior": [0.0, 0.0], "feature_log_prob": [[1.0, 2.0], [1.0]]}"#,
        )
        .unwrap();
        let err = m.validate().unwrap_err();
        assert!(err.contains("row 1"), "{err}");
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let r = serde_json::from_str::<TextModel>(r#"{"kind": "svm", "classes": []}"#);
        assert!(r.is_err());
    }
}
