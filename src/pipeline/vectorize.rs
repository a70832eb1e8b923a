//! Fitted TF-IDF transform: normalized text → sparse feature vector.
//!
//! The vectorizer is loaded from a JSON export of a fitted scikit-learn
//! `TfidfVectorizer` and reproduces its `transform` for a single document:
//!
//! ```text
//! analyze (lowercase, token pattern, stop words, n-grams)
//!   → term counts over the fitted vocabulary
//!   → binary / sublinear tf
//!   → × idf
//!   → l1 / l2 row normalization
//! ```
//!
//! Example export (`tfidf_vectorizer.json`):
//!
//! ```json
//! {
//!   "vocabulary": {"cable": 0, "fuse": 1, "lamp": 2},
//!   "idf": [1.69, 1.69, 2.10],
//!   "ngram_range": [1, 1],
//!   "sublinear_tf": false,
//!   "norm": "l2"
//! }
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap, HashSet};

/// scikit-learn's default `token_pattern`.
pub const DEFAULT_TOKEN_PATTERN: &str = r"(?u)\b\w\w+\b";

static DEFAULT_TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(DEFAULT_TOKEN_PATTERN).unwrap());

/// A sparse row vector with entries sorted by column index.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SparseVector {
    dim: usize,
    entries: Vec<(usize, f64)>,
}

impl SparseVector {
    /// Build from `(index, value)` pairs; zero values are dropped and
    /// duplicate indices summed.
    pub fn new(dim: usize, entries: impl IntoIterator<Item = (usize, f64)>) -> Self {
        let mut merged: BTreeMap<usize, f64> = BTreeMap::new();
        for (idx, value) in entries {
            debug_assert!(idx < dim, "index {idx} out of bounds for dim {dim}");
            *merged.entry(idx).or_insert(0.0) += value;
        }
        Self {
            dim,
            entries: merged.into_iter().filter(|(_, v)| *v != 0.0).collect(),
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of stored (non-zero) entries.
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[(usize, f64)] {
        &self.entries
    }

    pub fn get(&self, idx: usize) -> f64 {
        self.entries
            .binary_search_by_key(&idx, |(i, _)| *i)
            .map(|pos| self.entries[pos].1)
            .unwrap_or(0.0)
    }

    /// Dot product with a dense row of the same dimension.
    pub fn dot(&self, dense: &[f64]) -> f64 {
        self.entries
            .iter()
            .map(|(idx, value)| value * dense.get(*idx).copied().unwrap_or(0.0))
            .sum()
    }

    fn scale(&mut self, factor: f64) {
        for (_, value) in &mut self.entries {
            *value *= factor;
        }
    }
}

/// Row normalization applied after idf weighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    L1,
    L2,
}

/// The JSON export as written to disk.
#[derive(Debug, Deserialize)]
struct VectorizerExport {
    vocabulary: HashMap<String, usize>,
    #[serde(default)]
    idf: Option<Vec<f64>>,
    #[serde(default = "default_true")]
    lowercase: bool,
    #[serde(default)]
    token_pattern: Option<String>,
    #[serde(default = "default_ngram_range")]
    ngram_range: (usize, usize),
    #[serde(default)]
    stop_words: Option<Vec<String>>,
    #[serde(default)]
    binary: bool,
    #[serde(default)]
    sublinear_tf: bool,
    #[serde(default = "default_norm")]
    norm: Option<Norm>,
}

fn default_true() -> bool {
    true
}

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

fn default_norm() -> Option<Norm> {
    Some(Norm::L2)
}

/// A fitted, immutable TF-IDF vectorizer.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "VectorizerExport")]
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Option<Vec<f64>>,
    lowercase: bool,
    token_re: Regex,
    ngram_range: (usize, usize),
    stop_words: HashSet<String>,
    binary: bool,
    sublinear_tf: bool,
    norm: Option<Norm>,
}

impl TryFrom<VectorizerExport> for TfidfVectorizer {
    type Error = String;

    fn try_from(export: VectorizerExport) -> Result<Self, Self::Error> {
        let dim = export.vocabulary.len();
        if dim == 0 {
            return Err("vocabulary is empty".into());
        }
        let mut seen = vec![false; dim];
        for (term, &idx) in &export.vocabulary {
            if idx >= dim || std::mem::replace(&mut seen[idx], true) {
                return Err(format!(
                    "vocabulary indices must be a permutation of 0..{dim}; '{term}' maps to {idx}"
                ));
            }
        }
        if let Some(idf) = &export.idf {
            if idf.len() != dim {
                return Err(format!(
                    "idf has {} weights but vocabulary has {dim} terms",
                    idf.len()
                ));
            }
        }
        let (min_n, max_n) = export.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(format!("invalid ngram_range ({min_n}, {max_n})"));
        }
        let token_re = match export.token_pattern.as_deref() {
            None | Some(DEFAULT_TOKEN_PATTERN) => DEFAULT_TOKEN_RE.clone(),
            Some(pattern) => {
                Regex::new(pattern).map_err(|e| format!("invalid token_pattern: {e}"))?
            }
        };

        Ok(Self {
            vocabulary: export.vocabulary,
            idf: export.idf,
            lowercase: export.lowercase,
            token_re,
            ngram_range: export.ngram_range,
            stop_words: export.stop_words.unwrap_or_default().into_iter().collect(),
            binary: export.binary,
            sublinear_tf: export.sublinear_tf,
            norm: export.norm,
        })
    }
}

impl TfidfVectorizer {
    /// Vocabulary size, i.e. the feature-space dimension.
    pub fn n_features(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn ngram_range(&self) -> (usize, usize) {
        self.ngram_range
    }

    pub fn sublinear_tf(&self) -> bool {
        self.sublinear_tf
    }

    /// Column of `term`, if it is in the fitted vocabulary.
    pub fn index_of(&self, term: &str) -> Option<usize> {
        self.vocabulary.get(term).copied()
    }

    /// Split a document into the terms the vocabulary is keyed by.
    pub fn analyze(&self, text: &str) -> Vec<String> {
        let lowered;
        let text = if self.lowercase {
            lowered = text.to_lowercase();
            lowered.as_str()
        } else {
            text
        };

        let tokens: Vec<&str> = self
            .token_re
            .find_iter(text)
            .map(|m| m.as_str())
            .filter(|t| !self.stop_words.contains(*t))
            .collect();

        let (min_n, max_n) = self.ngram_range;
        let mut terms = Vec::new();
        for n in min_n..=max_n {
            if n > tokens.len() {
                break;
            }
            terms.extend(tokens.windows(n).map(|w| w.join(" ")));
        }
        terms
    }

    /// Transform one document into its weighted feature vector.
    pub fn transform(&self, text: &str) -> SparseVector {
        let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
        for term in self.analyze(text) {
            if let Some(idx) = self.index_of(&term) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }

        let weighted = counts.into_iter().map(|(idx, count)| {
            let tf = if self.binary {
                1.0
            } else if self.sublinear_tf {
                1.0 + count.ln()
            } else {
                count
            };
            let idf = self.idf.as_ref().map_or(1.0, |w| w[idx]);
            (idx, tf * idf)
        });

        let mut vector = SparseVector::new(self.n_features(), weighted);
        if let Some(norm) = self.norm {
            let magnitude = match norm {
                Norm::L1 => vector.entries.iter().map(|(_, v)| v.abs()).sum::<f64>(),
                Norm::L2 => vector.entries.iter().map(|(_, v)| v * v).sum::<f64>().sqrt(),
            };
            if magnitude > 0.0 {
                vector.scale(1.0 / magnitude);
            }
        }
        vector
    }
}
