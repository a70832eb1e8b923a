//! # pdf-classifier
//!
//! Classify a PDF fetched from a URL into one of a fixed set of product
//! categories (Lighting, Fuses, Cables, Others) using a pre-trained TF-IDF
//! text model.
//!
//! ## Pipeline Overview
//!
//! ```text
//! URL
//!  │
//!  ├─ 1. Fetch       GET the document, stage it in a TempDir
//!  ├─ 2. Extract     page text via pdfium (spawn_blocking)
//!  ├─ 3. Normalize   lowercase, strip punctuation/digits/stopwords
//!  ├─ 4. Vectorize   TF-IDF against the fitted vocabulary
//!  ├─ 5. Predict     class probabilities from the fitted model
//!  └─ 6. Output      arg-max label + probabilities rounded to 4 places
//! ```
//!
//! A failure in steps 1–2 short-circuits: the result carries an
//! `Error processing PDF: ...` label and no probabilities.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf_classifier::{ClassifierConfig, PdfClassifier};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads models/*.json; downloads pdfium on first run.
//!     let config = ClassifierConfig::default();
//!     let classifier = PdfClassifier::from_config(&config)?;
//!     let prediction = classifier.classify_url("https://example.com/fuse.pdf").await;
//!     println!("{}", prediction.label_text());
//!     println!("{}", serde_json::to_string(&prediction.probabilities())?);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `server` | on      | axum web form and JSON API ([`server`]) |
//! | `cli`    | on      | The `pdf-classifier` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Library-only use:
//! ```toml
//! pdf-classifier = { version = "0.1", default-features = false }
//! ```
//!
//! ## Model artifacts
//!
//! Three JSON files, exported together from the training environment:
//!
//! | File | Contents |
//! |------|----------|
//! | `tfidf_vectorizer.json` | vocabulary, idf weights, tokenizer and norm settings |
//! | `product_classifier_model.json` | `logistic_regression` or `multinomial_nb` parameters |
//! | `labels.json` | label names, in the model's class order |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod artifacts;
pub mod classify;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
#[cfg(feature = "server")]
pub mod server;
pub mod templates;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use artifacts::Artifacts;
pub use classify::{classify_url_sync, pdfium_locator, PdfClassifier};
pub use config::{ClassifierConfig, ClassifierConfigBuilder};
pub use error::{ClassifierError, ExtractionError, ERROR_MARKER};
pub use output::{Classification, LabelProbabilities, Prediction};
pub use pipeline::extract::{PdfTextReader, PdfiumTextReader};
pub use pipeline::normalize::normalize;
