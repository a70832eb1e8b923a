//! Pipeline stages for PDF classification.
//!
//! Each submodule implements exactly one transformation step so each can be
//! tested on its own.
//!
//! ## Data Flow
//!
//! ```text
//! fetch ──▶ extract ──▶ normalize ──▶ vectorize ──▶ model
//! (URL)     (pdfium)    (tokens)      (TF-IDF)      (probabilities)
//! ```
//!
//! 1. [`fetch`]     — GET the URL and stage the body in a `TempDir`
//! 2. [`extract`]   — read every page's text; runs in `spawn_blocking`
//! 3. [`normalize`] — lowercase, strip punctuation and digits, drop
//!    [`stopwords`]
//! 4. [`vectorize`] — fitted TF-IDF transform into a [`vectorize::SparseVector`]
//! 5. [`model`]     — fitted classifier producing per-class probabilities

pub mod extract;
pub mod fetch;
pub mod model;
pub mod normalize;
pub mod stopwords;
pub mod vectorize;
