//! Text normalization applied to extracted PDF text before vectorizing.
//!
//! ## Rule Order
//!
//! The passes run in a fixed order: lowercase first so the stopword lookup
//! sees lowercase tokens, punctuation before digits so `"12-34"` becomes two
//! separate digit runs, and stopword removal last, on whole tokens.
//!
//! `\w` and `\d` use the `regex` crate's Unicode classes: word chars are
//! letters, marks, decimal digits and connector punctuation. Other numerics
//! such as `²` or `½` count as punctuation and become spaces.

use super::stopwords::is_stopword;
use once_cell::sync::Lazy;
use regex::Regex;

static RE_NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").unwrap());

static RE_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

/// Normalize raw document text into a space-separated token string.
///
/// 1. Lowercase
/// 2. Replace every char that is neither a word char nor whitespace with a space
/// 3. Replace every digit run with a space
/// 4. Split on whitespace
/// 5. Drop English stopwords
/// 6. Join the surviving tokens with single spaces
///
/// Total over all inputs; `""` maps to `""`. Applying it twice gives the
/// same result as applying it once.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let no_punct = RE_NON_WORD.replace_all(&lowered, " ");
    let no_digits = RE_DIGITS.replace_all(&no_punct, " ");
    no_digits
        .split_whitespace()
        .filter(|token| !is_stopword(token))
        .collect::<Vec<_>>()
        .join(" ")
}
