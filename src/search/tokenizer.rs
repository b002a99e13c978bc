//! Case folding and word tokenization.
//!
//! Tokens are maximal runs of two or more Unicode word characters, taken from
//! the lower-cased text. Single-character words never become terms.

use regex::Regex;
use std::sync::LazyLock;

use super::stop_words::StopWords;

static TOKEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("token pattern is a valid regex"));

/// Splits text into normalized terms, dropping stop words.
#[derive(Debug, Clone, Default)]
pub struct Tokenizer {
    stop_words: StopWords,
}

impl Tokenizer {
    pub fn new(stop_words: StopWords) -> Self {
        Self { stop_words }
    }

    pub fn stop_words(&self) -> &StopWords {
        &self.stop_words
    }

    /// Lower-case `text` and return its terms in order of appearance.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let folded = text.to_lowercase();
        TOKEN_PATTERN
            .find_iter(&folded)
            .map(|m| m.as_str())
            .filter(|term| !self.stop_words.contains(term))
            .map(str::to_string)
            .collect()
    }
}
