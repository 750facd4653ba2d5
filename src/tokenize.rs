//! Text tokenization and stemming for index entry extraction.

use regex::Regex;
use std::collections::HashSet;

/// Tokens at or above this length are rejected; nothing a human searches for
/// is this long, and unbounded tokens would blow up bucket file keys.
const MAX_TOKEN_LENGTH: usize = 100;

/// Splits text field values into index tokens.
///
/// The rules are fixed for one build and must match what the search front-end
/// applies to queries: lowercase, runs of ASCII alphanumerics of length ≥ 2,
/// stop words dropped, and a trailing-`s` stem for tokens longer than three
/// characters. Stop words are filtered again after stemming: `servers` stems
/// to `server`, and a stop word must never reach the index.
#[derive(Debug)]
pub struct Tokenizer {
    run: Regex,
    stop_words: HashSet<String>,
}

impl Tokenizer {
    /// Build a tokenizer over the given stop-word set.
    pub fn new(stop_words: HashSet<String>) -> Self {
        Self {
            // Leftmost-longest matching makes each match a maximal run, so
            // one-character runs are skipped rather than re-split.
            run: Regex::new("[a-z0-9]{2,}").unwrap(),
            stop_words,
        }
    }

    /// Tokenize one text value. Repeated tokens are kept; the index counts
    /// one pointer per occurrence-bearing field value.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        self.run
            .find_iter(&lowered)
            .map(|m| m.as_str())
            .filter(|word| word.len() < MAX_TOKEN_LENGTH && !self.stop_words.contains(*word))
            .map(stem)
            .filter(|word| !self.stop_words.contains(word))
            .collect()
    }
}

/// Strip one trailing `s` from words longer than three characters.
///
/// A deliberately crude stem: it folds `servers`/`server` and `tags`/`tag`
/// without an algorithmic stemmer the front-end would have to replicate.
fn stem(word: &str) -> String {
    if word.len() > 3 && word.ends_with('s') {
        word[..word.len() - 1].to_string()
    } else {
        word.to_string()
    }
}
