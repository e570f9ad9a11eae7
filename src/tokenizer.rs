//! Splitting of search phrases into index tokens.

use std::collections::HashSet;

/// Stop words dropped by [`SimpleTokenizer::new`].
pub const DEFAULT_STOP_WORDS: &[&str] = &[
    "the", "this", "that", "then", "those", "has", "have", "had", "her", "hers", "him", "his",
    "them", "it", "its", "you", "i", "we", "us", "my", "your", "yours", "our", "ours", "their",
    "theirs", "for", "of",
];

/// Turns a phrase into the tokens it is indexed and searched under.
pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, phrase: &str) -> Vec<String>;
}

/// Whitespace tokenizer with a minimum token length and a stop-word list.
///
/// Tokens keep their original casing and order. A token is dropped if it is
/// shorter than the minimum (counted in characters) or if it, or its
/// lower-cased form, is a stop word.
///
/// ```
/// use annotated_disk_cache::{SimpleTokenizer, Tokenizer};
///
/// let tokenizer = SimpleTokenizer::with_stop_words(3, ["the"]);
/// assert_eq!(tokenizer.tokenize("The Quick fox jumps"), ["Quick", "fox", "jumps"]);
/// ```
#[derive(Debug, Clone)]
pub struct SimpleTokenizer {
    min_chars: usize,
    stop_words: HashSet<String>,
}

impl SimpleTokenizer {
    /// Tokenizer using [`DEFAULT_STOP_WORDS`].
    pub fn new(min_chars: usize) -> Self {
        Self::with_stop_words(min_chars, DEFAULT_STOP_WORDS.iter().copied())
    }

    pub fn with_stop_words<I, S>(min_chars: usize, stop_words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            min_chars,
            stop_words: stop_words.into_iter().map(Into::into).collect(),
        }
    }

    pub fn min_chars(&self) -> usize {
        self.min_chars
    }

    pub fn is_stop_word(&self, word: &str) -> bool {
        self.stop_words.contains(word) || self.stop_words.contains(&word.to_lowercase())
    }
}

impl Default for SimpleTokenizer {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_MIN_TOKEN_CHARS)
    }
}

impl Tokenizer for SimpleTokenizer {
    fn tokenize(&self, phrase: &str) -> Vec<String> {
        phrase
            .split_whitespace()
            .filter(|word| word.chars().count() >= self.min_chars)
            .filter(|word| !self.is_stop_word(word))
            .map(str::to_string)
            .collect()
    }
}

/// Indexes a phrase as a single token, unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct WholePhrase;

impl Tokenizer for WholePhrase {
    fn tokenize(&self, phrase: &str) -> Vec<String> {
        if phrase.is_empty() {
            Vec::new()
        } else {
            vec![phrase.to_string()]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drops_short_and_stop_words() {
        let tokenizer = SimpleTokenizer::with_stop_words(3, ["the"]);
        assert_eq!(tokenizer.tokenize("The Quick fox jumps"), vec!["Quick", "fox", "jumps"]);
    }

    #[test]
    fn test_default_stop_words_are_case_insensitive() {
        let tokenizer = SimpleTokenizer::new(1);
        assert_eq!(tokenizer.tokenize("THEIR cat and HIS dog"), vec!["cat", "and", "dog"]);
    }

    #[test]
    fn test_splits_on_any_whitespace() {
        let tokenizer = SimpleTokenizer::with_stop_words(1, Vec::<String>::new());
        assert_eq!(tokenizer.tokenize("  a\tb\n\nc  "), vec!["a", "b", "c"]);
        assert!(tokenizer.tokenize("   ").is_empty());
        assert!(tokenizer.tokenize("").is_empty());
    }

    #[test]
    fn test_min_length_counts_characters() {
        let tokenizer = SimpleTokenizer::with_stop_words(3, Vec::<String>::new());
        assert_eq!(tokenizer.tokenize("été ok"), vec!["été"]);
    }

    #[test]
    fn test_whole_phrase() {
        assert_eq!(WholePhrase.tokenize("red apple pie"), vec!["red apple pie"]);
        assert!(WholePhrase.tokenize("").is_empty());
    }
}
