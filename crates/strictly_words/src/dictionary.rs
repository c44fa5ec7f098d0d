//! The dictionary oracle contract and an in-memory word list.

use async_trait::async_trait;
use std::collections::HashSet;
use std::io::BufRead;
use tracing::{debug, info, instrument};

/// Shortest word the oracle will accept.
pub const MIN_WORD_LEN: usize = 2;

/// Reasons a lookup could not produce an answer.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum DictionaryError {
    /// Lookup attempted before the word list was loaded.
    #[display("Dictionary is not loaded")]
    NotLoaded,
    /// Lookup did not finish in time.
    #[display("Dictionary lookup timed out")]
    Timeout,
    /// Backend failed.
    #[display("Dictionary unavailable: {}", _0)]
    Unavailable(String),
    /// Reading the word list failed.
    #[display("Failed to read word list: {}", _0)]
    Io(String),
}

impl std::error::Error for DictionaryError {}

impl From<std::io::Error> for DictionaryError {
    fn from(err: std::io::Error) -> Self {
        DictionaryError::Io(err.to_string())
    }
}

/// Answers whether a string is a valid word.
///
/// Implementations are shared between games and must be safe to call
/// concurrently.
#[async_trait]
pub trait Dictionary: Send + Sync {
    /// True once the oracle can answer lookups.
    fn is_ready(&self) -> bool;

    /// Case-insensitive membership test.
    async fn contains(&self, word: &str) -> Result<bool, DictionaryError>;
}

/// Checks a candidate word. Words shorter than [`MIN_WORD_LEN`] are invalid
/// without a lookup.
#[instrument(skip(dictionary))]
pub async fn is_valid_word(dictionary: &dyn Dictionary, word: &str) -> Result<bool, DictionaryError> {
    if word.chars().count() < MIN_WORD_LEN {
        return Ok(false);
    }
    dictionary.contains(word).await
}

/// A static word list held in memory.
#[derive(Debug, Clone, Default)]
pub struct WordList {
    words: HashSet<String>,
    loaded: bool,
}

impl WordList {
    /// Creates an empty list that is not ready until [`Self::load`] runs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a ready list from the given words.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = Self::new();
        list.extend(words);
        list.loaded = true;
        list
    }

    /// Reads one word per line, ignoring blank lines and surrounding
    /// whitespace, and marks the list ready.
    ///
    /// # Errors
    ///
    /// Returns [`DictionaryError::Io`] if reading fails. The list is left
    /// unchanged in that case.
    #[instrument(skip_all)]
    pub fn load<R: BufRead>(&mut self, reader: R) -> Result<usize, DictionaryError> {
        let lines = reader.lines().collect::<Result<Vec<_>, _>>()?;
        let before = self.words.len();
        self.extend(lines);
        self.loaded = true;
        let added = self.words.len() - before;
        info!(added, total = self.words.len(), "Word list loaded");
        Ok(added)
    }

    /// Number of distinct words.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// True if no words are held.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    fn extend<I, S>(&mut self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.words.extend(
            words
                .into_iter()
                .map(|w| w.as_ref().trim().to_ascii_uppercase())
                .filter(|w| !w.is_empty()),
        );
    }
}

#[async_trait]
impl Dictionary for WordList {
    fn is_ready(&self) -> bool {
        self.loaded
    }

    async fn contains(&self, word: &str) -> Result<bool, DictionaryError> {
        if !self.loaded {
            return Err(DictionaryError::NotLoaded);
        }
        let found = self.words.contains(&word.trim().to_ascii_uppercase());
        debug!(word, found, "Dictionary lookup");
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lookup_is_case_insensitive() {
        let list = WordList::from_words(["dog", "Cat"]);
        assert!(list.contains("DOG").await.unwrap());
        assert!(list.contains("cat").await.unwrap());
        assert!(!list.contains("cow").await.unwrap());
    }

    #[tokio::test]
    async fn test_not_loaded_fails() {
        let list = WordList::new();
        assert!(!list.is_ready());
        assert_eq!(list.contains("dog").await, Err(DictionaryError::NotLoaded));
    }

    #[tokio::test]
    async fn test_short_words_rejected_without_lookup() {
        let list = WordList::new();
        assert_eq!(is_valid_word(&list, "a").await, Ok(false));
        assert_eq!(is_valid_word(&list, "").await, Ok(false));
    }

    #[test]
    fn test_load_from_reader() {
        let mut list = WordList::new();
        let added = list.load("dog\n\n  cat \nDOG\n".as_bytes()).unwrap();
        assert_eq!(added, 2);
        assert!(list.is_ready());
        assert_eq!(list.len(), 2);
    }
}
