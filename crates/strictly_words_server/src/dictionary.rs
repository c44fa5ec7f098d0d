//! Word list loading and bounded lookups.

use async_trait::async_trait;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use strictly_words::{Dictionary, DictionaryError, WordList};
use tracing::{info, instrument, warn};

/// Reads a word list file, one word per line.
///
/// # Errors
///
/// [`DictionaryError::Io`] if the file cannot be read.
#[instrument(skip(path), fields(path = %path.as_ref().display()))]
pub fn load_word_list(path: impl AsRef<Path>) -> Result<WordList, DictionaryError> {
    let file = File::open(path.as_ref()).map_err(|e| {
        warn!(error = %e, "Cannot open word list");
        DictionaryError::Io(format!("{}: {}", path.as_ref().display(), e))
    })?;
    let mut list = WordList::new();
    list.load(BufReader::new(file))?;
    info!(words = list.len(), "Dictionary ready");
    Ok(list)
}

/// Wraps a dictionary so that no lookup waits longer than a fixed bound.
#[derive(Clone)]
pub struct TimedDictionary {
    inner: Arc<dyn Dictionary>,
    timeout: Duration,
}

impl TimedDictionary {
    /// Bounds every lookup on `inner` by `timeout`.
    pub fn new(inner: Arc<dyn Dictionary>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

impl std::fmt::Debug for TimedDictionary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimedDictionary")
            .field("ready", &self.inner.is_ready())
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[async_trait]
impl Dictionary for TimedDictionary {
    fn is_ready(&self) -> bool {
        self.inner.is_ready()
    }

    async fn contains(&self, word: &str) -> Result<bool, DictionaryError> {
        match tokio::time::timeout(self.timeout, self.inner.contains(word)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(word, timeout_ms = self.timeout.as_millis() as u64, "Dictionary lookup timed out");
                Err(DictionaryError::Timeout)
            }
        }
    }
}
