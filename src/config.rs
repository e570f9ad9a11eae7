//! Configuration for cache registries and token indexes.
//!
//! Both configs follow the same builder pattern: start from `new()`,
//! chain setters, finish with `build()`.

use crate::tokenizer::{SimpleTokenizer, DEFAULT_STOP_WORDS};

/// Default size bound for a cache created by a registry (10 MiB).
pub const DEFAULT_MAX_SIZE_BYTES: u64 = 10 * 1024 * 1024;

/// Default minimum token length in characters.
pub const DEFAULT_MIN_TOKEN_CHARS: usize = 3;

/// Default capacity of each token's result set.
pub const DEFAULT_MAX_ENTRIES_PER_KEY: usize = 100;

/// Configuration for a [`CacheRegistry`](crate::CacheRegistry).
///
/// ```
/// use annotated_disk_cache::CacheConfig;
///
/// let config = CacheConfig::new()
///     .default_max_size(64 * 1024 * 1024)
///     .app_version(2)
///     .build();
/// assert_eq!(config.get_app_version(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Size bound in bytes for instances without a per-name override.
    pub(crate) default_max_size: u64,

    /// Version written to each store; a mismatch on open wipes the store.
    pub(crate) app_version: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_max_size: DEFAULT_MAX_SIZE_BYTES,
            app_version: 1,
        }
    }
}

impl CacheConfig {
    /// Create a new configuration builder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default size bound of newly created caches.
    ///
    /// A value of 0 falls back to [`DEFAULT_MAX_SIZE_BYTES`].
    pub fn default_max_size(mut self, bytes: u64) -> Self {
        self.default_max_size = if bytes == 0 {
            DEFAULT_MAX_SIZE_BYTES
        } else {
            bytes
        };
        self
    }

    /// Set the application version stamped on each store.
    pub fn app_version(mut self, version: u32) -> Self {
        self.app_version = version;
        self
    }

    /// Build the final configuration.
    pub fn build(self) -> Self {
        self
    }

    /// Get the default size bound.
    pub fn get_default_max_size(&self) -> u64 {
        self.default_max_size
    }

    /// Get the application version.
    pub fn get_app_version(&self) -> u32 {
        self.app_version
    }
}

/// Configuration for a [`BoundedTokenIndex`](crate::BoundedTokenIndex).
#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// Tokens with fewer characters than this are dropped.
    pub(crate) min_token_chars: usize,

    /// Capacity of each token's bounded-FIFO-set.
    pub(crate) max_entries_per_key: usize,

    /// Tokens matching one of these (as-is or lower-cased) are dropped.
    pub(crate) stop_words: Vec<String>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            min_token_chars: DEFAULT_MIN_TOKEN_CHARS,
            max_entries_per_key: DEFAULT_MAX_ENTRIES_PER_KEY,
            stop_words: DEFAULT_STOP_WORDS.iter().map(|w| w.to_string()).collect(),
        }
    }
}

impl IndexConfig {
    /// Create a new configuration builder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum token length in characters.
    pub fn min_token_chars(mut self, chars: usize) -> Self {
        self.min_token_chars = chars;
        self
    }

    /// Set the per-token capacity. Zero is rejected when the index is built.
    pub fn max_entries_per_key(mut self, max: usize) -> Self {
        self.max_entries_per_key = max;
        self
    }

    /// Replace the stop-word list.
    pub fn stop_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stop_words = words.into_iter().map(Into::into).collect();
        self
    }

    /// Build the final configuration.
    pub fn build(self) -> Self {
        self
    }

    /// Get the minimum token length.
    pub fn get_min_token_chars(&self) -> usize {
        self.min_token_chars
    }

    /// Get the per-token capacity.
    pub fn get_max_entries_per_key(&self) -> usize {
        self.max_entries_per_key
    }

    /// Create the tokenizer described by this configuration.
    pub fn build_tokenizer(&self) -> SimpleTokenizer {
        SimpleTokenizer::with_stop_words(self.min_token_chars, self.stop_words.iter().cloned())
    }
}
