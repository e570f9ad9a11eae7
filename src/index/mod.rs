//! Bounded inverted index from search tokens to values.
//!
//! [`BoundedTokenIndex`] tokenizes phrases and keeps, per token, an
//! insertion-ordered set of values capped at `max_entries_per_key`. When a
//! set overflows, its oldest members are evicted first. Searches walk the
//! tokens of a phrase in order and page through their sets with one global
//! offset and limit.
//!
//! The sets live in a [`TokenMapping`]: [`MemoryMapping`] for a process-local
//! index, [`CacheMapping`] to persist them in an [`AnnotatedCache`](crate::AnnotatedCache).

pub mod collect;
mod disk;
mod memory;

pub use collect::{DistinctCollector, IndexConsumer, ListCollector, MapCollector, RangeCollector};
pub use disk::CacheMapping;
pub use memory::MemoryMapping;

use indexmap::{IndexMap, IndexSet};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, trace};

use crate::cache::AnnotatedCache;
use crate::config::IndexConfig;
use crate::error::{CacheError, CacheResult, IndexResult};
use crate::storage::{BackingStore, FsStore};
use crate::tokenizer::Tokenizer;

/// Number of per-token lock stripes.
const LOCK_STRIPES: usize = 16;

/// Storage for the per-token value sets.
pub trait TokenMapping<T>: Send + Sync {
    /// The set stored for `token`, if any.
    fn load(&self, token: &str) -> CacheResult<Option<IndexSet<T>>>;

    /// Replace the set stored for `token`.
    fn store(&self, token: &str, values: &IndexSet<T>) -> CacheResult<()>;

    fn clear(&self) -> CacheResult<()>;

    fn flush(&self) -> CacheResult<()>;

    fn close(&self) -> CacheResult<()>;

    fn is_closed(&self) -> bool;
}

/// Index kept in memory.
pub type MemoryIndex<T> = BoundedTokenIndex<T, MemoryMapping<T>>;

/// Index persisted in an [`AnnotatedCache`].
pub type DiskIndex<T, S = FsStore> = BoundedTokenIndex<T, CacheMapping<S>>;

/// Token index with a bounded, insertion-ordered value set per token.
///
/// # Example
/// ```
/// use annotated_disk_cache::{IndexConfig, MemoryIndex};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let index: MemoryIndex<u64> = MemoryIndex::in_memory(&IndexConfig::new().max_entries_per_key(2))?;
/// index.index("red apples", &[1, 2, 3])?;
///
/// let found = index.find("apples", 0, 10)?;
/// assert_eq!(found["apples"], vec![2, 3]);
/// # Ok(())
/// # }
/// ```
pub struct BoundedTokenIndex<T, M = MemoryMapping<T>> {
    mapping: M,
    tokenizer: Box<dyn Tokenizer>,
    max_entries_per_key: usize,

    /// Serializes load-modify-store per token.
    stripes: Vec<Mutex<()>>,

    _values: PhantomData<fn() -> T>,
}

impl<T, M> BoundedTokenIndex<T, M>
where
    T: Clone + Eq + Hash,
    M: TokenMapping<T>,
{
    /// Create an index over `mapping`.
    ///
    /// Fails with [`CacheError::InvalidConfig`] if `max_entries_per_key` is 0.
    pub fn new(
        mapping: M,
        tokenizer: impl Tokenizer + 'static,
        max_entries_per_key: usize,
    ) -> IndexResult<Self> {
        if max_entries_per_key < 1 {
            return Err(CacheError::InvalidConfig("max entries per key must be >= 1".to_string()).into());
        }
        Ok(Self {
            mapping,
            tokenizer: Box::new(tokenizer),
            max_entries_per_key,
            stripes: (0..LOCK_STRIPES).map(|_| Mutex::new(())).collect(),
            _values: PhantomData,
        })
    }

    /// Create an index over `mapping` with the tokenizer and capacity of `config`.
    pub fn with_config(mapping: M, config: &IndexConfig) -> IndexResult<Self> {
        Self::new(mapping, config.build_tokenizer(), config.max_entries_per_key)
    }

    // Indexing

    /// Add `values` under every token of `phrase`.
    ///
    /// Returns the sum of [`index_token`](Self::index_token) results, which
    /// is an upper bound rather than a count of new insertions.
    pub fn index(&self, phrase: &str, values: &[T]) -> IndexResult<usize> {
        if phrase.is_empty() {
            return Ok(0);
        }
        let tokens = self.tokenizer.tokenize(phrase);
        self.index_tokens(&tokens, values)
    }

    pub fn index_tokens<S: AsRef<str>>(&self, tokens: &[S], values: &[T]) -> IndexResult<usize> {
        let mut added = 0;
        for token in tokens {
            added += self.index_token(token.as_ref(), values)?;
        }
        debug!(tokens = tokens.len(), values = values.len(), added, "indexed values");
        Ok(added)
    }

    /// Add `values` to the set of `token`.
    ///
    /// Values already present keep their position. The oldest members are
    /// evicted while the set exceeds its capacity. Returns
    /// `min(values.len(), max_entries_per_key)`.
    pub fn index_token(&self, token: &str, values: &[T]) -> IndexResult<usize> {
        self.ensure_open()?;
        if values.is_empty() {
            return Ok(0);
        }

        let _guard = self.lock_token(token);
        let mut set = self
            .mapping
            .load(token)?
            .unwrap_or_else(|| IndexSet::with_capacity(self.max_entries_per_key));
        set.extend(values.iter().cloned());
        if set.len() > self.max_entries_per_key {
            let excess = set.len() - self.max_entries_per_key;
            set.drain(..excess);
        }
        self.mapping.store(token, &set)?;

        let added = values.len().min(self.max_entries_per_key);
        trace!(token, added, size = set.len(), "indexed token");
        Ok(added)
    }

    // Searching

    /// Search `phrase`, grouping results by token in token order.
    pub fn find(&self, phrase: &str, offset: usize, limit: usize) -> IndexResult<IndexMap<String, Vec<T>>> {
        let tokens = self.tokenizer.tokenize(phrase);
        self.find_tokens(&tokens, offset, limit)
    }

    pub fn find_tokens<S: AsRef<str>>(
        &self,
        tokens: &[S],
        offset: usize,
        limit: usize,
    ) -> IndexResult<IndexMap<String, Vec<T>>> {
        let mut collector = MapCollector::new();
        self.find_tokens_with(tokens, &mut collector, offset, limit)?;
        Ok(collector.into_map())
    }

    /// Search `phrase`, feeding results to `collector`. Returns the number accepted.
    pub fn find_with<C>(&self, phrase: &str, collector: &mut C, offset: usize, limit: usize) -> IndexResult<usize>
    where
        C: IndexConsumer<T> + ?Sized,
    {
        let tokens = self.tokenizer.tokenize(phrase);
        self.find_tokens_with(&tokens, collector, offset, limit)
    }

    /// Search `tokens` in order with one offset and limit spanning all of them.
    pub fn find_tokens_with<S, C>(
        &self,
        tokens: &[S],
        collector: &mut C,
        offset: usize,
        limit: usize,
    ) -> IndexResult<usize>
    where
        S: AsRef<str>,
        C: IndexConsumer<T> + ?Sized,
    {
        let mut range = RangeCollector::new(collector, offset, limit);
        let mut collected = 0;
        for token in tokens {
            let to_find = limit.saturating_sub(collected);
            if to_find == 0 {
                break;
            }
            collected += self.find_token(token.as_ref(), &mut range, 0, to_find)?;
        }
        debug!(tokens = tokens.len(), offset, limit, collected, "searched tokens");
        Ok(collected)
    }

    /// Offer the values of `token`, skipping the first `offset`, until
    /// `limit` were accepted. Returns the number accepted.
    pub fn find_token<C>(&self, token: &str, collector: &mut C, offset: usize, limit: usize) -> IndexResult<usize>
    where
        C: IndexConsumer<T> + ?Sized,
    {
        self.ensure_open()?;
        let set = {
            let _guard = self.lock_token(token);
            self.mapping.load(token)?
        };
        let set = match set {
            Some(set) => set,
            None => return Ok(0),
        };

        let mut collected = 0;
        for value in set.iter().skip(offset) {
            if collected >= limit {
                break;
            }
            if collector.accept(token, value) {
                collected += 1;
            }
        }
        trace!(token, offset, limit, collected, "searched token");
        Ok(collected)
    }

    // Lifecycle

    /// Drop every token set.
    pub fn clear(&self) -> IndexResult<()> {
        self.ensure_open()?;
        self.mapping.clear()?;
        Ok(())
    }

    pub fn flush(&self) -> IndexResult<()> {
        self.mapping.flush()?;
        Ok(())
    }

    pub fn close(&self) -> IndexResult<()> {
        self.mapping.close()?;
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.mapping.is_closed()
    }

    pub fn max_entries_per_key(&self) -> usize {
        self.max_entries_per_key
    }

    pub fn mapping(&self) -> &M {
        &self.mapping
    }

    fn ensure_open(&self) -> IndexResult<()> {
        if self.mapping.is_closed() {
            return Err(CacheError::Closed.into());
        }
        Ok(())
    }

    fn lock_token(&self, token: &str) -> MutexGuard<'_, ()> {
        let mut hasher = DefaultHasher::new();
        token.hash(&mut hasher);
        let stripe = (hasher.finish() as usize) % self.stripes.len();
        self.stripes[stripe].lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> BoundedTokenIndex<T, MemoryMapping<T>>
where
    T: Clone + Eq + Hash + Send + Sync,
{
    /// In-memory index configured by `config`.
    pub fn in_memory(config: &IndexConfig) -> IndexResult<Self> {
        Self::with_config(MemoryMapping::new(), config)
    }
}

impl<T, S> BoundedTokenIndex<T, CacheMapping<S>>
where
    T: Clone + Eq + Hash + serde::Serialize + serde::de::DeserializeOwned,
    S: BackingStore,
{
    /// Index persisted in `cache`, configured by `config`.
    pub fn on_disk(cache: Arc<AnnotatedCache<S>>, config: &IndexConfig) -> IndexResult<Self> {
        Self::with_config(CacheMapping::new(cache), config)
    }
}

impl<T, M: fmt::Debug> fmt::Debug for BoundedTokenIndex<T, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedTokenIndex")
            .field("mapping", &self.mapping)
            .field("max_entries_per_key", &self.max_entries_per_key)
            .finish()
    }
}
