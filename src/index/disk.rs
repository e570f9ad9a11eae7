//! Token sets persisted in an [`AnnotatedCache`].
//!
//! Each token is one cache entry holding its set as an object payload, with
//! the set's length recorded in the `count` metadata field. An optional key
//! prefix lets the index share a cache with other entries.

use indexmap::IndexSet;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::hash::Hash;
use std::sync::Arc;

use crate::cache::AnnotatedCache;
use crate::entry::{metadata, MetaValue};
use crate::error::{CacheError, CacheResult};
use crate::index::TokenMapping;
use crate::storage::{BackingStore, FsStore};

/// [`TokenMapping`] that stores each token's set as a cache entry.
#[derive(Debug)]
pub struct CacheMapping<S: BackingStore = FsStore> {
    cache: Arc<AnnotatedCache<S>>,
    prefix: String,
}

impl<S: BackingStore> CacheMapping<S> {
    pub fn new(cache: Arc<AnnotatedCache<S>>) -> Self {
        Self::with_prefix(cache, "")
    }

    /// Store token `t` under the cache key `{prefix}{t}`.
    ///
    /// Keys are hashed on disk, so the prefixed entries cannot be told apart
    /// from the rest of the cache: [`clear`](TokenMapping::clear) on a
    /// prefixed mapping fails with [`CacheError::InvalidConfig`] instead of
    /// wiping entries it does not own.
    pub fn with_prefix(cache: Arc<AnnotatedCache<S>>, prefix: impl Into<String>) -> Self {
        Self {
            cache,
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn key_for(&self, token: &str) -> String {
        format!("{}{}", self.prefix, token)
    }

    pub fn cache(&self) -> &Arc<AnnotatedCache<S>> {
        &self.cache
    }
}

impl<T, S> TokenMapping<T> for CacheMapping<S>
where
    T: Serialize + DeserializeOwned + Eq + Hash,
    S: BackingStore,
{
    fn load(&self, token: &str) -> CacheResult<Option<IndexSet<T>>> {
        self.cache.get_object(&self.key_for(token))
    }

    fn store(&self, token: &str, values: &IndexSet<T>) -> CacheResult<()> {
        let count = i64::try_from(values.len()).unwrap_or(i64::MAX);
        self.cache
            .put_object(&self.key_for(token), values, &metadata([("count", MetaValue::from(count))]))
    }

    fn clear(&self) -> CacheResult<()> {
        if !self.prefix.is_empty() {
            return Err(CacheError::InvalidConfig(format!(
                "cannot clear index with prefix '{}' sharing its cache",
                self.prefix
            )));
        }
        self.cache.clear()
    }

    fn flush(&self) -> CacheResult<()> {
        self.cache.flush()
    }

    fn close(&self) -> CacheResult<()> {
        self.cache.close()
    }

    fn is_closed(&self) -> bool {
        self.cache.is_closed()
    }
}
