//! Token sets held in process memory.

use indexmap::IndexSet;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};

use crate::error::{CacheError, CacheResult};
use crate::index::TokenMapping;

/// [`TokenMapping`] backed by a `HashMap`. Nothing survives the process.
#[derive(Debug)]
pub struct MemoryMapping<T> {
    sets: RwLock<HashMap<String, IndexSet<T>>>,
    closed: AtomicBool,
}

impl<T> MemoryMapping<T> {
    pub fn new() -> Self {
        Self {
            sets: RwLock::new(HashMap::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// Number of tokens with a stored set.
    pub fn token_count(&self) -> usize {
        self.sets.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn ensure_open(&self) -> CacheResult<()> {
        if self.closed.load(Ordering::Acquire) {
            Err(CacheError::Closed)
        } else {
            Ok(())
        }
    }
}

impl<T> Default for MemoryMapping<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TokenMapping<T> for MemoryMapping<T>
where
    T: Clone + Eq + Hash + Send + Sync,
{
    fn load(&self, token: &str) -> CacheResult<Option<IndexSet<T>>> {
        self.ensure_open()?;
        let sets = self.sets.read().unwrap_or_else(PoisonError::into_inner);
        Ok(sets.get(token).cloned())
    }

    fn store(&self, token: &str, values: &IndexSet<T>) -> CacheResult<()> {
        self.ensure_open()?;
        let mut sets = self.sets.write().unwrap_or_else(PoisonError::into_inner);
        sets.insert(token.to_string(), values.clone());
        Ok(())
    }

    fn clear(&self) -> CacheResult<()> {
        self.ensure_open()?;
        self.sets.write().unwrap_or_else(PoisonError::into_inner).clear();
        Ok(())
    }

    fn flush(&self) -> CacheResult<()> {
        Ok(())
    }

    fn close(&self) -> CacheResult<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}
