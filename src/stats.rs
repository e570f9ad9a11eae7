//! Statistics for a cache instance.
//!
//! Atomic counters for reads, writes and failures, readable from any thread
//! without taking the cache's write lock.

use std::sync::atomic::{AtomicU64, Ordering};

/// Operation counters for one [`AnnotatedCache`](crate::AnnotatedCache).
///
/// Use `AnnotatedCache::stats()` to get a snapshot.
#[derive(Debug, Default)]
pub struct CacheStats {
    /// Reads that found a committed entry.
    hits: AtomicU64,

    /// Reads that found nothing.
    misses: AtomicU64,

    /// Entries committed.
    writes: AtomicU64,

    /// `put_*_if_none` calls skipped because an entry already existed.
    skipped_writes: AtomicU64,

    /// Edits aborted because a slot write failed.
    failed_writes: AtomicU64,

    /// Writes refused because another edit was outstanding.
    conflicts: AtomicU64,

    /// Entries removed by `remove`.
    removals: AtomicU64,
}

impl CacheStats {
    /// Create a new stats instance with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skipped_write(&self) {
        self.skipped_writes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed_write(&self) {
        self.failed_writes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_conflict(&self) {
        self.conflicts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_removal(&self) {
        self.removals.fetch_add(1, Ordering::Relaxed);
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    pub fn skipped_writes(&self) -> u64 {
        self.skipped_writes.load(Ordering::Relaxed)
    }

    pub fn failed_writes(&self) -> u64 {
        self.failed_writes.load(Ordering::Relaxed)
    }

    pub fn conflicts(&self) -> u64 {
        self.conflicts.load(Ordering::Relaxed)
    }

    pub fn removals(&self) -> u64 {
        self.removals.load(Ordering::Relaxed)
    }

    /// Calculate the hit rate as a percentage (0.0 to 100.0).
    /// Returns 0.0 if no reads have been performed.
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits();
        let total = hits + self.misses();
        if total == 0 {
            0.0
        } else {
            (hits as f64 / total as f64) * 100.0
        }
    }

    /// Create a snapshot of the counters together with the store's sizes.
    pub fn snapshot(&self, size: u64, max_size: u64) -> StatsSnapshot {
        StatsSnapshot {
            hits: self.hits(),
            misses: self.misses(),
            writes: self.writes(),
            skipped_writes: self.skipped_writes(),
            failed_writes: self.failed_writes(),
            conflicts: self.conflicts(),
            removals: self.removals(),
            size,
            max_size,
            hit_rate: self.hit_rate(),
        }
    }
}

/// A point-in-time snapshot of cache statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub writes: u64,
    pub skipped_writes: u64,
    pub failed_writes: u64,
    pub conflicts: u64,
    pub removals: u64,
    /// Bytes used by committed entries.
    pub size: u64,
    pub max_size: u64,
    pub hit_rate: f64,
}
