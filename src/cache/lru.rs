//! Least-recently-used cache.
//!
//! Recency is tracked with a logical clock: every hit or insertion stamps
//! the entry with the next clock value. A `BTreeMap` keyed by stamp gives the
//! eviction candidate in `O(log n)`, and a hash index keyed by the cache key
//! gives `O(1)` lookups.

use std::collections::BTreeMap;
use std::hash::Hash;
use std::mem;

use ahash::AHashMap;
use log::trace;

use crate::cache::{Cache, CacheStats};
use crate::error::{Result, SegdelError};

#[derive(Debug, Clone)]
struct LruEntry<V> {
    value: V,
    last_access: u64,
}

/// A bounded cache evicting the least-recently-used entry when full.
#[derive(Debug, Clone)]
pub struct LruCache<K, V> {
    /// Maximum number of entries.
    capacity: usize,

    /// Cached values by key.
    entries: AHashMap<K, LruEntry<V>>,

    /// Keys by last access stamp, oldest first.
    recency: BTreeMap<u64, K>,

    /// Logical access clock.
    clock: u64,

    /// Cache statistics.
    stats: CacheStats,
}

impl<K, V> LruCache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Create a new cache holding at most `capacity` entries.
    ///
    /// A zero capacity is rejected.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(SegdelError::invalid_argument(
                "LRU cache capacity must be positive",
            ));
        }

        Ok(LruCache {
            capacity,
            entries: AHashMap::with_capacity(capacity.min(1024)),
            recency: BTreeMap::new(),
            clock: 0,
            stats: CacheStats::default(),
        })
    }

    /// Get the configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get a snapshot of the cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats.clone()
    }

    /// Remove every entry. Statistics are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.recency.clear();
    }

    fn next_stamp(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn evict_least_recent(&mut self) {
        if let Some((stamp, key)) = self.recency.pop_first() {
            self.entries.remove(&key);
            self.stats.evictions += 1;
            trace!(
                "evicted cache entry last used at {stamp} (capacity {})",
                self.capacity
            );
        }
    }
}

impl<K, V> Cache<K, V> for LruCache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    fn put(&mut self, key: K, value: V) {
        let now = self.next_stamp();

        if let Some(entry) = self.entries.get_mut(&key) {
            entry.value = value;
            let previous = mem::replace(&mut entry.last_access, now);
            self.recency.remove(&previous);
            self.recency.insert(now, key);
            return;
        }

        if self.entries.len() >= self.capacity {
            self.evict_least_recent();
        }

        self.recency.insert(now, key.clone());
        self.entries.insert(
            key,
            LruEntry {
                value,
                last_access: now,
            },
        );
    }

    fn get(&mut self, key: &K) -> Option<V> {
        match self.entries.get_mut(key) {
            Some(entry) => {
                self.clock += 1;
                let previous = mem::replace(&mut entry.last_access, self.clock);
                if let Some(k) = self.recency.remove(&previous) {
                    self.recency.insert(self.clock, k);
                }
                self.stats.hits += 1;
                Some(entry.value.clone())
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}
