//! Bounded and unbounded lookup caches.
//!
//! Any component that needs a memory-bounded lookup table (per-term
//! filters, parsed queries, term metadata) can hold one of these behind the
//! [`Cache`] trait. None of the implementations are thread-safe; wrap one in
//! [`synchronized::SynchronizedCache`] to share it across threads.

pub mod lru;
pub mod map;
pub mod synchronized;

use crate::error::Result;

/// Common interface of every cache implementation.
pub trait Cache<K, V> {
    /// Insert or overwrite a value.
    fn put(&mut self, key: K, value: V);

    /// Look up a value, refreshing its recency when present.
    ///
    /// A miss has no side effects on the cached entries.
    fn get(&mut self, key: &K) -> Option<V>;

    /// Check whether a key is cached without touching its recency.
    fn contains_key(&self, key: &K) -> bool;

    /// Number of cached entries.
    fn len(&self) -> usize;

    /// Check if the cache holds no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Release any resources held by the cache.
    fn close(&mut self) -> Result<()>;
}

/// Cache performance statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,

    /// Number of cache misses.
    pub misses: u64,

    /// Number of entries evicted to honor the capacity.
    pub evictions: u64,
}

impl CacheStats {
    /// Calculate hit ratio.
    pub fn hit_ratio(&self) -> f64 {
        if self.hits + self.misses == 0 {
            0.0
        } else {
            self.hits as f64 / (self.hits + self.misses) as f64
        }
    }
}
