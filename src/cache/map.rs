//! Unbounded map-backed cache.

use std::hash::Hash;

use ahash::AHashMap;

use crate::cache::Cache;
use crate::error::Result;

/// A cache that never evicts.
///
/// Useful where the key space is known to be small, or as a stand-in for an
/// [`LruCache`](crate::cache::lru::LruCache) in tests.
#[derive(Debug, Clone, Default)]
pub struct MapCache<K, V> {
    entries: AHashMap<K, V>,
}

impl<K, V> MapCache<K, V>
where
    K: Hash + Eq,
    V: Clone,
{
    /// Create an empty cache.
    pub fn new() -> Self {
        MapCache {
            entries: AHashMap::new(),
        }
    }

    /// Iterate over the cached keys in arbitrary order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.keys()
    }
}

impl<K, V> Cache<K, V> for MapCache<K, V>
where
    K: Hash + Eq,
    V: Clone,
{
    fn put(&mut self, key: K, value: V) {
        self.entries.insert(key, value);
    }

    fn get(&mut self, key: &K) -> Option<V> {
        self.entries.get(key).cloned()
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
