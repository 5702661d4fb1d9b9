//! Thread-safe cache decorator.

use std::marker::PhantomData;

use parking_lot::Mutex;

use crate::cache::Cache;
use crate::error::Result;

/// Serializes every operation of the wrapped cache behind a single mutex.
///
/// The plain caches stay lock-free for single-threaded owners; wrap one in
/// this decorator (usually inside an `Arc`) to share it.
#[derive(Debug)]
pub struct SynchronizedCache<K, V, C> {
    inner: Mutex<C>,
    _marker: PhantomData<fn(K) -> V>,
}

impl<K, V, C> SynchronizedCache<K, V, C>
where
    C: Cache<K, V>,
{
    /// Wrap a cache.
    pub fn new(cache: C) -> Self {
        SynchronizedCache {
            inner: Mutex::new(cache),
            _marker: PhantomData,
        }
    }

    /// Unwrap the cache.
    pub fn into_inner(self) -> C {
        self.inner.into_inner()
    }

    /// Run a closure with exclusive access to the wrapped cache.
    pub fn with_inner<R>(&self, f: impl FnOnce(&mut C) -> R) -> R {
        let mut cache = self.inner.lock();
        f(&mut cache)
    }

    /// Insert or overwrite a value.
    pub fn put(&self, key: K, value: V) {
        self.inner.lock().put(key, value);
    }

    /// Look up a value.
    pub fn get(&self, key: &K) -> Option<V> {
        self.inner.lock().get(key)
    }

    /// Check whether a key is cached.
    pub fn contains_key(&self, key: &K) -> bool {
        self.inner.lock().contains_key(key)
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Check if the wrapped cache is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Close the wrapped cache.
    pub fn close(&self) -> Result<()> {
        self.inner.lock().close()
    }
}

impl<K, V, C> Cache<K, V> for SynchronizedCache<K, V, C>
where
    C: Cache<K, V>,
{
    fn put(&mut self, key: K, value: V) {
        self.inner.get_mut().put(key, value);
    }

    fn get(&mut self, key: &K) -> Option<V> {
        self.inner.get_mut().get(key)
    }

    fn contains_key(&self, key: &K) -> bool {
        self.inner.lock().contains_key(key)
    }

    fn len(&self) -> usize {
        self.inner.lock().len()
    }

    fn close(&mut self) -> Result<()> {
        self.inner.get_mut().close()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;
    use crate::cache::lru::LruCache;

    type SharedLru = SynchronizedCache<u64, u64, LruCache<u64, u64>>;

    #[test]
    fn test_shared_across_threads() {
        let cache: Arc<SharedLru> = Arc::new(SynchronizedCache::new(LruCache::new(64).unwrap()));

        let handles: Vec<_> = (0..4u64)
            .map(|t| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for i in 0..500 {
                        let key = t * 1_000 + i;
                        cache.put(key, key * 2);
                        assert!(cache.len() <= 64);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cache.len(), 64);
        cache.with_inner(|inner| assert_eq!(inner.stats().evictions, 2_000 - 64));
    }

    #[test]
    fn test_trait_object_use() {
        let lru = LruCache::<&str, u32>::new(2).unwrap();
        let mut cache: Box<dyn Cache<&str, u32>> = Box::new(SynchronizedCache::new(lru));
        cache.put("a", 1);
        cache.put("b", 2);
        assert_eq!(cache.get(&"a"), Some(1));
        cache.put("c", 3);
        assert!(!cache.contains_key(&"b"));
        assert!(cache.close().is_ok());
    }
}
