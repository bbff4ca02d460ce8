use crate::traits::CacheStats;
use lru::LruCache;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use super::{key::TileKey, tile::TextureTile};

/// Shared cache of tile objects keyed by tile identity.
pub type TextureTileCache = TileCache<TileKey, TextureTile>;

/// Thread-safe in-memory cache using LRU eviction
///
/// Values are handed out as `Arc`s, so an evicted entry stays alive for as long
/// as someone still holds it. Cloning the cache shares the underlying storage.
#[derive(Debug)]
pub struct TileCache<K: Hash + Eq, V> {
    cache: Arc<Mutex<LruCache<K, Arc<V>>>>,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
}

impl<K: Hash + Eq + Clone, V> TileCache<K, V> {
    /// Create a new cache with the given capacity
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Arc::new(Mutex::new(LruCache::new(capacity))),
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Create a new cache with default capacity
    pub fn with_default_capacity() -> Self {
        Self::new(crate::constants::DEFAULT_TILE_CACHE_CAPACITY)
    }

    /// Get an entry, marking it most recently used
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        let value = self.cache.lock().ok()?.get(key).cloned();
        match value {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        value
    }

    /// Insert a value, returning the shared handle that was stored
    pub fn insert(&self, key: K, value: V) -> Arc<V> {
        let value = Arc::new(value);
        self.put(key, Arc::clone(&value));
        value
    }

    /// Insert a shared value
    pub fn put(&self, key: K, value: Arc<V>) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.put(key, value);
        }
    }

    /// Returns the cached value or stores the one built by `create`
    pub fn get_or_insert_with(&self, key: K, create: impl FnOnce() -> V) -> Arc<V> {
        if let Some(existing) = self.get(&key) {
            return existing;
        }
        self.insert(key, create())
    }

    /// Check if an entry is cached without touching its recency
    pub fn contains(&self, key: &K) -> bool {
        self.cache
            .lock()
            .ok()
            .map(|cache| cache.contains(key))
            .unwrap_or(false)
    }

    /// Remove an entry from the cache
    pub fn remove(&self, key: &K) -> Option<Arc<V>> {
        self.cache.lock().ok()?.pop(key)
    }

    /// Clear all entries from the cache
    pub fn clear(&self) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.clear();
        }
    }

    /// Get the current number of cached entries
    pub fn len(&self) -> usize {
        self.cache.lock().ok().map(|cache| cache.len()).unwrap_or(0)
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get cache capacity
    pub fn capacity(&self) -> usize {
        self.cache
            .lock()
            .ok()
            .map(|cache| cache.cap().get())
            .unwrap_or(0)
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            size: self.len(),
        }
    }
}

impl<K: Hash + Eq, V> Clone for TileCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            hits: Arc::clone(&self.hits),
            misses: Arc::clone(&self.misses),
        }
    }
}

impl<K: Hash + Eq + Clone, V> Default for TileCache<K, V> {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(level: usize, row: i32, col: i32) -> TileKey {
        TileKey::new(level, row, col, "test")
    }

    #[test]
    fn test_tile_cache_basic_operations() {
        let cache: TileCache<TileKey, Vec<u8>> = TileCache::new(2);

        // Initially empty
        assert!(cache.is_empty());
        assert_eq!(cache.len(), 0);

        // Insert and retrieve
        cache.insert(key(1, 2, 3), vec![1, 2, 3]);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(&key(1, 2, 3)));
        assert_eq!(*cache.get(&key(1, 2, 3)).unwrap(), vec![1, 2, 3]);

        // Clear cache
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_tile_cache_lru_eviction() {
        let cache: TileCache<TileKey, u8> = TileCache::new(2);

        // Fill cache to capacity
        cache.insert(key(1, 1, 1), 1);
        cache.insert(key(2, 2, 2), 2);

        // Inserting a third entry evicts the least recently used
        cache.insert(key(3, 3, 3), 3);
        assert_eq!(cache.len(), 2);
        assert!(!cache.contains(&key(1, 1, 1)));
        assert!(cache.contains(&key(2, 2, 2)));
        assert!(cache.contains(&key(3, 3, 3)));
    }

    #[test]
    fn test_clones_share_storage_and_stats() {
        let cache: TileCache<TileKey, u8> = TileCache::new(4);
        let other = cache.clone();
        cache.insert(key(0, 0, 0), 9);

        assert_eq!(other.get(&key(0, 0, 0)).as_deref(), Some(&9));
        assert!(other.get(&key(0, 0, 1)).is_none());

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.size, 1);
        assert!((stats.hit_rate() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_get_or_insert_with_reuses_entry() {
        let cache: TileCache<TileKey, u8> = TileCache::new(4);
        let first = cache.get_or_insert_with(key(0, 0, 0), || 1);
        let second = cache.get_or_insert_with(key(0, 0, 0), || 2);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(*second, 1);
    }
}
