//! Bounded LRU cache for memoizing recent lookups
//!
//! Keys are composite string identifiers (e.g. `BTCUSDT_1h`). Recency is driven
//! by `get` and `set`; `has` never changes eviction order.

use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::time::Instant;

/// Default maximum number of entries
pub const DEFAULT_MAX_ENTRIES: usize = 200;

/// A cached value with its insertion time
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub key: String,
    pub value: V,
    pub inserted_at: Instant,
}

/// Thread-safe LRU cache bounded by entry count
///
/// Inserting past `max_entries` evicts exactly one entry, the least recently used.
pub struct BoundedCache<V> {
    entries: Mutex<LruCache<String, CacheEntry<V>>>,
    max_entries: usize,
}

impl<V: Clone> BoundedCache<V> {
    /// Creates a cache holding at most `max_entries` values (minimum 1)
    pub fn new(max_entries: usize) -> Self {
        let capacity = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            max_entries: capacity.get(),
        }
    }

    /// Returns the value for `key` and marks it most recently used
    pub fn get(&self, key: &str) -> Option<V> {
        self.entries.lock().get(key).map(|entry| entry.value.clone())
    }

    /// Returns the full entry for `key` and marks it most recently used
    pub fn get_entry(&self, key: &str) -> Option<CacheEntry<V>> {
        self.entries.lock().get(key).cloned()
    }

    /// Inserts or overwrites `key`, marking it most recently used
    ///
    /// Returns the key evicted to make room, if any.
    pub fn set(&self, key: impl Into<String>, value: V) -> Option<String> {
        let key = key.into();
        let entry = CacheEntry {
            key: key.clone(),
            value,
            inserted_at: Instant::now(),
        };

        match self.entries.lock().push(key.clone(), entry) {
            Some((evicted, _)) if evicted != key => Some(evicted),
            _ => None,
        }
    }

    /// Presence check that leaves recency untouched
    pub fn has(&self, key: &str) -> bool {
        self.entries.lock().contains(key)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl<V: Clone> Default for BoundedCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overwrite_keeps_size() {
        let cache = BoundedCache::new(2);
        cache.set("a", 1);
        assert_eq!(cache.set("a", 2), None);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("a"), Some(2));
    }

    #[test]
    fn test_set_reports_evicted_key() {
        let cache = BoundedCache::new(1);
        cache.set("a", 1);
        assert_eq!(cache.set("b", 2), Some("a".to_string()));
        assert!(!cache.has("a"));
    }

    #[test]
    fn test_has_does_not_touch_recency() {
        let cache = BoundedCache::new(2);
        cache.set("a", 1);
        cache.set("b", 2);
        assert!(cache.has("a"));

        cache.set("c", 3);
        assert!(!cache.has("a"));
        assert!(cache.has("b"));
    }

    #[test]
    fn test_zero_capacity_holds_one() {
        let cache: BoundedCache<u8> = BoundedCache::new(0);
        assert_eq!(cache.max_entries(), 1);
    }
}
