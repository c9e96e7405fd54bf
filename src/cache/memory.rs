//! In-memory LRU cache store with per-entry TTL.
//! Bounded capacity; expired entries are evicted on read.

use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;

use super::CacheStore;

const DEFAULT_CAPACITY: usize = 1024;

struct Entry {
    value: String,
    expires_at: Instant,
}

pub struct MemoryStore {
    inner: Mutex<LruCache<String, Entry>>,
}

impl MemoryStore {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity)
            .unwrap_or_else(|| NonZeroUsize::new(DEFAULT_CAPACITY).unwrap());
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl CacheStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        let mut cache = self.inner.lock();
        if let Some(entry) = cache.get(key) {
            if Instant::now() < entry.expires_at {
                return Some(entry.value.clone());
            }
            cache.pop(key);
        }
        None
    }

    fn set(&self, key: &str, value: &str, ttl: Duration) {
        self.inner.lock().put(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
    }

    fn clear_prefix(&self, prefix: &str) -> usize {
        let mut cache = self.inner.lock();
        let matching: Vec<String> = cache
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &matching {
            cache.pop(key);
        }
        matching.len()
    }
}
