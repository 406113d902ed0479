use lru::LruCache;
use std::num::NonZeroUsize;
use tokio::time::{Duration, Instant};

struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.inserted_at.elapsed() >= ttl
    }
}

/// Owned, bounded cache for link previews keyed by URL.
///
/// Entries expire `ttl` after insertion. When full, inserting evicts the least
/// recently used entry. A capacity of zero stores nothing.
pub struct PreviewCache<V> {
    ttl: Duration,
    entries: Option<LruCache<String, CacheEntry<V>>>,
}

impl<V> PreviewCache<V> {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            ttl,
            entries: NonZeroUsize::new(capacity).map(LruCache::new),
        }
    }

    /// Fresh value for `key`; marks it most recently used
    pub fn get(&mut self, key: &str) -> Option<&V> {
        let ttl = self.ttl;
        let entries = self.entries.as_mut()?;

        if entries.peek(key)?.is_expired(ttl) {
            entries.pop(key);
            return None;
        }
        entries.get(key).map(|entry| &entry.value)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: V) {
        let Some(entries) = self.entries.as_mut() else {
            return;
        };

        let key = key.into();
        let entry = CacheEntry {
            value,
            inserted_at: Instant::now(),
        };
        if let Some((evicted, _)) = entries.push(key.clone(), entry)
            && evicted != key
        {
            tracing::debug!("Evicting preview cache entry {}", evicted);
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<V> {
        self.entries
            .as_mut()?
            .pop(key)
            .map(|entry| entry.value)
    }

    /// Drop all expired entries, returning how many were removed
    pub fn purge_expired(&mut self) -> usize {
        let ttl = self.ttl;
        let Some(entries) = self.entries.as_mut() else {
            return 0;
        };

        let expired: Vec<String> = entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(ttl))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            entries.pop(key);
        }
        expired.len()
    }

    pub fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, LruCache::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        if let Some(entries) = self.entries.as_mut() {
            entries.clear();
        }
    }
}
