//! In-process TTL cache backed by DashMap for lock-free concurrent access.
//! Holds short-lived session values such as gateway access tokens; an
//! instance is shared by `Arc` with whatever needs it.

use dashmap::DashMap;
use std::time::{Duration, Instant};
use tracing::debug;

struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

pub struct SessionCache<V> {
    name: &'static str,
    store: DashMap<String, CacheEntry<V>>,
    ttl: Duration,
}

impl<V: Clone> SessionCache<V> {
    pub fn new(name: &'static str, ttl: Duration) -> Self {
        Self {
            name,
            store: DashMap::new(),
            ttl,
        }
    }

    /// Value for `key`, or None if missing or expired. Expired entries are
    /// dropped on access.
    pub fn get(&self, key: &str) -> Option<V> {
        let entry = match self.store.get(key) {
            Some(entry) => entry,
            None => {
                metrics::counter!("cache.misses", "cache" => self.name).increment(1);
                return None;
            }
        };
        if Instant::now() >= entry.expires_at {
            drop(entry);
            self.store.remove(key);
            metrics::counter!("cache.expired", "cache" => self.name).increment(1);
            debug!(cache = self.name, key = key, "Session entry expired");
            return None;
        }
        metrics::counter!("cache.hits", "cache" => self.name).increment(1);
        Some(entry.value.clone())
    }

    /// Insert or replace with the cache's default TTL.
    pub fn put(&self, key: impl Into<String>, value: V) {
        self.put_with_ttl(key, value, self.ttl);
    }

    pub fn put_with_ttl(&self, key: impl Into<String>, value: V, ttl: Duration) {
        self.store.insert(
            key.into(),
            CacheEntry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    pub fn remove(&self, key: &str) -> Option<V> {
        self.store.remove(key).map(|(_, entry)| entry.value)
    }

    /// Remove expired entries. Call this periodically from a background task.
    pub fn evict_expired(&self) -> usize {
        let before = self.store.len();
        let now = Instant::now();
        self.store.retain(|_, entry| entry.expires_at > now);
        before - self.store.len()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_and_get() {
        let cache = SessionCache::new("test", Duration::from_secs(60));
        cache.put("access_token", "abc".to_string());
        assert_eq!(cache.get("access_token").as_deref(), Some("abc"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_missing_key() {
        let cache: SessionCache<String> = SessionCache::new("test", Duration::from_secs(60));
        assert!(cache.get("nope").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_expired_entry_dropped_on_get() {
        let cache = SessionCache::new("test", Duration::from_secs(60));
        cache.put_with_ttl("short", 1u32, Duration::ZERO);
        assert!(cache.get("short").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_evict_expired() {
        let cache = SessionCache::new("test", Duration::from_secs(60));
        cache.put_with_ttl("a", 1u32, Duration::ZERO);
        cache.put_with_ttl("b", 2u32, Duration::ZERO);
        cache.put("c", 3u32);
        assert_eq!(cache.evict_expired(), 2);
        assert_eq!(cache.get("c"), Some(3));
    }

    #[test]
    fn test_remove_and_replace() {
        let cache = SessionCache::new("test", Duration::from_secs(60));
        cache.put("token", 1u32);
        cache.put("token", 2u32);
        assert_eq!(cache.remove("token"), Some(2));
        assert!(cache.get("token").is_none());
    }
}
