//! TTL memo cache for full prediction responses.
//!
//! Uses `DashMap` for lock-free concurrent reads. Expiry is lazy: an
//! entry past its deadline is removed on the read that observes it, and
//! is treated as absent either way.

use crate::clock::Clock;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::sync::Arc;

struct CacheEntry<T> {
    value: T,
    expires_at: DateTime<Utc>,
}

/// Concurrent key → value store where every entry carries its own
/// deadline. `set` overwrites unconditionally; there is no merge.
pub struct TtlCache<T> {
    entries: DashMap<String, CacheEntry<T>>,
    clock: Arc<dyn Clock>,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
        }
    }

    /// Look up a live entry. An expired entry reads as absent and is
    /// dropped from the map.
    pub fn get(&self, key: &str) -> Option<T> {
        let now = self.clock.now();

        let expired = match self.entries.get(key) {
            Some(entry) => {
                if entry.expires_at > now {
                    return Some(entry.value.clone());
                }
                true
            }
            None => false,
        };

        if expired {
            // Re-check under the removal lock so a concurrent fresh set
            // is not thrown away.
            self.entries.remove_if(key, |_, e| e.expires_at <= now);
        }
        None
    }

    /// Store a value with its own TTL, replacing any previous entry.
    pub fn set(&self, key: String, value: T, ttl: Duration) {
        let expires_at = self.clock.now() + ttl;
        self.entries.insert(key, CacheEntry { value, expires_at });
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::test_support::ManualClock;

    fn cache_with_clock() -> (TtlCache<String>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::at_epoch());
        (TtlCache::new(clock.clone()), clock)
    }

    #[test]
    fn test_get_within_ttl() {
        let (cache, _clock) = cache_with_clock();
        cache.set("k".into(), "v".into(), Duration::seconds(60));
        assert_eq!(cache.get("k"), Some("v".to_string()));
    }

    #[test]
    fn test_get_after_ttl_is_absent() {
        let (cache, clock) = cache_with_clock();
        cache.set("k".into(), "v".into(), Duration::seconds(60));

        clock.advance(Duration::seconds(59));
        assert!(cache.get("k").is_some());

        clock.advance(Duration::seconds(2));
        assert_eq!(cache.get("k"), None);
        // The expired entry was physically dropped.
        assert!(cache.is_empty());
    }

    #[test]
    fn test_entry_expiring_exactly_at_deadline() {
        let (cache, clock) = cache_with_clock();
        cache.set("k".into(), "v".into(), Duration::seconds(60));
        clock.advance(Duration::seconds(60));
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn test_set_overwrites() {
        let (cache, clock) = cache_with_clock();
        cache.set("k".into(), "old".into(), Duration::seconds(60));
        clock.advance(Duration::seconds(30));
        cache.set("k".into(), "new".into(), Duration::seconds(60));

        // The new deadline governs, not the original one.
        clock.advance(Duration::seconds(45));
        assert_eq!(cache.get("k"), Some("new".to_string()));
    }

    #[test]
    fn test_missing_key() {
        let (cache, _clock) = cache_with_clock();
        assert_eq!(cache.get("absent"), None);
    }
}
