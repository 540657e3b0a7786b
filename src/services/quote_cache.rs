use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

/// An immutable cached value with its fetch time. A refresh stores a new
/// entry; the timestamp of an existing entry is never rewritten, which is what
/// keeps the stale-serve path honest about data age.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub value: T,
    pub fetched_at: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.fetched_at > ttl
    }
}

/// Thread-safe TTL cache over a concurrent map. Expiry only classifies an
/// entry as stale; nothing is evicted, so once a key has been filled the
/// fallback path always has something to serve. Last write wins on races.
#[derive(Clone)]
pub struct TtlCache<T: Clone> {
    entries: Arc<DashMap<String, CacheEntry<T>>>,
    ttl: Duration,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            ttl,
        }
    }

    /// Entry of any age, or None if the key has never been filled.
    pub fn get(&self, key: &str) -> Option<CacheEntry<T>> {
        self.entries.get(key).map(|e| e.value().clone())
    }

    /// Entry only if it is still within its TTL.
    pub fn get_fresh(&self, key: &str, now: DateTime<Utc>) -> Option<CacheEntry<T>> {
        self.get(key).filter(|e| !e.is_expired(now, self.ttl))
    }

    pub fn put(&self, key: &str, value: T, now: DateTime<Utc>) {
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                fetched_at: now,
            },
        );
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn fresh_len(&self, now: DateTime<Utc>) -> usize {
        self.entries
            .iter()
            .filter(|e| !e.value().is_expired(now, self.ttl))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache() -> TtlCache<i64> {
        TtlCache::new(Duration::minutes(15))
    }

    #[test]
    fn test_get_fresh_within_ttl() {
        let c = cache();
        let now = Utc::now();
        c.put("AAPL", 175, now);

        let entry = c.get_fresh("AAPL", now + Duration::minutes(14)).unwrap();
        assert_eq!(entry.value, 175);
    }

    #[test]
    fn test_expired_entry_is_not_fresh_but_still_retrievable() {
        let c = cache();
        let now = Utc::now();
        c.put("AAPL", 175, now);

        let later = now + Duration::minutes(16);
        assert!(c.get_fresh("AAPL", later).is_none());

        // stale entry survives with its original timestamp
        let stale = c.get("AAPL").unwrap();
        assert_eq!(stale.value, 175);
        assert_eq!(stale.fetched_at, now);
    }

    #[test]
    fn test_expiry_boundary_is_exclusive() {
        let c = cache();
        let now = Utc::now();
        c.put("MSFT", 420, now);

        // exactly at the TTL the entry is still fresh
        assert!(c.get_fresh("MSFT", now + Duration::minutes(15)).is_some());
    }

    #[test]
    fn test_last_write_wins() {
        let c = cache();
        let now = Utc::now();
        c.put("TSLA", 245, now);
        c.put("TSLA", 250, now + Duration::seconds(1));

        assert_eq!(c.get("TSLA").unwrap().value, 250);
    }

    #[test]
    fn test_clear_is_idempotent() {
        let c = cache();
        c.put("AAPL", 175, Utc::now());
        c.clear();
        c.clear();
        assert_eq!(c.len(), 0);
        assert!(c.get("AAPL").is_none());
    }

    #[test]
    fn test_fresh_len_counts_only_unexpired() {
        let c = cache();
        let now = Utc::now();
        c.put("OLD", 1, now - Duration::hours(2));
        c.put("NEW", 2, now);

        assert_eq!(c.len(), 2);
        assert_eq!(c.fresh_len(now), 1);
    }
}
