//! Bounded key-value cache with least-recently-used eviction and per-entry
//! time-to-live.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

struct CacheEntry<V> {
    value: V,
    expires_at_ms: i64,
}

/// Process-local LRU cache with lazy expiry.
///
/// Recency is tracked with an explicit order list, oldest first; a read moves
/// the key to the tail, an insert re-inserts at the tail. Expired entries are
/// reclaimed only when touched or when capacity pressure evicts them - there
/// is no background sweep, so a cache full of never-re-read keys holds them
/// until the next insert or a restart.
///
/// Capacity eviction removes exactly one entry (the oldest) per insert of a
/// new key.
pub struct LruTtlCache<V> {
    inner: Mutex<Inner<V>>,
    max_size: usize,
    ttl: Duration,
}

struct Inner<V> {
    map: HashMap<String, CacheEntry<V>>,
    /// Keys in access order, oldest first. Always mirrors `map`.
    order: Vec<String>,
}

impl<V: Clone> LruTtlCache<V> {
    pub fn new(max_size: usize, ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner {
                map: HashMap::new(),
                order: Vec::new(),
            }),
            max_size,
            ttl,
        }
    }

    /// Default sizing: 1000 entries, 60 second TTL.
    pub fn with_defaults() -> Self {
        Self::new(1000, Duration::from_secs(60))
    }

    fn lock(&self) -> MutexGuard<'_, Inner<V>> {
        // Cache state stays usable after a panic in a holder.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Look up a live entry, refreshing its recency.
    ///
    /// An expired entry is removed as a side effect and reported as a miss.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut inner = self.lock();

        let expired = match inner.map.get(key) {
            Some(entry) => now_ms() > entry.expires_at_ms,
            None => return None,
        };

        if expired {
            inner.map.remove(key);
            remove_from_order(&mut inner.order, key);
            return None;
        }

        move_to_tail(&mut inner.order, key);
        inner.map.get(key).map(|entry| entry.value.clone())
    }

    /// Insert or overwrite with a fresh expiry.
    ///
    /// When inserting a new key pushes the cache above capacity, the single
    /// oldest entry is evicted first.
    pub fn set(&self, key: &str, value: V) {
        let mut inner = self.lock();

        let entry = CacheEntry {
            value,
            expires_at_ms: now_ms() + self.ttl.as_millis() as i64,
        };

        if inner.map.insert(key.to_string(), entry).is_some() {
            remove_from_order(&mut inner.order, key);
        }
        inner.order.push(key.to_string());

        if inner.map.len() > self.max_size && !inner.order.is_empty() {
            let oldest = inner.order.remove(0);
            inner.map.remove(&oldest);
        }
    }

    /// Remove a key. Returns whether it existed.
    pub fn delete(&self, key: &str) -> bool {
        let mut inner = self.lock();
        let existed = inner.map.remove(key).is_some();
        if existed {
            remove_from_order(&mut inner.order, key);
        }
        existed
    }

    /// Remove every entry whose key starts with `prefix`.
    pub fn invalidate_prefix(&self, prefix: &str) {
        let mut inner = self.lock();
        inner.map.retain(|key, _| !key.starts_with(prefix));
        inner.order.retain(|key| !key.starts_with(prefix));
    }

    /// Remove all entries.
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.map.clear();
        inner.order.clear();
    }

    /// Current entry count, including not-yet-reclaimed expired entries.
    pub fn len(&self) -> usize {
        self.lock().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn remove_from_order(order: &mut Vec<String>, key: &str) {
    if let Some(pos) = order.iter().position(|k| k == key) {
        order.remove(pos);
    }
}

fn move_to_tail(order: &mut Vec<String>, key: &str) {
    if let Some(pos) = order.iter().position(|k| k == key) {
        let k = order.remove(pos);
        order.push(k);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(max_size: usize) -> LruTtlCache<String> {
        LruTtlCache::new(max_size, Duration::from_secs(60))
    }

    fn fill(c: &LruTtlCache<String>, keys: &[&str]) {
        for key in keys {
            c.set(key, format!("value-{}", key));
        }
    }

    #[test]
    fn test_set_and_get() {
        let c = cache(10);
        c.set("k1", "v1".to_string());
        assert_eq!(c.get("k1"), Some("v1".to_string()));
        assert_eq!(c.get("missing"), None);
    }

    #[test]
    fn test_default_sizing_starts_empty() {
        let c: LruTtlCache<String> = LruTtlCache::with_defaults();
        assert!(c.is_empty());
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let c = cache(3);
        fill(&c, &["a", "b", "c", "d"]);

        assert_eq!(c.len(), 3);
        assert_eq!(c.get("a"), None);
        assert!(c.get("b").is_some());
        assert!(c.get("d").is_some());
    }

    #[test]
    fn test_read_refreshes_recency() {
        let c = cache(3);
        fill(&c, &["a", "b", "c", "d"]); // evicts a

        // Touching b makes c the least recently used entry.
        assert!(c.get("b").is_some());
        c.set("e", "value-e".to_string());

        assert_eq!(c.get("c"), None);
        assert!(c.get("b").is_some());
        assert!(c.get("d").is_some());
        assert!(c.get("e").is_some());
    }

    #[test]
    fn test_overwrite_refreshes_recency_without_eviction() {
        let c = cache(3);
        fill(&c, &["a", "b", "c"]);

        // Overwriting a keeps the cache at capacity and makes b the oldest.
        c.set("a", "value-a2".to_string());
        assert_eq!(c.len(), 3);

        c.set("d", "value-d".to_string());
        assert_eq!(c.get("b"), None);
        assert_eq!(c.get("a"), Some("value-a2".to_string()));
    }

    #[test]
    fn test_expired_entry_is_evicted_on_read() {
        let c = LruTtlCache::new(10, Duration::from_millis(40));
        c.set("k", "v".to_string());
        assert_eq!(c.len(), 1);

        std::thread::sleep(Duration::from_millis(60));

        assert_eq!(c.get("k"), None);
        assert_eq!(c.len(), 0);
    }

    #[test]
    fn test_delete_reports_existence() {
        let c = cache(10);
        c.set("k", "v".to_string());

        assert!(c.delete("k"));
        assert!(!c.delete("k"));
        assert_eq!(c.get("k"), None);
    }

    #[test]
    fn test_invalidate_prefix_removes_exactly_matching_keys() {
        let c = cache(10);
        fill(&c, &["role:0xabc", "role:0xdef", "perms:0xabc"]);

        c.invalidate_prefix("role:");

        assert_eq!(c.get("role:0xabc"), None);
        assert_eq!(c.get("role:0xdef"), None);
        assert!(c.get("perms:0xabc").is_some());
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn test_clear() {
        let c = cache(10);
        fill(&c, &["a", "b"]);

        c.clear();

        assert!(c.is_empty());
        assert_eq!(c.get("a"), None);
    }
}
